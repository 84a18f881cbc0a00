//! Network interception: spec documents the page fetched while loading.

use super::{ExtractionLayer, LayerContext, LayerOutput};
use crate::spec::{ParseMode, is_spec_reference, load_document};
use specscout_core::Error;

pub struct NetworkLayer;

#[async_trait::async_trait]
impl ExtractionLayer for NetworkLayer {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error> {
        for response in cx.page.captured_responses().await {
            if !(200..300).contains(&response.status) || !is_spec_reference(&response.url) {
                continue;
            }
            match load_document(&response.body, Some(&response.url), ParseMode::Auto) {
                Ok(doc) => {
                    let output = LayerOutput::from_document(&doc, Some(response.url.clone()));
                    if !output.is_empty() {
                        return Ok(output);
                    }
                }
                Err(e) => tracing::debug!("captured response {} is not a spec: {}", response.url, e),
            }
        }
        Ok(LayerOutput::default())
    }
}
