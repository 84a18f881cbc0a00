//! Live application state: ask the running documentation app for the spec
//! it loaded.

use super::{ExtractionLayer, LayerContext, LayerOutput};
use crate::spec::{ParseMode, into_document, parse_spec_body};
use serde_json::Value;
use specscout_core::{Error, Framework};

const SWAGGER_UI_STATE: &str = "(() => { try { const s = window.ui && window.ui.specSelectors && window.ui.specSelectors.specJson(); return s && s.toJS ? s.toJS() : (s || null); } catch (e) { return null; } })()";

const REDOC_STATE: &str = "(() => { try { const st = window.__redoc_state; return st && st.spec ? st.spec.data : null; } catch (e) { return null; } })()";

const STOPLIGHT_STATE: &str = "(() => { try { const el = document.querySelector('elements-api'); const doc = el && el.apiDescriptionDocument; return doc || null; } catch (e) { return null; } })()";

/// Expression returning the spec a framework holds in memory.
pub fn state_expression(framework: Framework) -> Option<&'static str> {
    match framework {
        Framework::SwaggerUi => Some(SWAGGER_UI_STATE),
        Framework::Redoc => Some(REDOC_STATE),
        Framework::Stoplight => Some(STOPLIGHT_STATE),
        _ => None,
    }
}

pub struct StateLayer;

#[async_trait::async_trait]
impl ExtractionLayer for StateLayer {
    fn name(&self) -> &'static str {
        "state"
    }

    async fn extract(&self, cx: &LayerContext<'_>) -> Result<LayerOutput, Error> {
        let Some(expression) = state_expression(cx.framework) else {
            return Ok(LayerOutput::default());
        };
        if !cx.page.supports_scripts() {
            return Ok(LayerOutput::default());
        }

        let raw = match cx.page.evaluate(expression).await? {
            None => return Ok(LayerOutput::default()),
            // Stoplight keeps the description as the original text.
            Some(Value::String(text)) => parse_spec_body(&text, None, ParseMode::Auto)?,
            Some(value) => value,
        };

        let doc = into_document(raw)?;
        Ok(LayerOutput::from_document(&doc, None))
    }
}
