//! Client code for specscout.
//!
//! This crate turns a URL or provider name into normalized API endpoints:
//! provider discovery, the acquisition pipeline, page rendering, framework
//! detection, and layered extraction. The server wraps [`SpecService`].

pub mod detect;
pub mod discovery;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod render;
pub mod service;
pub mod spec;

pub use detect::detect;
pub use discovery::{Discovery, DiscoveryResolver, SearchClient};
pub use extract::{ExtractionLayer, FrameworkExtractor, LayerContext, LayerOutput};
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use pipeline::{Attempt, Pipeline, Strategy, StrategyContext};
pub use render::{RenderError, RenderOptions, RenderedPage, Renderer};
pub use service::{Lookup, SpecService};
