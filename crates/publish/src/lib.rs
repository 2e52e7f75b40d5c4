pub mod build_log;
pub mod client;
pub mod generator;
pub mod line_protocol;
pub mod orchestrator;
pub mod renderer;
pub mod service;

pub use build_log::BuildLog;
pub use renderer::MeasurementRenderer;
pub use service::{PublicationService, PublishSummary};
