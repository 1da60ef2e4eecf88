//! Shared application service layer for econoflow.
//!
//! Centralizes the pipeline state machine, the sensitivity analysis
//! orchestration, and a unified error surface for frontends.

pub mod analysis_service;
pub mod error;
pub mod pipeline;
pub mod price_cache;
pub mod progress;

pub use analysis_service::{
    AnalysisPayload, AnalysisReport, AnalysisService, BaselineOutcome, ParamResult,
    VariationFailure,
};
pub use error::{AppError, AppResult};
pub use pipeline::{PipelineCoordinator, PipelineStateView, Stage};
pub use price_cache::PriceCache;
pub use progress::{AnalysisProgressEvent, AnalysisStage};
