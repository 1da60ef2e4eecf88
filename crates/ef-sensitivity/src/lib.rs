//! ef-sensitivity: parameter resolution and variation generation for
//! sensitivity studies.

pub mod mapper;
pub mod variation;

pub use mapper::{resolve, ResolvedParameter, METRIC_RANGE};
pub use variation::{apply_variation, generate, variations_for, Variation};

pub type SensitivityResult<T> = Result<T, SensitivityError>;

#[derive(thiserror::Error, Debug)]
pub enum SensitivityError {
    #[error("Unknown parameter: {param_id}")]
    UnknownParameter { param_id: String },

    #[error("Parameter {param_id} addresses a summary metric and cannot be varied")]
    MetricNotVariable { param_id: String },

    #[error("Parameter {param_id} has no variation values")]
    EmptyValues { param_id: String },

    #[error("Field error: {0}")]
    Field(#[from] ef_project::ProjectError),
}
