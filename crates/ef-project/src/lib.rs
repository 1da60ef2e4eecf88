//! ef-project: canonical configuration schema and validation.

pub mod fields;
pub mod schema;
pub mod validate;

pub use fields::{FieldId, FieldValue, PROPERTY_TABLE};
pub use schema::*;
pub use validate::{validate_matrix, ValidationError};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Field kind mismatch for {field}: expected {expected}")]
    FieldKind {
        field: &'static str,
        expected: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_snapshot(path: &std::path::Path) -> ProjectResult<ConfigSnapshot> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: ConfigSnapshot = serde_json::from_str(&content)?;
    Ok(snapshot)
}

pub fn save_snapshot(path: &std::path::Path, snapshot: &ConfigSnapshot) -> ProjectResult<()> {
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, content)?;
    Ok(())
}
