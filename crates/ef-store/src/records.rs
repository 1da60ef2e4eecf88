//! On-disk record schemas.

use ef_project::{CalculationOption, SensitivityParameter, VariationMode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stage status file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRecord {
    pub configured: bool,
    pub timestamp: String,
    pub run_id: String,
    pub version: String,
    /// SHA-256 of the registered payload, for provenance.
    pub payload_digest: String,
}

impl StatusRecord {
    pub fn new(configured: bool, run_id: &str, version: &str, payload_digest: &str) -> Self {
        Self {
            configured,
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_id: run_id.to_string(),
            version: version.to_string(),
            payload_digest: payload_digest.to_string(),
        }
    }
}

/// Binary configuration-data snapshot (bincode). Holds the structured
/// parameter objects the JSON artifacts cannot carry compactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigData {
    pub versions: Vec<String>,
    pub selected_v: Vec<bool>,
    pub selected_f: Vec<bool>,
    pub calculation_option: CalculationOption,
    pub target_row: u32,
    pub sen_parameters: Vec<SensitivityParameter>,
}

/// Metadata block of a result record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultMetadata {
    pub version: String,
    pub param_id: String,
    pub compare_to_key: String,
    pub mode: VariationMode,
    pub timestamp: String,
}

/// Converged outcome of one variation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariationOutcome {
    pub signed_label: String,
    pub magnitude: f64,
    pub price: f64,
    pub npv: f64,
    pub iterations: usize,
}

/// Result file (JSON), one per `(param_id, compare_to_key, mode)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub metadata: ResultMetadata,
    pub results: Vec<VariationOutcome>,
}

impl ResultRecord {
    /// Monetary fields are rounded to cents before the record is written.
    pub fn new(
        version: &str,
        param_id: &str,
        compare_to_key: &str,
        mode: VariationMode,
        results: Vec<VariationOutcome>,
    ) -> Self {
        Self {
            metadata: ResultMetadata {
                version: version.to_string(),
                param_id: param_id.to_string(),
                compare_to_key: compare_to_key.to_string(),
                mode,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            results: results
                .into_iter()
                .map(|mut outcome| {
                    outcome.price = ef_core::round_currency(outcome.price);
                    outcome.npv = ef_core::round_currency(outcome.npv);
                    outcome
                })
                .collect(),
        }
    }
}

/// Content digest of a registered payload.
pub fn payload_digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}
