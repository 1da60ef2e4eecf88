//! Artifact store API.

use crate::atomic;
use crate::paths::Layout;
use crate::records::{ConfigData, ResultRecord, StatusRecord};
use crate::StoreResult;
use ef_engine::CashFlowOutcome;
use ef_project::{ConfigMatrixRow, ConfigSnapshot, VariationMode};
use std::path::PathBuf;

#[derive(Clone)]
pub struct ArtifactStore {
    layout: Layout,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let layout = Layout::new(root.into());
        if !layout.root().exists() {
            std::fs::create_dir_all(layout.root())?;
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // Status

    pub fn save_status(&self, version: &str, status: &StatusRecord) -> StoreResult<()> {
        atomic::write_json_atomic(&self.layout.status_file(version), status)
    }

    pub fn load_status(&self, version: &str) -> StoreResult<StatusRecord> {
        atomic::read_json(&self.layout.status_file(version))
    }

    // Configuration data (binary)

    pub fn save_config_data(&self, version: &str, data: &ConfigData) -> StoreResult<()> {
        atomic::write_bincode_atomic(&self.layout.config_data_file(version), data)
    }

    pub fn load_config_data(&self, version: &str) -> StoreResult<ConfigData> {
        atomic::read_bincode(&self.layout.config_data_file(version))
    }

    // Configuration matrix

    pub fn save_matrix(&self, version: &str, rows: &[ConfigMatrixRow]) -> StoreResult<()> {
        atomic::write_json_atomic(&self.layout.matrix_file(version), &rows.to_vec())
    }

    pub fn load_matrix(&self, version: &str) -> StoreResult<Vec<ConfigMatrixRow>> {
        atomic::read_json(&self.layout.matrix_file(version))
    }

    // Configuration modules

    pub fn save_baseline_module(
        &self,
        version: &str,
        start_year: u32,
        snapshot: &ConfigSnapshot,
    ) -> StoreResult<()> {
        atomic::write_json_atomic(
            &self.layout.baseline_config_module(version, start_year),
            snapshot,
        )
    }

    pub fn load_baseline_module(
        &self,
        version: &str,
        start_year: u32,
    ) -> StoreResult<ConfigSnapshot> {
        atomic::read_json(&self.layout.baseline_config_module(version, start_year))
    }

    pub fn save_variation_module(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
        start_year: u32,
        snapshot: &ConfigSnapshot,
    ) -> StoreResult<()> {
        atomic::write_json_atomic(
            &self
                .layout
                .variation_config_module(version, param_id, mode, signed_label, start_year),
            snapshot,
        )
    }

    pub fn load_variation_module(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
        start_year: u32,
    ) -> StoreResult<ConfigSnapshot> {
        atomic::read_json(
            &self
                .layout
                .variation_config_module(version, param_id, mode, signed_label, start_year),
        )
    }

    // Cash-flow tables

    pub fn save_baseline_cash_flow(
        &self,
        version: &str,
        outcome: &CashFlowOutcome,
    ) -> StoreResult<()> {
        atomic::write_json_atomic(&self.layout.baseline_cash_flow(version), outcome)
    }

    pub fn save_variation_cash_flow(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
        outcome: &CashFlowOutcome,
    ) -> StoreResult<()> {
        atomic::write_json_atomic(
            &self
                .layout
                .variation_cash_flow(version, param_id, mode, signed_label),
            outcome,
        )
    }

    pub fn load_variation_cash_flow(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
    ) -> StoreResult<CashFlowOutcome> {
        atomic::read_json(
            &self
                .layout
                .variation_cash_flow(version, param_id, mode, signed_label),
        )
    }

    // Results

    pub fn save_result(&self, record: &ResultRecord) -> StoreResult<()> {
        let m = &record.metadata;
        atomic::write_json_atomic(
            &self
                .layout
                .result_file(&m.version, &m.param_id, &m.compare_to_key, m.mode),
            record,
        )
    }

    pub fn load_result(
        &self,
        version: &str,
        param_id: &str,
        compare_to_key: &str,
        mode: VariationMode,
    ) -> StoreResult<ResultRecord> {
        atomic::read_json(
            &self
                .layout
                .result_file(version, param_id, compare_to_key, mode),
        )
    }

    /// Enumerate result files under a version's sensitivity tree.
    pub fn list_results(&self, version: &str) -> StoreResult<Vec<PathBuf>> {
        let sensitivity_root = self.layout.results_dir(version).join("Sensitivity");
        let mut found = Vec::new();
        if !sensitivity_root.exists() {
            return Ok(found);
        }
        for entry in std::fs::read_dir(&sensitivity_root)? {
            let param_dir = entry?.path();
            if !param_dir.is_dir() {
                continue;
            }
            for file in std::fs::read_dir(&param_dir)? {
                let path = file?.path();
                if path.is_file()
                    && path
                        .file_name()
                        .map(|n| n.to_string_lossy().contains("_results_"))
                        .unwrap_or(false)
                {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
