//! Deterministic artifact layout.
//!
//! Naming is bit-exact for compatibility with downstream consumers:
//!
//! `Batch(<v>)/Results(<v>)/Sensitivity/<param>/<mode>/<signed>/<v>_config_module_<start>.json`
//!
//! Every path is re-creatable from `(version, param_id, mode, value,
//! interval_start)` alone; the rest of the pipeline relies on this
//! addressing scheme.

use ef_project::VariationMode;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn batch_dir(&self, version: &str) -> PathBuf {
        self.root.join(format!("Batch({version})"))
    }

    pub fn results_dir(&self, version: &str) -> PathBuf {
        self.batch_dir(version).join(format!("Results({version})"))
    }

    pub fn sensitivity_dir(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
    ) -> PathBuf {
        self.results_dir(version)
            .join("Sensitivity")
            .join(param_id)
            .join(mode.to_string())
            .join(signed_label)
    }

    /// Per-interval configuration module for one variation.
    pub fn variation_config_module(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
        start_year: u32,
    ) -> PathBuf {
        self.sensitivity_dir(version, param_id, mode, signed_label)
            .join(format!("{version}_config_module_{start_year}.json"))
    }

    /// Per-interval baseline configuration module.
    pub fn baseline_config_module(&self, version: &str, start_year: u32) -> PathBuf {
        self.results_dir(version)
            .join(format!("{version}_config_module_{start_year}.json"))
    }

    pub fn matrix_file(&self, version: &str) -> PathBuf {
        self.batch_dir(version)
            .join(format!("{version}_config_matrix.json"))
    }

    pub fn status_file(&self, version: &str) -> PathBuf {
        self.batch_dir(version)
            .join(format!("{version}_status.json"))
    }

    pub fn config_data_file(&self, version: &str) -> PathBuf {
        self.batch_dir(version)
            .join(format!("{version}_config_data.bin"))
    }

    /// Cash-flow table for one variation, overwritten on every price-search
    /// iteration.
    pub fn variation_cash_flow(
        &self,
        version: &str,
        param_id: &str,
        mode: VariationMode,
        signed_label: &str,
    ) -> PathBuf {
        self.sensitivity_dir(version, param_id, mode, signed_label)
            .join(format!("{version}_cash_flow.json"))
    }

    pub fn baseline_cash_flow(&self, version: &str) -> PathBuf {
        self.results_dir(version)
            .join(format!("{version}_cash_flow.json"))
    }

    /// Result record, one per `(param_id, compare_to_key, mode)`.
    pub fn result_file(
        &self,
        version: &str,
        param_id: &str,
        compare_to_key: &str,
        mode: VariationMode,
    ) -> PathBuf {
        self.results_dir(version)
            .join("Sensitivity")
            .join(param_id)
            .join(format!(
                "{version}_results_{param_id}_{compare_to_key}_{mode}.json"
            ))
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(".locks")
    }

    pub fn lock_file(&self, resource: &str) -> PathBuf {
        self.locks_dir().join(format!("{resource}.lock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_module_path_is_bit_exact() {
        let layout = Layout::new("/data");
        let path = layout.variation_config_module("1", "S13", VariationMode::Symmetric, "+10.00", 1);
        assert_eq!(
            path,
            PathBuf::from(
                "/data/Batch(1)/Results(1)/Sensitivity/S13/symmetric/+10.00/1_config_module_1.json"
            )
        );
    }

    #[test]
    fn paths_are_recreatable_from_coordinates() {
        let layout = Layout::new("/data");
        let a = layout.variation_config_module("7", "S11", VariationMode::Multipoint, "-20.00", 6);
        let b = layout.variation_config_module("7", "S11", VariationMode::Multipoint, "-20.00", 6);
        assert_eq!(a, b);
    }

    #[test]
    fn result_file_keyed_by_param_compare_mode() {
        let layout = Layout::new("/data");
        let path = layout.result_file("1", "S13", "S80", VariationMode::Symmetric);
        assert!(path
            .to_string_lossy()
            .ends_with("Sensitivity/S13/1_results_S13_S80_symmetric.json"));
    }
}
