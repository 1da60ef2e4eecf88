//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// How annual operating expense is derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalculationOption {
    /// Percentage of revenue.
    Direct,
    /// Masked variable costs x quantities plus masked fixed costs.
    Indirect,
}

/// Sensitivity variation style.
///
/// `Symmetric` and `Multipoint` are percentage modes
/// (`new = old * (1 + v/100)`); `Offset` is the additive mode
/// (`new = old + v`). The modes never alias each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariationMode {
    Symmetric,
    Multipoint,
    Offset,
}

impl std::fmt::Display for VariationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symmetric => write!(f, "symmetric"),
            Self::Multipoint => write!(f, "multipoint"),
            Self::Offset => write!(f, "offset"),
        }
    }
}

/// One flat per-interval configuration record.
///
/// Immutable once loaded; sensitivity variations always operate on a clone.
/// Rates and contingency percentages are fractions (0.10 = 10%).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSnapshot {
    pub plant_lifetime: u32,
    pub construction_years: u32,
    pub bare_erected_cost: f64,
    pub epc_contingency: f64,
    pub process_contingency: f64,
    pub project_contingency: f64,
    pub number_of_units: f64,
    pub initial_selling_price: f64,
    pub operating_cost_pct: f64,
    pub general_inflation_rate: f64,
    pub internal_rate_of_return: f64,
    pub state_tax_rate: f64,
    pub federal_tax_rate: f64,
    pub calculation_option: CalculationOption,
    #[serde(default)]
    pub variable_costs: Vec<f64>,
    #[serde(default)]
    pub variable_quantities: Vec<f64>,
    #[serde(default)]
    pub fixed_costs: Vec<f64>,
    /// Per-category on/off mask for variable costs.
    #[serde(default)]
    pub selected_v: Vec<bool>,
    /// Per-category on/off mask for fixed costs.
    #[serde(default)]
    pub selected_f: Vec<bool>,
}

/// One override applied to the base snapshot for a year interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldOverride {
    pub field: crate::fields::FieldId,
    pub value: crate::fields::FieldValue,
}

/// One contiguous year interval of the configuration matrix.
///
/// Intervals partition `1..=plant_lifetime` with no gaps or overlaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigMatrixRow {
    pub start_year: u32,
    pub end_year: u32,
    pub length: u32,
    #[serde(default)]
    pub overrides: Vec<FieldOverride>,
}

impl ConfigMatrixRow {
    pub fn span(start_year: u32, end_year: u32) -> Self {
        Self {
            start_year,
            end_year,
            length: end_year - start_year + 1,
            overrides: Vec::new(),
        }
    }

    pub fn contains(&self, year: u32) -> bool {
        self.start_year <= year && year <= self.end_year
    }

    /// Base snapshot with this interval's overrides merged in.
    pub fn merged(&self, base: &ConfigSnapshot) -> Result<ConfigSnapshot, crate::ProjectError> {
        let mut merged = base.clone();
        for ov in &self.overrides {
            merged.set_value(ov.field, &ov.value)?;
        }
        Ok(merged)
    }
}

/// One swept parameter of a sensitivity study.
///
/// `values` holds a single magnitude for symmetric mode (expanded to a
/// +/- pair) or the explicit list for multipoint/offset modes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensitivityParameter {
    pub param_id: String,
    pub mode: VariationMode,
    pub values: Vec<f64>,
    pub compare_to_key: String,
    pub enabled: bool,
    #[serde(default)]
    pub plot_bar: bool,
    #[serde(default)]
    pub plot_point: bool,
    #[serde(default)]
    pub plot_waterfall: bool,
}
