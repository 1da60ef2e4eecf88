//! Variation generation and application.

use crate::mapper::{resolve, ResolvedParameter};
use crate::{SensitivityError, SensitivityResult};
use ef_project::{ConfigSnapshot, FieldValue, SensitivityParameter, VariationMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One concrete variation of one parameter.
///
/// Maps to exactly one configuration snapshot copy and one result artifact;
/// `signed_label` is used verbatim in directory names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    pub param_id: String,
    pub mode: VariationMode,
    pub magnitude: f64,
    pub signed_label: String,
}

/// Magnitude formatted with explicit sign and two decimals (`+10.00`).
pub fn signed_label(magnitude: f64) -> String {
    format!("{magnitude:+.2}")
}

/// Expand a parameter into its variations.
///
/// Symmetric mode expands the first value `v` to the pair `+v, -v`;
/// multipoint and offset modes produce one variation per value.
pub fn generate(
    param_id: &str,
    mode: VariationMode,
    values: &[f64],
) -> SensitivityResult<Vec<Variation>> {
    // Fail early on unresolvable or metric-addressed parameters.
    match resolve(param_id)? {
        ResolvedParameter::Field(_) => {}
        ResolvedParameter::Metric(_) => {
            return Err(SensitivityError::MetricNotVariable {
                param_id: param_id.to_string(),
            })
        }
    }

    let magnitudes: Vec<f64> = match mode {
        VariationMode::Symmetric => {
            let v = *values
                .first()
                .ok_or_else(|| SensitivityError::EmptyValues {
                    param_id: param_id.to_string(),
                })?;
            vec![v, -v]
        }
        VariationMode::Multipoint | VariationMode::Offset => {
            if values.is_empty() {
                return Err(SensitivityError::EmptyValues {
                    param_id: param_id.to_string(),
                });
            }
            values.to_vec()
        }
    };

    let variations = magnitudes
        .into_iter()
        .map(|magnitude| Variation {
            param_id: param_id.to_string(),
            mode,
            magnitude,
            signed_label: signed_label(magnitude),
        })
        .collect();
    Ok(variations)
}

/// Expand a declared sensitivity parameter. Disabled parameters produce
/// nothing.
pub fn variations_for(param: &SensitivityParameter) -> SensitivityResult<Vec<Variation>> {
    if !param.enabled {
        return Ok(Vec::new());
    }
    generate(&param.param_id, param.mode, &param.values)
}

fn vary_scalar(old: f64, mode: VariationMode, magnitude: f64) -> f64 {
    match mode {
        // Percentage modes.
        VariationMode::Symmetric | VariationMode::Multipoint => old * (1.0 + magnitude / 100.0),
        // Additive mode.
        VariationMode::Offset => old + magnitude,
    }
}

/// Apply a variation to a clone of the base snapshot.
///
/// Vector fields are varied element-wise.
pub fn apply_variation(
    base: &ConfigSnapshot,
    variation: &Variation,
) -> SensitivityResult<ConfigSnapshot> {
    let field = match resolve(&variation.param_id)? {
        ResolvedParameter::Field(field) => field,
        ResolvedParameter::Metric(_) => {
            return Err(SensitivityError::MetricNotVariable {
                param_id: variation.param_id.clone(),
            })
        }
    };

    let new_value = match base.value(field) {
        FieldValue::Scalar(old) => {
            FieldValue::Scalar(vary_scalar(old, variation.mode, variation.magnitude))
        }
        FieldValue::Vector(old) => FieldValue::Vector(
            old.iter()
                .map(|v| vary_scalar(*v, variation.mode, variation.magnitude))
                .collect(),
        ),
    };

    let mut varied = base.clone();
    varied.set_value(field, &new_value)?;
    debug!(
        param = variation.param_id,
        label = variation.signed_label,
        field = field.name(),
        "variation applied"
    );
    Ok(varied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_project::CalculationOption;

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            plant_lifetime: 20,
            construction_years: 2,
            bare_erected_cost: 1_000_000.0,
            epc_contingency: 0.1,
            process_contingency: 0.05,
            project_contingency: 0.15,
            number_of_units: 10_000.0,
            initial_selling_price: 50.0,
            operating_cost_pct: 0.3,
            general_inflation_rate: 0.02,
            internal_rate_of_return: 0.08,
            state_tax_rate: 0.06,
            federal_tax_rate: 0.21,
            calculation_option: CalculationOption::Direct,
            variable_costs: vec![2.0, 4.0],
            variable_quantities: vec![100.0, 50.0],
            fixed_costs: vec![1_000.0],
            selected_v: vec![true, true],
            selected_f: vec![true],
        }
    }

    #[test]
    fn symmetric_expands_to_signed_pair() {
        let variations = generate("S13", VariationMode::Symmetric, &[10.0]).unwrap();
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].signed_label, "+10.00");
        assert_eq!(variations[1].signed_label, "-10.00");
    }

    #[test]
    fn symmetric_pair_scales_field_both_ways() {
        let base = snapshot();
        let variations = generate("S13", VariationMode::Symmetric, &[10.0]).unwrap();
        let up = apply_variation(&base, &variations[0]).unwrap();
        let down = apply_variation(&base, &variations[1]).unwrap();
        assert!((up.initial_selling_price - 55.0).abs() < 1e-12);
        assert!((down.initial_selling_price - 45.0).abs() < 1e-12);
    }

    #[test]
    fn multipoint_produces_one_per_value() {
        let variations = generate("S11", VariationMode::Multipoint, &[-20.0, -10.0, 5.0]).unwrap();
        assert_eq!(variations.len(), 3);
        assert_eq!(variations[2].signed_label, "+5.00");
    }

    #[test]
    fn offset_adds_instead_of_scaling() {
        let base = snapshot();
        let variations = generate("S13", VariationMode::Offset, &[2.5]).unwrap();
        let varied = apply_variation(&base, &variations[0]).unwrap();
        assert!((varied.initial_selling_price - 52.5).abs() < 1e-12);
    }

    #[test]
    fn vector_field_varies_element_wise() {
        let base = snapshot();
        let variations = generate("S40", VariationMode::Symmetric, &[50.0]).unwrap();
        let up = apply_variation(&base, &variations[0]).unwrap();
        assert_eq!(up.variable_costs, vec![3.0, 6.0]);
        // Untouched fields stay put.
        assert_eq!(up.variable_quantities, base.variable_quantities);
    }

    #[test]
    fn base_snapshot_is_never_mutated() {
        let base = snapshot();
        let variations = generate("S13", VariationMode::Symmetric, &[10.0]).unwrap();
        let _ = apply_variation(&base, &variations[0]).unwrap();
        assert_eq!(base.initial_selling_price, 50.0);
    }

    #[test]
    fn metric_parameters_cannot_be_varied() {
        let err = generate("S82", VariationMode::Symmetric, &[10.0]).unwrap_err();
        assert!(matches!(err, SensitivityError::MetricNotVariable { .. }));
    }

    #[test]
    fn empty_values_rejected() {
        let err = generate("S13", VariationMode::Multipoint, &[]).unwrap_err();
        assert!(matches!(err, SensitivityError::EmptyValues { .. }));
    }

    #[test]
    fn disabled_parameter_expands_to_nothing() {
        let param = SensitivityParameter {
            param_id: "S13".to_string(),
            mode: VariationMode::Symmetric,
            values: vec![10.0],
            compare_to_key: "S80".to_string(),
            enabled: false,
            plot_bar: false,
            plot_point: false,
            plot_waterfall: false,
        };
        assert!(variations_for(&param).unwrap().is_empty());
    }
}
