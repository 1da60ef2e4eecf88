//! Parameter identifier resolution.
//!
//! An opaque identifier like `S13` resolves by numeric suffix against the
//! static property table: first an exact `Amount<digits>` suffix match,
//! then a digits-anywhere fallback. The sub-range 80..=90 addresses the
//! economic summary metric table instead of a configuration field.

use crate::{SensitivityError, SensitivityResult};
use ef_project::{FieldId, PROPERTY_TABLE};
use std::ops::RangeInclusive;

/// Parameter numbers reserved for computed summary metrics.
pub const METRIC_RANGE: RangeInclusive<u32> = 80..=90;

/// What a parameter identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedParameter {
    /// A configuration field.
    Field(FieldId),
    /// An index into the economic summary metric table.
    Metric(usize),
}

/// Resolve a parameter identifier to a field or metric.
pub fn resolve(param_id: &str) -> SensitivityResult<ResolvedParameter> {
    let digits = param_id
        .strip_prefix('S')
        .or_else(|| param_id.strip_prefix('s'))
        .unwrap_or(param_id);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SensitivityError::UnknownParameter {
            param_id: param_id.to_string(),
        });
    }

    if let Ok(num) = digits.parse::<u32>() {
        if METRIC_RANGE.contains(&num) {
            return Ok(ResolvedParameter::Metric(
                (num - METRIC_RANGE.start()) as usize,
            ));
        }
    }

    let suffix = format!("Amount{digits}");
    if let Some((_, field)) = PROPERTY_TABLE.iter().find(|(name, _)| name.ends_with(&suffix)) {
        return Ok(ResolvedParameter::Field(*field));
    }

    // Fallback: digits appearing anywhere in the field name.
    if let Some((_, field)) = PROPERTY_TABLE.iter().find(|(name, _)| name.contains(digits)) {
        return Ok(ResolvedParameter::Field(*field));
    }

    Err(SensitivityError::UnknownParameter {
        param_id: param_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selling_price_resolves_by_suffix() {
        assert_eq!(
            resolve("S13").unwrap(),
            ResolvedParameter::Field(FieldId::InitialSellingPrice)
        );
    }

    #[test]
    fn lowercase_prefix_accepted() {
        assert_eq!(
            resolve("s11").unwrap(),
            ResolvedParameter::Field(FieldId::BareErectedCost)
        );
    }

    #[test]
    fn vector_field_resolves() {
        assert_eq!(
            resolve("S40").unwrap(),
            ResolvedParameter::Field(FieldId::VariableCosts)
        );
    }

    #[test]
    fn metric_range_maps_by_offset() {
        assert_eq!(resolve("S80").unwrap(), ResolvedParameter::Metric(0));
        assert_eq!(resolve("S85").unwrap(), ResolvedParameter::Metric(5));
        assert_eq!(resolve("S90").unwrap(), ResolvedParameter::Metric(10));
    }

    #[test]
    fn unknown_number_rejected() {
        let err = resolve("S999").unwrap_err();
        assert!(matches!(err, SensitivityError::UnknownParameter { .. }));
    }

    #[test]
    fn garbage_rejected() {
        assert!(resolve("S").is_err());
        assert!(resolve("price").is_err());
        assert!(resolve("S1x3").is_err());
    }
}
