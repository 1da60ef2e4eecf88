//! Configuration matrix validation.

use crate::schema::ConfigMatrixRow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Matrix is empty")]
    EmptyMatrix,

    #[error("Interval [{start_year}, {end_year}] is inverted")]
    InvertedInterval { start_year: u32, end_year: u32 },

    #[error("Interval [{start_year}, {end_year}] declares length {length}, expected {expected}")]
    BadLength {
        start_year: u32,
        end_year: u32,
        length: u32,
        expected: u32,
    },

    #[error("Intervals do not cover year {year} (gap or out-of-order row)")]
    Gap { year: u32 },

    #[error("Intervals overlap at year {year}")]
    Overlap { year: u32 },

    #[error("Matrix ends at year {end_year}, plant lifetime is {plant_lifetime}")]
    LifetimeMismatch { end_year: u32, plant_lifetime: u32 },
}

/// Check that the matrix rows partition `1..=plant_lifetime` with no gaps
/// or overlaps and consistent lengths.
pub fn validate_matrix(
    rows: &[ConfigMatrixRow],
    plant_lifetime: u32,
) -> Result<(), ValidationError> {
    if rows.is_empty() {
        return Err(ValidationError::EmptyMatrix);
    }

    let mut sorted: Vec<&ConfigMatrixRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.start_year);

    let mut expected_start = 1u32;
    for row in sorted {
        if row.start_year > row.end_year {
            return Err(ValidationError::InvertedInterval {
                start_year: row.start_year,
                end_year: row.end_year,
            });
        }
        let expected = row.end_year - row.start_year + 1;
        if row.length != expected {
            return Err(ValidationError::BadLength {
                start_year: row.start_year,
                end_year: row.end_year,
                length: row.length,
                expected,
            });
        }
        if row.start_year > expected_start {
            return Err(ValidationError::Gap {
                year: expected_start,
            });
        }
        if row.start_year < expected_start {
            return Err(ValidationError::Overlap {
                year: row.start_year,
            });
        }
        expected_start = row.end_year + 1;
    }

    if expected_start != plant_lifetime + 1 {
        return Err(ValidationError::LifetimeMismatch {
            end_year: expected_start - 1,
            plant_lifetime,
        });
    }

    Ok(())
}
