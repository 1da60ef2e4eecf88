//! Bounded-step iterative price adjustment toward an NPV tolerance band.

use crate::cashflow::{compute_cash_flow, CashFlowOutcome};
use crate::error::{EngineError, EngineResult};
use ef_project::{ConfigMatrixRow, ConfigSnapshot};
use tracing::debug;

/// Price search configuration.
pub struct PriceSearchConfig {
    /// Lower edge of the NPV tolerance band
    pub lower: f64,
    /// Upper edge of the NPV tolerance band
    pub upper: f64,
    /// Multiplier applied while NPV is below the band (> 1)
    pub increase_rate: f64,
    /// Multiplier applied while NPV is above the band (< 1)
    pub decrease_rate: f64,
    /// Iteration cap; exceeding it is a convergence failure
    pub max_iterations: usize,
}

impl Default for PriceSearchConfig {
    fn default() -> Self {
        Self {
            lower: -10_000.0,
            upper: 10_000.0,
            increase_rate: 1.01,
            decrease_rate: 0.99,
            max_iterations: 1_000,
        }
    }
}

/// Price search result.
#[derive(Debug)]
pub struct PriceSearchResult {
    /// Converged price
    pub price: f64,
    /// NPV at the converged price, inside the tolerance band
    pub npv: f64,
    /// Iterations consumed
    pub iterations: usize,
    /// Final cash-flow table
    pub outcome: CashFlowOutcome,
}

/// Adjust price until the NPV at `target_row` lands inside the band.
///
/// `start_price` seeds the first candidate only; when absent the search
/// starts from the snapshot's stored selling price. The stored price is
/// never modified, so intervals past `target_row` keep their own pricing
/// regardless of where the search starts.
///
/// The sink receives the full recomputed table on every iteration; callers
/// use it to persist the intermediate artifact (recompute-and-overwrite
/// behavior). A sink error aborts the search.
pub fn find_price<F>(
    base: &ConfigSnapshot,
    matrix: &[ConfigMatrixRow],
    target_row: u32,
    start_price: Option<f64>,
    config: &PriceSearchConfig,
    mut sink: F,
) -> EngineResult<PriceSearchResult>
where
    F: FnMut(&CashFlowOutcome) -> EngineResult<()>,
{
    if config.increase_rate <= 1.0 {
        return Err(EngineError::SearchConfig {
            what: "increase_rate must be > 1",
        });
    }
    if config.decrease_rate <= 0.0 || config.decrease_rate >= 1.0 {
        return Err(EngineError::SearchConfig {
            what: "decrease_rate must be in (0, 1)",
        });
    }
    if config.lower > config.upper {
        return Err(EngineError::SearchConfig {
            what: "tolerance band is inverted",
        });
    }

    let mut price = start_price.unwrap_or(base.initial_selling_price);
    let mut last_npv = f64::NAN;

    for iteration in 0..config.max_iterations {
        let outcome = compute_cash_flow(base, matrix, price, target_row)?;
        sink(&outcome)?;
        last_npv = outcome.npv;

        if outcome.npv < config.lower {
            price *= config.increase_rate;
        } else if outcome.npv > config.upper {
            price *= config.decrease_rate;
        } else {
            debug!(price, npv = outcome.npv, iteration, "price search converged");
            return Ok(PriceSearchResult {
                price,
                npv: outcome.npv,
                iterations: iteration + 1,
                outcome,
            });
        }
    }

    Err(EngineError::Convergence {
        iterations: config.max_iterations,
        npv: last_npv,
    })
}
