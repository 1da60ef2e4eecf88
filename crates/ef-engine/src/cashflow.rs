//! Yearly cash-flow table computation.
//!
//! The table covers `construction_years + plant_lifetime` rows. Construction
//! rows carry only the negative amortized total overnight cost; operational
//! rows carry revenue, operating expense, the data-dependent depreciation
//! schedule, taxes, and discounted/cumulative cash flow.

use crate::error::{EngineError, EngineResult};
use ef_project::{validate_matrix, CalculationOption, ConfigMatrixRow, ConfigSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One project-year record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowRow {
    /// 0-based project year; construction years come first.
    pub year: u32,
    pub revenue: f64,
    pub operating_expense: f64,
    pub depreciation: f64,
    pub state_tax: f64,
    pub federal_tax: f64,
    pub after_tax: f64,
    pub discounted: f64,
    pub cumulative: f64,
}

/// Full table plus the NPV evaluated at the target row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashFlowOutcome {
    pub rows: Vec<CashFlowRow>,
    /// Cumulative cash flow at the target operational year.
    pub npv: f64,
    pub toc: f64,
    /// Years carrying nonzero depreciation (data-dependent).
    pub depreciation_years: usize,
}

/// Total overnight cost: nested contingency loading, each percentage
/// applied to the already-loaded subtotal.
pub fn total_overnight_cost(cfg: &ConfigSnapshot) -> f64 {
    cfg.bare_erected_cost
        * (1.0 + cfg.epc_contingency)
        * (1.0 + cfg.process_contingency)
        * (1.0 + cfg.project_contingency)
}

fn annual_operating_expense(cfg: &ConfigSnapshot, revenue: f64) -> f64 {
    match cfg.calculation_option {
        CalculationOption::Direct => cfg.operating_cost_pct * revenue,
        CalculationOption::Indirect => {
            let variable: f64 = cfg
                .variable_costs
                .iter()
                .zip(cfg.variable_quantities.iter())
                .enumerate()
                .filter(|(i, _)| cfg.selected_v.get(*i).copied().unwrap_or(true))
                .map(|(_, (cost, qty))| cost * (1.0 + cfg.general_inflation_rate) * qty)
                .sum();
            let fixed: f64 = cfg
                .fixed_costs
                .iter()
                .enumerate()
                .filter(|(i, _)| cfg.selected_f.get(*i).copied().unwrap_or(true))
                .map(|(_, c)| *c)
                .sum();
            variable + fixed
        }
    }
}

/// Depreciation allocation tracking tax-shield capacity.
///
/// Each year's fraction of TOC is `(revenue - opex) / TOC` (zero when TOC is
/// zero or the margin is negative). Fractions accumulate until the running
/// sum first exceeds 1.0; that year absorbs the remainder. If capacity never
/// reaches 1.0, the last operational year absorbs it, so the schedule always
/// sums to TOC exactly.
fn allocate_depreciation(revenue: &[f64], opex: &[f64], toc: f64) -> (Vec<f64>, usize) {
    let years = revenue.len();
    let mut schedule = vec![0.0; years];
    if years == 0 {
        return (schedule, 0);
    }

    let mut running = 0.0;
    let mut allocated = 0.0;
    let mut term = 0;
    for y in 0..years {
        let fraction = if toc == 0.0 {
            0.0
        } else {
            ((revenue[y] - opex[y]) / toc).max(0.0)
        };
        running += fraction;
        if running > 1.0 {
            schedule[y] = toc - allocated;
            term = y + 1;
            break;
        }
        schedule[y] = fraction * toc;
        allocated += schedule[y];
        term = y + 1;
    }

    // Capacity never reached TOC: the final year takes the remainder.
    if running <= 1.0 && toc > 0.0 {
        schedule[years - 1] += toc - allocated;
        term = years;
    }

    (schedule, term)
}

/// Compute the full cash-flow table for one candidate price.
///
/// `target_row` is the 1-based operational year at which NPV is evaluated.
/// Intervals whose `start_year` is at or before `target_row` see the
/// candidate price; later intervals use their own stored selling price.
pub fn compute_cash_flow(
    base: &ConfigSnapshot,
    matrix: &[ConfigMatrixRow],
    price: f64,
    target_row: u32,
) -> EngineResult<CashFlowOutcome> {
    validate_matrix(matrix, base.plant_lifetime)?;
    if target_row == 0 || target_row > base.plant_lifetime {
        return Err(EngineError::InvalidTarget {
            target_row,
            operational_years: base.plant_lifetime,
        });
    }

    let lifetime = base.plant_lifetime as usize;
    let construction_years = base.construction_years as usize;

    // Per-interval merged snapshots, resolved once.
    let mut merged: Vec<(ConfigMatrixRow, ConfigSnapshot)> = Vec::with_capacity(matrix.len());
    for row in matrix {
        merged.push((row.clone(), row.merged(base)?));
    }

    let toc = total_overnight_cost(base);

    let mut revenue = vec![0.0; lifetime];
    let mut opex = vec![0.0; lifetime];
    for (row, cfg) in &merged {
        let interval_price = if row.start_year <= target_row {
            price
        } else {
            cfg.initial_selling_price
        };
        for year in row.start_year..=row.end_year {
            let y = (year - 1) as usize;
            revenue[y] = cfg.number_of_units * interval_price * (1.0 + cfg.general_inflation_rate);
            opex[y] = annual_operating_expense(cfg, revenue[y]);
        }
    }

    let (depreciation, depreciation_years) = allocate_depreciation(&revenue, &opex, toc);

    let mut rows = Vec::with_capacity(construction_years + lifetime);
    let mut cumulative = 0.0;

    if construction_years > 0 {
        let annual_toc_share = -toc / construction_years as f64;
        for year in 0..construction_years {
            cumulative += annual_toc_share;
            rows.push(CashFlowRow {
                year: year as u32,
                revenue: 0.0,
                operating_expense: annual_toc_share,
                depreciation: 0.0,
                state_tax: 0.0,
                federal_tax: 0.0,
                after_tax: annual_toc_share,
                discounted: annual_toc_share,
                cumulative,
            });
        }
    }

    let discount = 1.0 + base.internal_rate_of_return;
    for y in 0..lifetime {
        let taxable = (revenue[y] - opex[y] - depreciation[y]).max(0.0);
        let state_tax = taxable * base.state_tax_rate;
        let federal_tax = taxable * base.federal_tax_rate;
        let after_tax = revenue[y] - opex[y] - state_tax - federal_tax;
        // Single-period divisor per year, not compounded by year index.
        let discounted = after_tax / discount;
        cumulative += discounted;
        rows.push(CashFlowRow {
            year: (construction_years + y) as u32,
            revenue: revenue[y],
            operating_expense: opex[y],
            depreciation: depreciation[y],
            state_tax,
            federal_tax,
            after_tax,
            discounted,
            cumulative,
        });
    }

    let target_index = construction_years + target_row as usize - 1;
    let npv = ef_core::ensure_finite(rows[target_index].cumulative, "npv")?;
    debug!(price, npv, toc, depreciation_years, "cash flow computed");

    Ok(CashFlowOutcome {
        rows,
        npv,
        toc,
        depreciation_years,
    })
}
