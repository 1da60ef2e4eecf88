//! Economic summary metrics.
//!
//! A fixed ordered table computed from a finished cash-flow outcome. The
//! sensitivity parameter range `S80`..`S90` addresses this table by index,
//! so the order is part of the external contract.

use crate::cashflow::CashFlowOutcome;
use ef_project::ConfigSnapshot;
use serde::{Deserialize, Serialize};

/// Metric names in contract order (indices 0..=10).
pub const SUMMARY_METRICS: [&str; 11] = [
    "Internal Rate of Return",
    "Calculated Selling Price",
    "Total Overnight Cost (TOC)",
    "Depreciation Term (years)",
    "Total Depreciation",
    "Average Annual Revenue",
    "Average Annual Operating Expenses",
    "Average Annual State Taxes",
    "Average Annual Federal Taxes",
    "Average Annual After-Tax Cash Flow",
    "Cumulative NPV at Target Row",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomicSummary {
    pub values: Vec<f64>,
}

impl EconomicSummary {
    /// Metric by table index.
    pub fn metric(&self, index: usize) -> Option<(&'static str, f64)> {
        let name = SUMMARY_METRICS.get(index)?;
        let value = self.values.get(index)?;
        Some((name, *value))
    }
}

/// Summarize a finished outcome at a given (converged) price.
pub fn summarize(cfg: &ConfigSnapshot, outcome: &CashFlowOutcome, price: f64) -> EconomicSummary {
    let cy = cfg.construction_years as usize;
    let operational = &outcome.rows[cy.min(outcome.rows.len())..];
    let n = operational.len().max(1) as f64;

    let avg = |f: fn(&crate::cashflow::CashFlowRow) -> f64| -> f64 {
        operational.iter().map(f).sum::<f64>() / n
    };

    let total_depreciation: f64 = operational.iter().map(|r| r.depreciation).sum();

    EconomicSummary {
        values: vec![
            cfg.internal_rate_of_return,
            price,
            outcome.toc,
            outcome.depreciation_years as f64,
            total_depreciation,
            avg(|r| r.revenue),
            avg(|r| r.operating_expense),
            avg(|r| r.state_tax),
            avg(|r| r.federal_tax),
            avg(|r| r.after_tax),
            outcome.npv,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::compute_cash_flow;
    use ef_project::{CalculationOption, ConfigMatrixRow};

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            plant_lifetime: 10,
            construction_years: 1,
            bare_erected_cost: 500_000.0,
            epc_contingency: 0.1,
            process_contingency: 0.0,
            project_contingency: 0.1,
            number_of_units: 5_000.0,
            initial_selling_price: 40.0,
            operating_cost_pct: 0.25,
            general_inflation_rate: 0.0,
            internal_rate_of_return: 0.07,
            state_tax_rate: 0.05,
            federal_tax_rate: 0.2,
            calculation_option: CalculationOption::Direct,
            variable_costs: vec![],
            variable_quantities: vec![],
            fixed_costs: vec![],
            selected_v: vec![],
            selected_f: vec![],
        }
    }

    #[test]
    fn table_is_fully_populated_in_order() {
        let cfg = snapshot();
        let matrix = vec![ConfigMatrixRow::span(1, 10)];
        let out = compute_cash_flow(&cfg, &matrix, 40.0, 10).unwrap();
        let summary = summarize(&cfg, &out, 40.0);
        assert_eq!(summary.values.len(), SUMMARY_METRICS.len());
        let (name, value) = summary.metric(1).unwrap();
        assert_eq!(name, "Calculated Selling Price");
        assert_eq!(value, 40.0);
        let (name, value) = summary.metric(10).unwrap();
        assert_eq!(name, "Cumulative NPV at Target Row");
        assert_eq!(value, out.npv);
        assert!(summary.metric(11).is_none());
    }

    #[test]
    fn average_revenue_matches_uniform_interval() {
        let cfg = snapshot();
        let matrix = vec![ConfigMatrixRow::span(1, 10)];
        let out = compute_cash_flow(&cfg, &matrix, 40.0, 10).unwrap();
        let summary = summarize(&cfg, &out, 40.0);
        let (_, avg_revenue) = summary.metric(5).unwrap();
        assert!((avg_revenue - 5_000.0 * 40.0).abs() < 1e-9);
    }
}
