//! ef-engine: yearly cash-flow computation, economic summary metrics, and
//! the NPV-targeted price search.

pub mod cashflow;
pub mod error;
pub mod price_search;
pub mod summary;

pub use cashflow::{compute_cash_flow, total_overnight_cost, CashFlowOutcome, CashFlowRow};
pub use error::{EngineError, EngineResult};
pub use price_search::{find_price, PriceSearchConfig, PriceSearchResult};
pub use summary::{summarize, EconomicSummary, SUMMARY_METRICS};
