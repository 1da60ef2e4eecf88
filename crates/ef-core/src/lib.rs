//! ef-core: numeric primitives shared by the econoflow crates.
//!
//! Everything monetary flows through `Real` and the helpers here; the
//! engine and store lean on them for finiteness checks and cent rounding.

pub mod error;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
