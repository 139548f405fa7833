//! Core types and the analytics engine for the Tally bookkeeping backend.
//!
//! No HTTP or database dependencies live here. Storage backends implement
//! [`store::LedgerStore`]; the [`analytics::Analytics`] engine reads through
//! that trait and folds rows into reports with the pure functions in [`fold`].

// Store traits spell out `impl Future + Send` returns.
#![allow(async_fn_in_trait)]

pub mod analytics;
pub mod error;
pub mod fold;
pub mod labels;
pub mod ledger;
pub mod report;
pub mod store;

pub use error::{Error, Result};
