//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::LedgerStore`].
//! Every route except registration requires HTTP Basic credentials
//! (`email:password`). TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(tally_api::api_router(AppState::new(store, labels)))
//! ```

pub mod analytics;
pub mod auth;
pub mod businesses;
pub mod error;
pub mod expenses;
pub mod transactions;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tally_core::{labels::Labels, store::LedgerStore};
use tokio::sync::Mutex;

pub use error::ApiError;

/// Number of businesses a single user may own.
pub const MAX_BUSINESSES_PER_USER: usize = 10;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub labels: Arc<Labels>,
  /// Held across the count-then-insert of a business creation so the
  /// per-user cap holds under concurrent requests.
  pub business_writes: Arc<Mutex<()>>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, labels: Labels) -> Self {
    Self {
      store,
      labels: Arc::new(labels),
      business_writes: Arc::new(Mutex::new(())),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      labels:          Arc::clone(&self.labels),
      business_writes: Arc::clone(&self.business_writes),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    // Users
    .route("/users/register", post(users::register::<S>))
    .route("/users/me", get(users::me))
    // Businesses
    .route("/businesses", get(businesses::list::<S>).post(businesses::create::<S>))
    .route(
      "/businesses/{id}",
      get(businesses::get_one::<S>).delete(businesses::delete_one::<S>),
    )
    // Records
    .route(
      "/transactions",
      get(transactions::list::<S>).post(transactions::create::<S>),
    )
    .route("/transactions/{id}", get(transactions::get_one::<S>))
    .route("/expenses", get(expenses::list::<S>).post(expenses::create::<S>))
    .route("/expenses/{id}", get(expenses::get_one::<S>))
    // Analytics
    .route("/dashboard", get(analytics::overview::<S>))
    .route("/analytics/{id}/monthly-revenue", get(analytics::monthly_revenue::<S>))
    .route(
      "/analytics/{id}/expenses-by-category",
      get(analytics::expenses_by_category::<S>),
    )
    .route("/analytics/{id}/payment-methods", get(analytics::payment_methods::<S>))
    .route("/analytics/{id}/top-categories", get(analytics::top_categories::<S>))
    .route("/analytics/{id}/daily-stats", get(analytics::daily_stats::<S>))
    .route("/analytics/{id}/comparative/{year}", get(analytics::comparative::<S>))
    .route(
      "/analytics/{id}/cash-flow-analysis",
      get(analytics::cash_flow_analysis::<S>),
    )
    .route("/analytics/{id}/summary", get(analytics::summary::<S>))
    .route("/analytics/{id}/dashboard", get(analytics::dashboard::<S>))
    .route("/analytics/{id}/reports/{kind}", get(analytics::report::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
