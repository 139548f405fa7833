//! The `LedgerStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The analytics engine and the HTTP layer depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, TimeZone as _, Utc};
use uuid::Uuid;

use crate::ledger::{
  Business, Expense, NewBusiness, NewExpense, NewTransaction, Transaction, User,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// A half-open `[from, until)` window over `created_at`. Both bounds are
/// optional; the default query matches every record of a business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordQuery {
  pub from:  Option<DateTime<Utc>>,
  pub until: Option<DateTime<Utc>>,
}

impl RecordQuery {
  /// Records created during calendar year `year` (UTC).
  pub fn year(year: i32) -> Self {
    Self { from: year_start(year), until: year.checked_add(1).and_then(year_start) }
  }

  /// Records created on or after midnight UTC of `date`.
  pub fn since(date: NaiveDate) -> Self {
    Self { from: date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()), until: None }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.from.is_none_or(|from| at >= from) && self.until.is_none_or(|until| at < until)
  }
}

fn year_start(year: i32) -> Option<DateTime<Utc>> {
  Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error type of a [`LedgerStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The write lost to a uniqueness constraint, e.g. a registered email.
  fn is_conflict(&self) -> bool;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tally ledger backend.
///
/// Transactions and expenses are append-only; there are no update
/// operations. Deleting a user or a business cascades to everything it owns.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails if the email is already registered.
  fn create_user(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Delete a user and, transitively, every business and record they own.
  /// Returns `false` if no such user existed.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Businesses ────────────────────────────────────────────────────────

  fn create_business(
    &self,
    owner_id: Uuid,
    input: NewBusiness,
  ) -> impl Future<Output = Result<Business, Self::Error>> + Send + '_;

  /// Retrieve a business by id regardless of owner. Callers enforce
  /// ownership themselves.
  fn get_business(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Business>, Self::Error>> + Send + '_;

  fn list_businesses(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send + '_;

  /// Delete a business with its transactions and expenses.
  /// Returns `false` if no such business existed.
  fn delete_business(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Records (append-only) ──────────────────────────────────────

  /// Record a revenue event. `created_at` defaults to now.
  fn record_transaction(
    &self,
    input: NewTransaction,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  /// Record an outflow event. `created_at` defaults to now.
  fn record_expense(
    &self,
    input: NewExpense,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_transaction(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  fn get_expense(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Expense>, Self::Error>> + Send + '_;

  /// Transactions of one business inside `query`, oldest first.
  fn transactions(
    &self,
    business_id: Uuid,
    query: RecordQuery,
  ) -> impl Future<Output = Result<Vec<Transaction>, Self::Error>> + Send + '_;

  /// Expenses of one business inside `query`, oldest first.
  fn expenses(
    &self,
    business_id: Uuid,
    query: RecordQuery,
  ) -> impl Future<Output = Result<Vec<Expense>, Self::Error>> + Send + '_;
}
