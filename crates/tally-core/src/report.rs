//! Report shapes produced by the analytics engine, and the closed set of
//! report kinds used to dispatch a report by name.
//!
//! Every type here is plain data. JSON shaping is left to `serde`; money is
//! serialised as a JSON number.

use std::{collections::BTreeMap, ops::RangeInclusive};

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, ledger::Business};

/// Default number of entries per list in [`TopCategories`].
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Default look-back window, in days, for [`DailyStats`].
pub const DEFAULT_DAILY_WINDOW: i64 = 30;

/// Accepted `limit` values for [`TopCategories`].
pub const TOP_LIMIT_RANGE: RangeInclusive<usize> = 1..=20;

/// Accepted `days` values for [`DailyStats`].
pub const DAILY_WINDOW_RANGE: RangeInclusive<i64> = 1..=365;

/// Default a missing `limit` and reject one outside [`TOP_LIMIT_RANGE`].
pub fn check_limit(limit: Option<usize>) -> Result<usize> {
  let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
  if !TOP_LIMIT_RANGE.contains(&limit) {
    return Err(Error::InvalidParameter(format!(
      "limit must be between {} and {}",
      TOP_LIMIT_RANGE.start(),
      TOP_LIMIT_RANGE.end()
    )));
  }
  Ok(limit)
}

/// Default a missing `days` and reject one outside [`DAILY_WINDOW_RANGE`].
pub fn check_days(days: Option<i64>) -> Result<i64> {
  let days = days.unwrap_or(DEFAULT_DAILY_WINDOW);
  if !DAILY_WINDOW_RANGE.contains(&days) {
    return Err(Error::InvalidParameter(format!(
      "days must be between {} and {}",
      DAILY_WINDOW_RANGE.start(),
      DAILY_WINDOW_RANGE.end()
    )));
  }
  Ok(days)
}

// ─── Monthly revenue ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
  pub month_num:         u32,
  pub month_name:        String,
  pub total:             Decimal,
  pub transaction_count: u64,
}

// ─── Shares ──────────────────────────────────────────────────────────────────

/// One expense category and its share of total spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
  pub category:   String,
  pub total:      Decimal,
  pub count:      u64,
  pub percentage: Decimal,
}

/// One payment method and its share of total revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodShare {
  pub method:      String,
  pub method_name: String,
  pub total:       Decimal,
  pub count:       u64,
  pub percentage:  Decimal,
}

// ─── Top categories ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
  pub category: String,
  pub total:    Decimal,
  pub count:    u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategories {
  pub top_sales_categories:   Vec<CategoryTotal>,
  pub top_expense_categories: Vec<CategoryTotal>,
}

// ─── Daily stats ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
  /// Serialised as `YYYY-MM-DD`.
  pub date:          NaiveDate,
  pub revenue:       Decimal,
  pub transactions:  u64,
  pub expenses:      Decimal,
  pub expense_count: u64,
  pub profit:        Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
  pub total_revenue:     Decimal,
  pub total_expenses:    Decimal,
  pub total_profit:      Decimal,
  pub profit_margin:     Decimal,
  pub avg_daily_revenue: Decimal,
  /// Number of dates that carry any activity, not the requested window.
  pub days_count:        u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
  pub daily_data: Vec<DailyEntry>,
  pub summary:    DailySummary,
}

// ─── Comparative ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
  pub month:         String,
  pub current_year:  Decimal,
  pub previous_year: Decimal,
  pub growth_rate:   Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeStats {
  pub year:                  i32,
  pub previous_year:         i32,
  pub monthly_comparison:    Vec<MonthComparison>,
  pub year_over_year_growth: Decimal,
}

// ─── Cash flow ───────────────────────────────────────────────────────────────

/// Revenue of one calendar month split by payment method.
///
/// `cash + mobile_money + card + bank_transfer + other == total`. Codes that
/// are not one of the four known methods only land in `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPeriod {
  /// `YYYY-MM`
  pub period:        String,
  pub cash:          Decimal,
  pub mobile_money:  Decimal,
  pub card:          Decimal,
  pub bank_transfer: Decimal,
  pub other:         Decimal,
  pub total:         Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowAnalysis {
  pub monthly_breakdown: Vec<CashFlowPeriod>,
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
  pub revenue:       Decimal,
  pub expenses:      Decimal,
  pub profit:        Decimal,
  pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
  pub transactions: u64,
  pub expenses:     u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
  pub transaction: Decimal,
  pub expense:     Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPaymentMethod {
  pub method:      String,
  pub method_name: String,
  pub count:       u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
  pub totals:             Totals,
  pub counts:             Counts,
  pub averages:           Averages,
  /// `null` when the business has no transactions.
  pub top_payment_method: Option<TopPaymentMethod>,
}

// ─── Business views ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
  pub id:       Uuid,
  pub name:     String,
  pub currency: String,
  pub sector:   Option<String>,
}

impl From<&Business> for BusinessInfo {
  fn from(b: &Business) -> Self {
    Self {
      id:       b.id,
      name:     b.name.clone(),
      currency: b.currency.clone(),
      sector:   b.sector.clone(),
    }
  }
}

/// A business together with its lifetime record counts and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDetails {
  #[serde(flatten)]
  pub business:           Business,
  pub transactions_count: u64,
  pub expenses_count:     u64,
  pub total_revenue:      Decimal,
  pub total_expenses:     Decimal,
}

/// Every report for one business in a single payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
  pub business_info:        BusinessInfo,
  pub monthly_revenue:      Vec<MonthlyRevenue>,
  pub expenses_by_category: Vec<CategoryShare>,
  pub payment_methods:      Vec<PaymentMethodShare>,
  pub top_categories:       TopCategories,
  pub daily_stats:          DailyStats,
  pub cash_flow:            CashFlowAnalysis,
  pub summary:              SummaryStats,
}

// ─── Overview ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewTotals {
  pub total_revenue:  Decimal,
  pub total_expenses: Decimal,
  pub net_profit:     Decimal,
  pub profit_margin:  Decimal,
}

/// Totals across every business a user owns, or one of them.
///
/// Revenue is keyed by raw payment-method code and spend by category, both
/// in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub summary:              OverviewTotals,
  pub cash_flow_by_method:  BTreeMap<String, Decimal>,
  pub expenses_by_category: BTreeMap<String, Decimal>,
  pub counts:               Counts,
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// The closed set of reports the engine can produce.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ReportKind {
  MonthlyRevenue,
  ExpensesByCategory,
  PaymentMethods,
  TopCategories,
  DailyStats,
  Comparative,
  CashFlow,
  Summary,
}

impl ReportKind {
  /// Parse a report name; snake_case and kebab-case are both accepted.
  pub fn parse(name: &str) -> Result<Self> {
    name
      .trim()
      .replace('_', "-")
      .parse()
      .map_err(|_| Error::UnknownReport(name.to_owned()))
  }
}

/// Optional knobs a caller may pass along with a [`ReportKind`]. Each kind
/// reads only the parameters that concern it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
  pub year:  Option<i32>,
  pub days:  Option<i64>,
  pub limit: Option<usize>,
}

impl ReportParams {
  /// Fill in the default `days` and `limit` and range-check both.
  pub fn checked(self) -> Result<Self> {
    Ok(Self {
      year:  self.year,
      days:  Some(check_days(self.days)?),
      limit: Some(check_limit(self.limit)?),
    })
  }
}

/// A fully-parameterised report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRequest {
  MonthlyRevenue { year: Option<i32> },
  ExpensesByCategory,
  PaymentMethods,
  TopCategories { limit: usize },
  DailyStats { days: i64 },
  Comparative { year: i32 },
  CashFlow,
  Summary,
}

impl ReportRequest {
  /// Resolve `params` against the defaults of `kind`. `today` supplies the
  /// year for a comparative report when none is given.
  pub fn new(kind: ReportKind, params: ReportParams, today: NaiveDate) -> Self {
    match kind {
      ReportKind::MonthlyRevenue => Self::MonthlyRevenue { year: params.year },
      ReportKind::ExpensesByCategory => Self::ExpensesByCategory,
      ReportKind::PaymentMethods => Self::PaymentMethods,
      ReportKind::TopCategories => {
        Self::TopCategories { limit: params.limit.unwrap_or(DEFAULT_TOP_LIMIT) }
      }
      ReportKind::DailyStats => {
        Self::DailyStats { days: params.days.unwrap_or(DEFAULT_DAILY_WINDOW) }
      }
      ReportKind::Comparative => {
        Self::Comparative { year: params.year.unwrap_or_else(|| today.year()) }
      }
      ReportKind::CashFlow => Self::CashFlow,
      ReportKind::Summary => Self::Summary,
    }
  }

  pub fn kind(&self) -> ReportKind {
    match self {
      Self::MonthlyRevenue { .. } => ReportKind::MonthlyRevenue,
      Self::ExpensesByCategory => ReportKind::ExpensesByCategory,
      Self::PaymentMethods => ReportKind::PaymentMethods,
      Self::TopCategories { .. } => ReportKind::TopCategories,
      Self::DailyStats { .. } => ReportKind::DailyStats,
      Self::Comparative { .. } => ReportKind::Comparative,
      Self::CashFlow => ReportKind::CashFlow,
      Self::Summary => ReportKind::Summary,
    }
  }
}

/// The output of [`Analytics::run`](crate::analytics::Analytics::run).
/// Serialises as the bare inner report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
  MonthlyRevenue(Vec<MonthlyRevenue>),
  ExpensesByCategory(Vec<CategoryShare>),
  PaymentMethods(Vec<PaymentMethodShare>),
  TopCategories(TopCategories),
  DailyStats(DailyStats),
  Comparative(ComparativeStats),
  CashFlow(CashFlowAnalysis),
  Summary(SummaryStats),
}

impl Report {
  pub fn kind(&self) -> ReportKind {
    match self {
      Self::MonthlyRevenue(_) => ReportKind::MonthlyRevenue,
      Self::ExpensesByCategory(_) => ReportKind::ExpensesByCategory,
      Self::PaymentMethods(_) => ReportKind::PaymentMethods,
      Self::TopCategories(_) => ReportKind::TopCategories,
      Self::DailyStats(_) => ReportKind::DailyStats,
      Self::Comparative(_) => ReportKind::Comparative,
      Self::CashFlow(_) => ReportKind::CashFlow,
      Self::Summary(_) => ReportKind::Summary,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use strum::IntoEnumIterator;

  #[test]
  fn report_kind_accepts_both_spellings() {
    assert_eq!(ReportKind::parse("cash-flow").unwrap(), ReportKind::CashFlow);
    assert_eq!(ReportKind::parse("cash_flow").unwrap(), ReportKind::CashFlow);
    assert_eq!(
      ReportKind::parse("Expenses_By_Category").unwrap(),
      ReportKind::ExpensesByCategory
    );
    assert!(matches!(
      ReportKind::parse("forecast"),
      Err(Error::UnknownReport(name)) if name == "forecast"
    ));
  }

  #[test]
  fn every_kind_round_trips_through_its_name() {
    for kind in ReportKind::iter() {
      assert_eq!(ReportKind::parse(&kind.to_string()).unwrap(), kind);
    }
  }

  #[test]
  fn request_applies_defaults() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let none = ReportParams::default();

    assert_eq!(
      ReportRequest::new(ReportKind::TopCategories, none, today),
      ReportRequest::TopCategories { limit: DEFAULT_TOP_LIMIT }
    );
    assert_eq!(
      ReportRequest::new(ReportKind::DailyStats, none, today),
      ReportRequest::DailyStats { days: DEFAULT_DAILY_WINDOW }
    );
    assert_eq!(
      ReportRequest::new(ReportKind::Comparative, none, today),
      ReportRequest::Comparative { year: 2026 }
    );

    let with_year = ReportParams { year: Some(2024), ..Default::default() };
    let req = ReportRequest::new(ReportKind::Comparative, with_year, today);
    assert_eq!(req, ReportRequest::Comparative { year: 2024 });
    assert_eq!(req.kind(), ReportKind::Comparative);
  }

  #[test]
  fn params_are_defaulted_and_range_checked() {
    let p = ReportParams::default().checked().unwrap();
    assert_eq!(p.days, Some(DEFAULT_DAILY_WINDOW));
    assert_eq!(p.limit, Some(DEFAULT_TOP_LIMIT));

    let edge = ReportParams { year: None, days: Some(365), limit: Some(20) };
    assert_eq!(edge.checked().unwrap(), edge);

    for bad in [
      ReportParams { days: Some(0), ..Default::default() },
      ReportParams { days: Some(366), ..Default::default() },
      ReportParams { limit: Some(0), ..Default::default() },
      ReportParams { limit: Some(21), ..Default::default() },
    ] {
      assert!(matches!(bad.checked(), Err(Error::InvalidParameter(_))));
    }
  }
}
