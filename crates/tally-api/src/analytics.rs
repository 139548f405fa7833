//! Handlers for `/analytics/:id/…` endpoints and the user-wide `/dashboard`.
//!
//! Each per-business handler opens an [`Analytics`] engine for the path's
//! business on behalf of the caller, so a business the caller does not own
//! yields 403. Query parameters are range-checked here; the engine accepts
//! any value.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tally_core::{
  analytics::{self, Analytics},
  report::{
    CashFlowAnalysis, CategoryShare, ComparativeStats, DailyStats, Dashboard,
    MonthlyRevenue, Overview, PaymentMethodShare, Report, ReportKind, ReportParams,
    ReportRequest, SummaryStats, TopCategories, check_days, check_limit,
  },
  store::LedgerStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

async fn engine<'s, S: LedgerStore>(
  state: &'s AppState<S>,
  business_id: Uuid,
  user: &CurrentUser,
) -> Result<Analytics<'s, S>, ApiError> {
  let labels = state.labels.as_ref().clone();
  Ok(Analytics::new(state.store.as_ref(), business_id, user.0.id, labels).await?)
}

// ─── Single reports ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct YearParams {
  pub year: Option<i32>,
}

/// `GET /analytics/:id/monthly-revenue[?year=<yyyy>]`
pub async fn monthly_revenue<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<YearParams>,
) -> Result<Json<Vec<MonthlyRevenue>>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.monthly_revenue(params.year).await?))
}

/// `GET /analytics/:id/expenses-by-category`
pub async fn expenses_by_category<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CategoryShare>>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.expenses_by_category().await?))
}

/// `GET /analytics/:id/payment-methods`
pub async fn payment_methods<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentMethodShare>>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.payment_methods_distribution().await?))
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

/// `GET /analytics/:id/top-categories[?limit=<1..=20>]`
pub async fn top_categories<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<LimitParams>,
) -> Result<Json<TopCategories>, ApiError> {
  let limit = check_limit(params.limit)?;
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.top_categories(limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct DaysParams {
  pub days: Option<i64>,
}

/// `GET /analytics/:id/daily-stats[?days=<1..=365>]`
pub async fn daily_stats<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<DaysParams>,
) -> Result<Json<DailyStats>, ApiError> {
  let days = check_days(params.days)?;
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.daily_stats(days).await?))
}

/// `GET /analytics/:id/comparative/:year`
pub async fn comparative<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path((id, year)): Path<(Uuid, i32)>,
) -> Result<Json<ComparativeStats>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.comparative_stats(year).await?))
}

/// `GET /analytics/:id/cash-flow-analysis`
pub async fn cash_flow_analysis<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<CashFlowAnalysis>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.cash_flow_analysis().await?))
}

/// `GET /analytics/:id/summary`
pub async fn summary<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<SummaryStats>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.summary_stats().await?))
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// `GET /analytics/:id/dashboard`
pub async fn dashboard<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Dashboard>, ApiError> {
  let engine = engine(&state, id, &user).await?;
  Ok(Json(engine.dashboard().await?))
}

/// `GET /analytics/:id/reports/:kind[?year=…&days=…&limit=…]`
///
/// `kind` accepts kebab-case or snake_case report names.
pub async fn report<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path((id, kind)): Path<(Uuid, String)>,
  Query(params): Query<ReportParams>,
) -> Result<Json<Report>, ApiError> {
  let kind = ReportKind::parse(&kind)?;
  let params = params.checked()?;

  let engine = engine(&state, id, &user).await?;
  let request = ReportRequest::new(kind, params, Utc::now().date_naive());
  Ok(Json(engine.run(request).await?))
}

// ─── User-wide ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OverviewParams {
  pub business_id: Option<Uuid>,
}

/// `GET /dashboard[?business_id=<id>]`
///
/// Totals across every business the caller owns; 403 for a `business_id`
/// the caller does not own.
pub async fn overview<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<OverviewParams>,
) -> Result<Json<Overview>, ApiError> {
  let overview =
    analytics::overview(state.store.as_ref(), user.id, params.business_id).await?;
  Ok(Json(overview))
}
