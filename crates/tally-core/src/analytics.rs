//! The analytics engine: an ownership-checked view over one business.
//!
//! [`Analytics::new`] is the only way to obtain an engine, and it fails with
//! [`Error::Unauthorized`] unless the business exists and belongs to the
//! requesting user. Every report method therefore runs behind the gate.

use chrono::{NaiveDate, TimeDelta, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
  Error, Result, fold,
  labels::Labels,
  ledger::{Business, Expense, Transaction},
  report::{
    BusinessDetails, BusinessInfo, CashFlowAnalysis, CategoryShare,
    ComparativeStats, Dashboard, DEFAULT_DAILY_WINDOW, DEFAULT_TOP_LIMIT,
    DailyStats, MonthlyRevenue, Overview, PaymentMethodShare, Report,
    ReportRequest, SummaryStats, TopCategories,
  },
  store::{LedgerStore, RecordQuery},
};

/// Check that `user_id` owns `business_id` and return the business.
pub async fn authorize<S: LedgerStore>(
  store: &S,
  business_id: Uuid,
  user_id: Uuid,
) -> Result<Business> {
  match store.get_business(business_id).await.map_err(Error::store)? {
    Some(b) if b.is_owned_by(user_id) => Ok(b),
    _ => Err(Error::Unauthorized(business_id)),
  }
}

/// Lifetime counts and totals for a business. Ownership is not checked here.
pub async fn business_details<S: LedgerStore>(
  store: &S,
  business: Business,
) -> Result<BusinessDetails> {
  let transactions = store
    .transactions(business.id, RecordQuery::default())
    .await
    .map_err(Error::store)?;
  let expenses = store
    .expenses(business.id, RecordQuery::default())
    .await
    .map_err(Error::store)?;
  Ok(fold::business_details(business, &transactions, &expenses))
}

/// Totals across every business `user_id` owns, or only `business_id` when
/// given. A `business_id` the user does not own is [`Error::Unauthorized`].
#[instrument(skip(store))]
pub async fn overview<S: LedgerStore>(
  store: &S,
  user_id: Uuid,
  business_id: Option<Uuid>,
) -> Result<Overview> {
  let businesses = match business_id {
    Some(id) => vec![authorize(store, id, user_id).await?],
    None => store.list_businesses(user_id).await.map_err(Error::store)?,
  };

  let mut transactions = Vec::new();
  let mut expenses = Vec::new();
  for b in &businesses {
    transactions.extend(
      store
        .transactions(b.id, RecordQuery::default())
        .await
        .map_err(Error::store)?,
    );
    expenses.extend(
      store
        .expenses(b.id, RecordQuery::default())
        .await
        .map_err(Error::store)?,
    );
  }
  debug!(
    businesses = businesses.len(),
    transactions = transactions.len(),
    expenses = expenses.len(),
    "loaded overview records"
  );
  Ok(fold::overview(&transactions, &expenses))
}

/// First date included in a `days`-long window ending on `today`.
fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
  TimeDelta::try_days(days)
    .and_then(|d| today.checked_sub_signed(d))
    .unwrap_or(NaiveDate::MIN)
}

pub struct Analytics<'s, S> {
  store:    &'s S,
  business: Business,
  labels:   Labels,
}

impl<'s, S: LedgerStore> Analytics<'s, S> {
  /// Open the engine for `business_id` on behalf of `user_id`.
  #[instrument(skip(store, labels))]
  pub async fn new(
    store: &'s S,
    business_id: Uuid,
    user_id: Uuid,
    labels: Labels,
  ) -> Result<Self> {
    let business = authorize(store, business_id, user_id).await?;
    Ok(Self { store, business, labels })
  }

  pub fn business(&self) -> &Business { &self.business }

  pub fn labels(&self) -> &Labels { &self.labels }

  // ─── Fetching ──────────────────────────────────────────────────────────

  async fn transactions(&self, query: RecordQuery) -> Result<Vec<Transaction>> {
    let rows = self
      .store
      .transactions(self.business.id, query)
      .await
      .map_err(Error::store)?;
    debug!(count = rows.len(), "loaded transactions");
    Ok(rows)
  }

  async fn expenses(&self, query: RecordQuery) -> Result<Vec<Expense>> {
    let rows = self
      .store
      .expenses(self.business.id, query)
      .await
      .map_err(Error::store)?;
    debug!(count = rows.len(), "loaded expenses");
    Ok(rows)
  }

  // ─── Reports ───────────────────────────────────────────────────────────

  /// Revenue per month, restricted to `year` when given.
  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn monthly_revenue(&self, year: Option<i32>) -> Result<Vec<MonthlyRevenue>> {
    let query = year.map(RecordQuery::year).unwrap_or_default();
    let transactions = self.transactions(query).await?;
    Ok(fold::monthly_revenue(&transactions, year, &self.labels))
  }

  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn expenses_by_category(&self) -> Result<Vec<CategoryShare>> {
    let expenses = self.expenses(RecordQuery::default()).await?;
    Ok(fold::expenses_by_category(&expenses))
  }

  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn payment_methods_distribution(&self) -> Result<Vec<PaymentMethodShare>> {
    let transactions = self.transactions(RecordQuery::default()).await?;
    Ok(fold::payment_methods(&transactions, &self.labels))
  }

  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn top_categories(&self, limit: usize) -> Result<TopCategories> {
    let transactions = self.transactions(RecordQuery::default()).await?;
    let expenses = self.expenses(RecordQuery::default()).await?;
    Ok(fold::top_categories(&transactions, &expenses, limit))
  }

  /// Daily figures for the last `days` days, counted back from today (UTC).
  pub async fn daily_stats(&self, days: i64) -> Result<DailyStats> {
    self.daily_stats_at(days, Utc::now().date_naive()).await
  }

  /// Daily figures for the `days` days before `today`, `today` included.
  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn daily_stats_at(&self, days: i64, today: NaiveDate) -> Result<DailyStats> {
    let start = window_start(today, days);
    let query = RecordQuery::since(start);
    let transactions = self.transactions(query).await?;
    let expenses = self.expenses(query).await?;
    Ok(fold::daily_stats(&transactions, &expenses, start))
  }

  /// Month-by-month comparison of `year` against the year before.
  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn comparative_stats(&self, year: i32) -> Result<ComparativeStats> {
    let current = self.monthly_revenue(Some(year)).await?;
    let previous = self.monthly_revenue(Some(year.saturating_sub(1))).await?;
    Ok(fold::comparative(year, &current, &previous, &self.labels))
  }

  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn cash_flow_analysis(&self) -> Result<CashFlowAnalysis> {
    let transactions = self.transactions(RecordQuery::default()).await?;
    Ok(fold::cash_flow(&transactions))
  }

  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn summary_stats(&self) -> Result<SummaryStats> {
    let transactions = self.transactions(RecordQuery::default()).await?;
    let expenses = self.expenses(RecordQuery::default()).await?;
    Ok(fold::summary(&transactions, &expenses, &self.labels))
  }

  /// Produce the report described by `request`.
  pub async fn run(&self, request: ReportRequest) -> Result<Report> {
    debug!(kind = %request.kind(), business_id = %self.business.id, "running report");
    Ok(match request {
      ReportRequest::MonthlyRevenue { year } => {
        Report::MonthlyRevenue(self.monthly_revenue(year).await?)
      }
      ReportRequest::ExpensesByCategory => {
        Report::ExpensesByCategory(self.expenses_by_category().await?)
      }
      ReportRequest::PaymentMethods => {
        Report::PaymentMethods(self.payment_methods_distribution().await?)
      }
      ReportRequest::TopCategories { limit } => {
        Report::TopCategories(self.top_categories(limit).await?)
      }
      ReportRequest::DailyStats { days } => {
        Report::DailyStats(self.daily_stats(days).await?)
      }
      ReportRequest::Comparative { year } => {
        Report::Comparative(self.comparative_stats(year).await?)
      }
      ReportRequest::CashFlow => Report::CashFlow(self.cash_flow_analysis().await?),
      ReportRequest::Summary => Report::Summary(self.summary_stats().await?),
    })
  }

  /// Every report in one payload, computed from a single read of each table.
  #[instrument(skip(self), fields(business_id = %self.business.id))]
  pub async fn dashboard(&self) -> Result<Dashboard> {
    let transactions = self.transactions(RecordQuery::default()).await?;
    let expenses = self.expenses(RecordQuery::default()).await?;
    let start = window_start(Utc::now().date_naive(), DEFAULT_DAILY_WINDOW);

    Ok(Dashboard {
      business_info:        BusinessInfo::from(&self.business),
      monthly_revenue:      fold::monthly_revenue(&transactions, None, &self.labels),
      expenses_by_category: fold::expenses_by_category(&expenses),
      payment_methods:      fold::payment_methods(&transactions, &self.labels),
      top_categories:       fold::top_categories(
        &transactions,
        &expenses,
        DEFAULT_TOP_LIMIT,
      ),
      daily_stats:          fold::daily_stats(&transactions, &expenses, start),
      cash_flow:            fold::cash_flow(&transactions),
      summary:              fold::summary(&transactions, &expenses, &self.labels),
    })
  }
}
