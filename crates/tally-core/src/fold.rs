//! Pure aggregation over record slices.
//!
//! Each function takes the rows of one business and folds them into a report
//! shape. Accumulators are kept in `BTreeMap`s so iteration order, and
//! therefore output order, never depends on hashing or insertion order.
//!
//! Ratios with a zero denominator are reported as `0`, never as an error.
//! Sums and ratios saturate at the `Decimal` bounds instead of overflowing.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use rust_decimal::Decimal;

use crate::{
  labels::Labels,
  ledger::{Business, Expense, PaymentMethod, Transaction},
  report::{
    Averages, BusinessDetails, CashFlowAnalysis, CashFlowPeriod, CategoryShare,
    CategoryTotal, ComparativeStats, Counts, DailyEntry, DailyStats, DailySummary,
    MonthComparison, MonthlyRevenue, Overview, OverviewTotals, PaymentMethodShare,
    SummaryStats, TopCategories, TopPaymentMethod, Totals,
  },
};

/// Growth rate assigned to a month that had revenue last year and none this
/// year. Months carrying it are left out of the year-over-year average.
pub const FULL_DECLINE: Decimal = Decimal::from_parts(100, 0, 0, true, 0);

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Running sum and row count for one group.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
  total: Decimal,
  count: u64,
}

impl Tally {
  fn add(&mut self, amount: Decimal) {
    self.total = self.total.saturating_add(amount);
    self.count += 1;
  }
}

fn round2(d: Decimal) -> Decimal { d.round_dp(2) }

fn total<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
  amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `part / whole * 100`, clamped to `Decimal::MIN..=Decimal::MAX`.
fn hundredths(part: Decimal, whole: Decimal) -> Decimal {
  match part.checked_div(whole) {
    Some(ratio) => ratio.saturating_mul(Decimal::ONE_HUNDRED),
    None if part.is_sign_negative() != whole.is_sign_negative() => Decimal::MIN,
    None => Decimal::MAX,
  }
}

/// `part / whole * 100`, rounded to two places; `0` when `whole` is not
/// positive.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
  if whole > Decimal::ZERO { round2(hundredths(part, whole)) } else { Decimal::ZERO }
}

/// `total / count`, rounded to two places; `0` for an empty group.
fn average(total: Decimal, count: u64) -> Decimal {
  if count == 0 { Decimal::ZERO } else { round2(total / Decimal::from(count)) }
}

fn group_by_category<'a, I>(rows: I) -> BTreeMap<&'a str, Tally>
where
  I: IntoIterator<Item = (&'a str, Decimal)>,
{
  let mut groups: BTreeMap<&str, Tally> = BTreeMap::new();
  for (category, amount) in rows {
    groups.entry(category).or_default().add(amount);
  }
  groups
}

/// Groups sorted by total descending. The sort is stable, so ties keep the
/// map's ascending key order.
fn by_total_desc<'a>(groups: BTreeMap<&'a str, Tally>) -> Vec<(&'a str, Tally)> {
  let mut v: Vec<_> = groups.into_iter().collect();
  v.sort_by(|a, b| b.1.total.cmp(&a.1.total));
  v
}

// ─── Monthly revenue ─────────────────────────────────────────────────────────

/// Revenue per calendar month, optionally restricted to one year. Only
/// months with at least one transaction are emitted, ascending.
pub fn monthly_revenue(
  transactions: &[Transaction],
  year: Option<i32>,
  labels: &Labels,
) -> Vec<MonthlyRevenue> {
  let mut months: BTreeMap<u32, Tally> = BTreeMap::new();
  for t in transactions {
    if year.is_some_and(|y| t.created_at.year() != y) {
      continue;
    }
    months.entry(t.created_at.month()).or_default().add(t.amount);
  }

  months
    .into_iter()
    .map(|(month_num, tally)| MonthlyRevenue {
      month_num,
      month_name: labels.month_name(month_num).to_owned(),
      total: tally.total,
      transaction_count: tally.count,
    })
    .collect()
}

// ─── Shares ──────────────────────────────────────────────────────────────────

pub fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryShare> {
  let groups = group_by_category(expenses.iter().map(|e| (e.category.as_str(), e.amount)));
  let grand = total(groups.values().map(|t| t.total));

  by_total_desc(groups)
    .into_iter()
    .map(|(category, tally)| CategoryShare {
      category:   category.to_owned(),
      total:      tally.total,
      count:      tally.count,
      percentage: percentage(tally.total, grand),
    })
    .collect()
}

/// Revenue per payment-method code, in code order.
pub fn payment_methods(
  transactions: &[Transaction],
  labels: &Labels,
) -> Vec<PaymentMethodShare> {
  let mut methods: BTreeMap<&str, Tally> = BTreeMap::new();
  for t in transactions {
    methods.entry(t.payment_method.as_str()).or_default().add(t.amount);
  }
  let grand = total(methods.values().map(|t| t.total));

  methods
    .into_iter()
    .map(|(method, tally)| PaymentMethodShare {
      method:      method.to_owned(),
      method_name: labels.payment_method_name(method).to_owned(),
      total:       tally.total,
      count:       tally.count,
      percentage:  percentage(tally.total, grand),
    })
    .collect()
}

// ─── Top categories ──────────────────────────────────────────────────────────

fn top<'a, I>(rows: I, limit: usize) -> Vec<CategoryTotal>
where
  I: IntoIterator<Item = (&'a str, Decimal)>,
{
  by_total_desc(group_by_category(rows))
    .into_iter()
    .take(limit)
    .map(|(category, tally)| CategoryTotal {
      category: category.to_owned(),
      total:    tally.total,
      count:    tally.count,
    })
    .collect()
}

pub fn top_categories(
  transactions: &[Transaction],
  expenses: &[Expense],
  limit: usize,
) -> TopCategories {
  TopCategories {
    top_sales_categories:   top(
      transactions.iter().map(|t| (t.category.as_str(), t.amount)),
      limit,
    ),
    top_expense_categories: top(
      expenses.iter().map(|e| (e.category.as_str(), e.amount)),
      limit,
    ),
  }
}

// ─── Daily stats ─────────────────────────────────────────────────────────────

/// Per-day revenue and spend for every date on or after `start`.
///
/// A date that only has revenue (or only spend) gets zeros on the other
/// side. `days_count` counts the dates with activity.
pub fn daily_stats(
  transactions: &[Transaction],
  expenses: &[Expense],
  start: NaiveDate,
) -> DailyStats {
  let mut days: BTreeMap<NaiveDate, (Tally, Tally)> = BTreeMap::new();

  for t in transactions {
    let date = t.created_at.date_naive();
    if date >= start {
      days.entry(date).or_default().0.add(t.amount);
    }
  }
  for e in expenses {
    let date = e.created_at.date_naive();
    if date >= start {
      days.entry(date).or_default().1.add(e.amount);
    }
  }

  let daily_data: Vec<DailyEntry> = days
    .into_iter()
    .map(|(date, (revenue, spend))| DailyEntry {
      date,
      revenue: revenue.total,
      transactions: revenue.count,
      expenses: spend.total,
      expense_count: spend.count,
      profit: revenue.total.saturating_sub(spend.total),
    })
    .collect();

  let summary = daily_summary(&daily_data);
  DailyStats { daily_data, summary }
}

fn daily_summary(days: &[DailyEntry]) -> DailySummary {
  let total_revenue = total(days.iter().map(|d| d.revenue));
  let total_expenses = total(days.iter().map(|d| d.expenses));
  let total_profit = total_revenue.saturating_sub(total_expenses);
  let days_count = days.len() as u64;

  DailySummary {
    total_revenue,
    total_expenses,
    total_profit,
    profit_margin: percentage(total_profit, total_revenue),
    avg_daily_revenue: average(total_revenue, days_count),
    days_count,
  }
}

// ─── Comparative ─────────────────────────────────────────────────────────────

/// Compare two monthly-revenue series month by month.
///
/// Months present in `current` get `(cur - prev) / prev * 100` (or `0` when
/// the previous year had nothing). The remaining months are backfilled with
/// a zero current total and [`FULL_DECLINE`] if the previous year had
/// revenue, `0` otherwise. The output always has twelve entries in calendar
/// order.
pub fn comparative(
  year: i32,
  current: &[MonthlyRevenue],
  previous: &[MonthlyRevenue],
  labels: &Labels,
) -> ComparativeStats {
  let previous_total = |month_num: u32| {
    previous
      .iter()
      .find(|p| p.month_num == month_num)
      .map_or(Decimal::ZERO, |p| p.total)
  };

  let mut months: BTreeMap<u32, MonthComparison> = BTreeMap::new();

  for cur in current {
    let prev = previous_total(cur.month_num);
    let growth_rate = if prev > Decimal::ZERO {
      round2(hundredths(cur.total.saturating_sub(prev), prev))
    } else {
      Decimal::ZERO
    };
    months.insert(cur.month_num, MonthComparison {
      month: cur.month_name.clone(),
      current_year: cur.total,
      previous_year: prev,
      growth_rate,
    });
  }

  for month_num in 1..=12 {
    months.entry(month_num).or_insert_with(|| {
      let prev = previous_total(month_num);
      MonthComparison {
        month:         labels.month_name(month_num).to_owned(),
        current_year:  Decimal::ZERO,
        previous_year: prev,
        growth_rate:   if prev > Decimal::ZERO { FULL_DECLINE } else { Decimal::ZERO },
      }
    });
  }

  let monthly_comparison: Vec<MonthComparison> = months.into_values().collect();

  let counted: Vec<Decimal> = monthly_comparison
    .iter()
    .map(|m| m.growth_rate)
    .filter(|rate| *rate != FULL_DECLINE)
    .collect();
  let year_over_year_growth =
    average(total(counted.iter().copied()), counted.len() as u64);

  ComparativeStats {
    year,
    previous_year: year.saturating_sub(1),
    monthly_comparison,
    year_over_year_growth,
  }
}

// ─── Cash flow ───────────────────────────────────────────────────────────────

/// Revenue per `(year, month)` split into payment-method buckets,
/// chronological.
pub fn cash_flow(transactions: &[Transaction]) -> CashFlowAnalysis {
  #[derive(Default)]
  struct Buckets {
    cash:          Decimal,
    mobile_money:  Decimal,
    card:          Decimal,
    bank_transfer: Decimal,
    other:         Decimal,
    total:         Decimal,
  }

  let mut periods: BTreeMap<(i32, u32), Buckets> = BTreeMap::new();
  for t in transactions {
    let b = periods
      .entry((t.created_at.year(), t.created_at.month()))
      .or_default();
    let bucket = match t.method() {
      Some(PaymentMethod::Cash) => &mut b.cash,
      Some(PaymentMethod::MobileMoney) => &mut b.mobile_money,
      Some(PaymentMethod::Card) => &mut b.card,
      Some(PaymentMethod::BankTransfer) => &mut b.bank_transfer,
      None => &mut b.other,
    };
    *bucket = bucket.saturating_add(t.amount);
    b.total = b.total.saturating_add(t.amount);
  }

  CashFlowAnalysis {
    monthly_breakdown: periods
      .into_iter()
      .map(|((year, month), b)| CashFlowPeriod {
        period:        format!("{year}-{month:02}"),
        cash:          b.cash,
        mobile_money:  b.mobile_money,
        card:          b.card,
        bank_transfer: b.bank_transfer,
        other:         b.other,
        total:         b.total,
      })
      .collect(),
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

pub fn summary(
  transactions: &[Transaction],
  expenses: &[Expense],
  labels: &Labels,
) -> SummaryStats {
  let revenue = total(transactions.iter().map(|t| t.amount));
  let spend = total(expenses.iter().map(|e| e.amount));
  let profit = revenue.saturating_sub(spend);
  let counts = Counts {
    transactions: transactions.len() as u64,
    expenses:     expenses.len() as u64,
  };

  let mut by_method: BTreeMap<&str, u64> = BTreeMap::new();
  for t in transactions {
    *by_method.entry(t.payment_method.as_str()).or_default() += 1;
  }
  // strictly-greater keeps the smallest code on ties
  let top_payment_method = by_method
    .into_iter()
    .fold(None::<(&str, u64)>, |best, (method, count)| match best {
      Some((_, best_count)) if best_count >= count => best,
      _ => Some((method, count)),
    })
    .map(|(method, count)| TopPaymentMethod {
      method: method.to_owned(),
      method_name: labels.payment_method_name(method).to_owned(),
      count,
    });

  SummaryStats {
    totals: Totals {
      revenue,
      expenses: spend,
      profit,
      profit_margin: percentage(profit, revenue),
    },
    counts,
    averages: Averages {
      transaction: average(revenue, counts.transactions),
      expense:     average(spend, counts.expenses),
    },
    top_payment_method,
  }
}

/// Lifetime counts and totals attached to a business listing.
pub fn business_details(
  business: Business,
  transactions: &[Transaction],
  expenses: &[Expense],
) -> BusinessDetails {
  BusinessDetails {
    business,
    transactions_count: transactions.len() as u64,
    expenses_count: expenses.len() as u64,
    total_revenue: total(transactions.iter().map(|t| t.amount)),
    total_expenses: total(expenses.iter().map(|e| e.amount)),
  }
}

// ─── Overview ────────────────────────────────────────────────────────────────

/// Fold records drawn from any number of businesses into one [`Overview`].
pub fn overview(transactions: &[Transaction], expenses: &[Expense]) -> Overview {
  let total_revenue = total(transactions.iter().map(|t| t.amount));
  let total_expenses = total(expenses.iter().map(|e| e.amount));
  let net_profit = total_revenue.saturating_sub(total_expenses);

  let mut cash_flow_by_method: BTreeMap<String, Decimal> = BTreeMap::new();
  for t in transactions {
    let sum = cash_flow_by_method.entry(t.payment_method.clone()).or_default();
    *sum = sum.saturating_add(t.amount);
  }
  let mut expenses_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
  for e in expenses {
    let sum = expenses_by_category.entry(e.category.clone()).or_default();
    *sum = sum.saturating_add(e.amount);
  }

  Overview {
    summary: OverviewTotals {
      total_revenue,
      total_expenses,
      net_profit,
      profit_margin: percentage(net_profit, total_revenue),
    },
    cash_flow_by_method,
    expenses_by_category,
    counts: Counts {
      transactions: transactions.len() as u64,
      expenses:     expenses.len() as u64,
    },
  }
}
