//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that string comparison in SQL orders them chronologically.
//! Amounts are stored as decimal strings. UUIDs are stored as hyphenated
//! lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tally_core::ledger::{Business, Expense, Transaction, User};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_amount(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_amount(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, password_hash, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const BUSINESS_COLUMNS: &str = "business_id, name, sector, currency, owner_id";

/// Raw strings read directly from a `businesses` row.
pub struct RawBusiness {
  pub business_id: String,
  pub name:        String,
  pub sector:      Option<String>,
  pub currency:    String,
  pub owner_id:    String,
}

impl RawBusiness {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      business_id: row.get(0)?,
      name:        row.get(1)?,
      sector:      row.get(2)?,
      currency:    row.get(3)?,
      owner_id:    row.get(4)?,
    })
  }

  pub fn into_business(self) -> Result<Business> {
    Ok(Business {
      id:       decode_uuid(&self.business_id)?,
      name:     self.name,
      sector:   self.sector,
      currency: self.currency,
      owner_id: decode_uuid(&self.owner_id)?,
    })
  }
}

pub const TRANSACTION_COLUMNS: &str =
  "transaction_id, business_id, amount, payment_method, category, description, created_at";

/// Raw strings read directly from a `transactions` row.
pub struct RawTransaction {
  pub transaction_id: String,
  pub business_id:    String,
  pub amount:         String,
  pub payment_method: String,
  pub category:       String,
  pub description:    Option<String>,
  pub created_at:     String,
}

impl RawTransaction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transaction_id: row.get(0)?,
      business_id:    row.get(1)?,
      amount:         row.get(2)?,
      payment_method: row.get(3)?,
      category:       row.get(4)?,
      description:    row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction {
      id:             decode_uuid(&self.transaction_id)?,
      business_id:    decode_uuid(&self.business_id)?,
      amount:         decode_amount(&self.amount)?,
      payment_method: self.payment_method,
      category:       self.category,
      description:    self.description,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const EXPENSE_COLUMNS: &str =
  "expense_id, business_id, amount, category, description, created_at";

/// Raw strings read directly from an `expenses` row.
pub struct RawExpense {
  pub expense_id:  String,
  pub business_id: String,
  pub amount:      String,
  pub category:    String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawExpense {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      expense_id:  row.get(0)?,
      business_id: row.get(1)?,
      amount:      row.get(2)?,
      category:    row.get(3)?,
      description: row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_expense(self) -> Result<Expense> {
    Ok(Expense {
      id:          decode_uuid(&self.expense_id)?,
      business_id: decode_uuid(&self.business_id)?,
      amount:      decode_amount(&self.amount)?,
      category:    self.category,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
