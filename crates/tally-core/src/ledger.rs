//! Ledger entities: users, the businesses they own, and the revenue and
//! expense records each business accrues.
//!
//! Records are append-only. Nothing here is ever updated in place; rows only
//! disappear when their owning business (or its owner) is deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Currency assigned to a business when none is given.
pub const DEFAULT_CURRENCY: &str = "FCFA";

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:            Uuid,
  pub email:         String,
  /// argon2 PHC string. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

// ─── Businesses ──────────────────────────────────────────────────────────────

/// A tenant unit. Every transaction and expense belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
  pub id:       Uuid,
  pub name:     String,
  pub sector:   Option<String>,
  pub currency: String,
  pub owner_id: Uuid,
}

impl Business {
  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.owner_id == user_id }
}

fn default_currency() -> String { DEFAULT_CURRENCY.to_owned() }

/// Input for creating a business; the owner comes from the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusiness {
  pub name:     String,
  #[serde(default)]
  pub sector:   Option<String>,
  #[serde(default = "default_currency")]
  pub currency: String,
}

impl NewBusiness {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), sector: None, currency: default_currency() }
  }
}

// ─── Payment methods ─────────────────────────────────────────────────────────

/// The payment methods the cash-flow report knows how to bucket.
///
/// Transactions store the raw code string, so a row may carry a code that
/// does not parse into this enum.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
  Cash,
  MobileMoney,
  Card,
  BankTransfer,
}

impl PaymentMethod {
  /// Parse a stored code; `None` for anything outside the four known methods.
  pub fn from_code(code: &str) -> Option<Self> { code.parse().ok() }

  pub fn code(self) -> &'static str { self.into() }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// A revenue event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
  pub id:             Uuid,
  pub business_id:    Uuid,
  pub amount:         Decimal,
  pub payment_method: String,
  pub category:       String,
  pub description:    Option<String>,
  pub created_at:     DateTime<Utc>,
}

impl Transaction {
  pub fn method(&self) -> Option<PaymentMethod> {
    PaymentMethod::from_code(&self.payment_method)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
  pub business_id:    Uuid,
  pub amount:         Decimal,
  pub payment_method: String,
  pub category:       String,
  #[serde(default)]
  pub description:    Option<String>,
  /// Backdating is only honoured for imports and tests; the API layer leaves
  /// this empty so the store stamps the current time.
  #[serde(default, skip_deserializing)]
  pub created_at:     Option<DateTime<Utc>>,
}

impl NewTransaction {
  pub fn new(
    business_id: Uuid,
    amount: Decimal,
    payment_method: impl Into<String>,
    category: impl Into<String>,
  ) -> Self {
    Self {
      business_id,
      amount,
      payment_method: payment_method.into(),
      category: category.into(),
      description: None,
      created_at: None,
    }
  }

  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }
}

// ─── Expenses ────────────────────────────────────────────────────────────────

/// An outflow event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
  pub id:          Uuid,
  pub business_id: Uuid,
  pub amount:      Decimal,
  pub category:    String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
  pub business_id: Uuid,
  pub amount:      Decimal,
  pub category:    String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default, skip_deserializing)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl NewExpense {
  pub fn new(business_id: Uuid, amount: Decimal, category: impl Into<String>) -> Self {
    Self {
      business_id,
      amount,
      category: category.into(),
      description: None,
      created_at: None,
    }
  }

  pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = Some(created_at);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payment_method_codes_are_snake_case() {
    use strum::IntoEnumIterator;
    for m in PaymentMethod::iter() {
      assert_eq!(m.to_string(), m.code());
      assert_eq!(PaymentMethod::from_code(m.code()), Some(m));
    }
    assert_eq!(PaymentMethod::MobileMoney.code(), "mobile_money");
    assert_eq!(PaymentMethod::from_code("crypto"), None);
  }

  #[test]
  fn new_business_defaults_currency() {
    let b: NewBusiness = serde_json::from_str(r#"{"name":"Boutique"}"#).unwrap();
    assert_eq!(b.currency, DEFAULT_CURRENCY);
    assert!(b.sector.is_none());
  }

  #[test]
  fn new_transaction_ignores_client_supplied_timestamp() {
    let t: NewTransaction = serde_json::from_str(
      r#"{
        "business_id": "7f1d3c3e-8a7e-4bb8-9d7e-2f1a4c0b5e11",
        "amount": 1500,
        "payment_method": "cash",
        "category": "Vente",
        "created_at": "2020-01-01T00:00:00Z"
      }"#,
    )
    .unwrap();
    assert!(t.created_at.is_none());
    assert_eq!(t.amount, Decimal::from(1500));
  }

  #[test]
  fn user_hash_is_not_serialised() {
    let u = User {
      id:            Uuid::new_v4(),
      email:         "a@example.com".into(),
      password_hash: "$argon2id$secret".into(),
      created_at:    Utc::now(),
    };
    let json = serde_json::to_string(&u).unwrap();
    assert!(!json.contains("argon2"));
  }
}
