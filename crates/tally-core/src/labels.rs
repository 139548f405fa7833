//! Display labels used by the reports: month names and payment-method names.
//!
//! A [`Labels`] value is handed to the engine at construction and never
//! mutated afterwards. The default table is French, which is what the
//! front-end ships with; deployments can override it from configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::ledger::PaymentMethod;

const MONTHS_FR: [&str; 12] = [
  "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août",
  "Septembre", "Octobre", "Novembre", "Décembre",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
  /// January first.
  pub month_names:     [String; 12],
  /// Payment-method code → display name.
  pub payment_methods: BTreeMap<String, String>,
}

impl Default for Labels {
  fn default() -> Self {
    Self {
      month_names:     MONTHS_FR.map(str::to_owned),
      payment_methods: PaymentMethod::iter()
        .map(|m| (m.code().to_owned(), french_method_name(m).to_owned()))
        .collect(),
    }
  }
}

fn french_method_name(m: PaymentMethod) -> &'static str {
  match m {
    PaymentMethod::Cash => "Espèces",
    PaymentMethod::MobileMoney => "Mobile Money",
    PaymentMethod::Card => "Carte bancaire",
    PaymentMethod::BankTransfer => "Virement",
  }
}

impl Labels {
  /// Label for a 1-based month number. Out-of-range months yield `""`.
  pub fn month_name(&self, month: u32) -> &str {
    month
      .checked_sub(1)
      .and_then(|i| self.month_names.get(i as usize))
      .map(String::as_str)
      .unwrap_or_default()
  }

  /// Display name for a payment-method code, falling back to the code itself.
  pub fn payment_method_name<'a>(&'a self, code: &'a str) -> &'a str {
    self.payment_methods.get(code).map(String::as_str).unwrap_or(code)
  }
}
