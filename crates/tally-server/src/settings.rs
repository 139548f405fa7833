//! Server configuration: a TOML file layered with `TALLY_*` environment
//! variables.
//!
//! ```toml
//! host       = "0.0.0.0"
//! port       = 8000
//! store_path = "~/.local/share/tally/ledger.sqlite"
//! cors       = true
//!
//! [labels.payment_methods]
//! cash = "Cash"
//! ```
//!
//! Environment keys use `_` after the prefix and `__` between nested keys,
//! e.g. `TALLY_PORT` or `TALLY_LABELS__PAYMENT_METHODS__CASH`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use tally_core::labels::Labels;

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Answer cross-origin requests from any origin.
  pub cors:       bool,
  /// Display labels for month and payment-method names.
  pub labels:     Labels,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       8000,
      store_path: PathBuf::from("tally.sqlite"),
      cors:       false,
      labels:     Labels::default(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and apply `TALLY_*` overrides on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(environment()),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    let mut cfg: ServerConfig = builder
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn environment() -> config::Environment {
  config::Environment::with_prefix("TALLY")
    .prefix_separator("_")
    .separator("__")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    ServerConfig::from_builder(
      config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert_eq!(cfg.labels, Labels::default());
  }

  #[test]
  fn labels_can_be_overridden() {
    let cfg = parse(
      r#"
        port = 9000

        [labels.payment_methods]
        cash = "Cash"
        mobile_money = "Mobile"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.labels.payment_method_name("cash"), "Cash");
    assert_eq!(cfg.labels.month_name(1), "Janvier");
  }

  #[test]
  fn environment_overrides_file() {
    let vars = [
      ("TALLY_PORT", "9123"),
      ("TALLY_CORS", "true"),
      ("TALLY_LABELS__PAYMENT_METHODS__CASH", "Liquide"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let cfg = ServerConfig::from_builder(
      config::Config::builder()
        .add_source(File::from_str("port = 9000", FileFormat::Toml))
        .add_source(environment().source(Some(vars))),
    )
    .unwrap();
    assert_eq!(cfg.port, 9123);
    assert!(cfg.cors);
    assert_eq!(cfg.labels.payment_method_name("cash"), "Liquide");
    assert_eq!(cfg.labels.month_name(1), "Janvier");
  }

  #[test]
  fn double_underscore_prefix_is_not_read() {
    let vars = [("TALLY__PORT".to_owned(), "9123".to_owned())].into_iter().collect();
    let cfg = ServerConfig::from_builder(
      config::Config::builder().add_source(environment().source(Some(vars))),
    )
    .unwrap();
    assert_eq!(cfg.port, 8000);
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    let cfg = parse(r#"store_path = "~/ledger.sqlite""#);
    assert_eq!(cfg.store_path, PathBuf::from(home).join("ledger.sqlite"));
  }
}
