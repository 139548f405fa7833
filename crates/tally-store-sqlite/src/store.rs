//! [`SqliteStore`], the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tally_core::{
  ledger::{
    Business, Expense, NewBusiness, NewExpense, NewTransaction, Transaction, User,
  },
  store::{LedgerStore, RecordQuery},
};

use crate::{
  Error, Result,
  encode::{
    BUSINESS_COLUMNS, EXPENSE_COLUMNS, RawBusiness, RawExpense, RawTransaction,
    RawUser, TRANSACTION_COLUMNS, USER_COLUMNS, encode_amount, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete the row with `id` from `table`; `true` if a row went away.
  async fn delete_by_id(
    &self,
    table: &'static str,
    key: &'static str,
    id: Uuid,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE {key} = ?1"),
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}

/// `created_at` window filter shared by the record queries. `?1` is the
/// business id, `?2` and `?3` the optional bounds.
const WINDOW_FILTER: &str = "business_id = ?1
   AND (?2 IS NULL OR created_at >= ?2)
   AND (?3 IS NULL OR created_at < ?3)
   ORDER BY created_at, rowid";

fn encode_window(query: RecordQuery) -> (Option<String>, Option<String>) {
  (query.from.map(encode_dt), query.until.map(encode_dt))
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, email: String, password_hash: String) -> Result<User> {
    let user = User {
      id: Uuid::new_v4(),
      email,
      password_hash,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(user.id);
    let email_str = user.email.clone();
    let hash_str  = user.password_hash.clone();
    let at_str    = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, hash_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateEmail(user.email));
    }
    tracing::debug!(user_id = %user.id, "created user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("users", "user_id", id).await
  }

  // ── Businesses ────────────────────────────────────────────────────────────

  async fn create_business(&self, owner_id: Uuid, input: NewBusiness) -> Result<Business> {
    let business = Business {
      id: Uuid::new_v4(),
      name: input.name,
      sector: input.sector,
      currency: input.currency,
      owner_id,
    };

    let id_str       = encode_uuid(business.id);
    let name         = business.name.clone();
    let sector       = business.sector.clone();
    let currency     = business.currency.clone();
    let owner_id_str = encode_uuid(owner_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO businesses (business_id, name, sector, currency, owner_id)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, sector, currency, owner_id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(business)
  }

  async fn get_business(&self, id: Uuid) -> Result<Option<Business>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBusiness> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE business_id = ?1"),
            rusqlite::params![id_str],
            RawBusiness::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBusiness::into_business).transpose()
  }

  async fn list_businesses(&self, owner_id: Uuid) -> Result<Vec<Business>> {
    let owner_id_str = encode_uuid(owner_id);

    let raws: Vec<RawBusiness> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE owner_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id_str], RawBusiness::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBusiness::into_business).collect()
  }

  async fn delete_business(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("businesses", "business_id", id).await
  }

  // ── Records (append-only) ──────────────────────────────────────────

  async fn record_transaction(&self, input: NewTransaction) -> Result<Transaction> {
    let tx = Transaction {
      id:             Uuid::new_v4(),
      business_id:    input.business_id,
      amount:         input.amount,
      payment_method: input.payment_method,
      category:       input.category,
      description:    input.description,
      created_at:     input.created_at.unwrap_or_else(Utc::now),
    };

    let id_str          = encode_uuid(tx.id);
    let business_id_str = encode_uuid(tx.business_id);
    let amount_str      = encode_amount(tx.amount);
    let method          = tx.payment_method.clone();
    let category        = tx.category.clone();
    let description     = tx.description.clone();
    let at_str          = encode_dt(tx.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        if !business_exists(conn, &business_id_str)? {
          return Ok(false);
        }
        conn.execute(
          &format!(
            "INSERT INTO transactions ({TRANSACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            id_str,
            business_id_str,
            amount_str,
            method,
            category,
            description,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::NotFound(tx.business_id));
    }
    Ok(tx)
  }

  async fn record_expense(&self, input: NewExpense) -> Result<Expense> {
    let expense = Expense {
      id:          Uuid::new_v4(),
      business_id: input.business_id,
      amount:      input.amount,
      category:    input.category,
      description: input.description,
      created_at:  input.created_at.unwrap_or_else(Utc::now),
    };

    let id_str          = encode_uuid(expense.id);
    let business_id_str = encode_uuid(expense.business_id);
    let amount_str      = encode_amount(expense.amount);
    let category        = expense.category.clone();
    let description     = expense.description.clone();
    let at_str          = encode_dt(expense.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        if !business_exists(conn, &business_id_str)? {
          return Ok(false);
        }
        conn.execute(
          &format!(
            "INSERT INTO expenses ({EXPENSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ),
          rusqlite::params![
            id_str,
            business_id_str,
            amount_str,
            category,
            description,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::NotFound(expense.business_id));
    }
    Ok(expense)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTransaction> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = ?1"
            ),
            rusqlite::params![id_str],
            RawTransaction::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTransaction::into_transaction).transpose()
  }

  async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawExpense> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE expense_id = ?1"),
            rusqlite::params![id_str],
            RawExpense::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawExpense::into_expense).transpose()
  }

  async fn transactions(
    &self,
    business_id: Uuid,
    query: RecordQuery,
  ) -> Result<Vec<Transaction>> {
    let business_id_str = encode_uuid(business_id);
    let (from, until) = encode_window(query);

    let raws: Vec<RawTransaction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {WINDOW_FILTER}"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![business_id_str, from, until],
            RawTransaction::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransaction::into_transaction).collect()
  }

  async fn expenses(&self, business_id: Uuid, query: RecordQuery) -> Result<Vec<Expense>> {
    let business_id_str = encode_uuid(business_id);
    let (from, until) = encode_window(query);

    let raws: Vec<RawExpense> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE {WINDOW_FILTER}"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![business_id_str, from, until],
            RawExpense::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExpense::into_expense).collect()
  }
}

fn business_exists(conn: &rusqlite::Connection, business_id: &str) -> rusqlite::Result<bool> {
  Ok(conn
    .query_row(
      "SELECT 1 FROM businesses WHERE business_id = ?1",
      rusqlite::params![business_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false))
}
