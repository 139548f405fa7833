//! Handlers for `/transactions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/transactions` | Optional `?business_id`; otherwise every owned business |
//! | `POST` | `/transactions` | Body: [`NewTransaction`]; 403 if the business is not owned |
//! | `GET`  | `/transactions/:id` | 404 unless the record's business is owned |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::{
  analytics::authorize,
  ledger::{NewTransaction, PaymentMethod, Transaction},
  store::{LedgerStore, RecordQuery},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub business_id: Option<Uuid>,
}

/// `GET /transactions[?business_id=<id>]`
pub async fn list<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
  let store = state.store.as_ref();

  let business_ids = match params.business_id {
    Some(id) => vec![authorize(store, id, user.id).await?.id],
    None => store
      .list_businesses(user.id)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .map(|b| b.id)
      .collect(),
  };

  let mut rows = Vec::new();
  for id in business_ids {
    rows.extend(
      store
        .transactions(id, RecordQuery::default())
        .await
        .map_err(ApiError::store)?,
    );
  }
  rows.sort_by_key(|t| t.created_at);
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Largest amount, in whole currency units, a single record may carry.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Most decimal places a record amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Reject amounts that are negative, above [`MAX_AMOUNT`], or finer than
/// [`AMOUNT_SCALE`] places.
pub(crate) fn check_amount(amount: Decimal) -> Result<(), ApiError> {
  if amount < Decimal::ZERO {
    return Err(ApiError::BadRequest("amount must not be negative".into()));
  }
  if amount > Decimal::from(MAX_AMOUNT) {
    return Err(ApiError::BadRequest(format!("amount must not exceed {MAX_AMOUNT}")));
  }
  if amount.normalize().scale() > AMOUNT_SCALE {
    return Err(ApiError::BadRequest(format!(
      "amount must have at most {AMOUNT_SCALE} decimal places"
    )));
  }
  Ok(())
}

/// `POST /transactions`
pub async fn create<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(mut body): Json<NewTransaction>,
) -> Result<impl IntoResponse, ApiError> {
  check_amount(body.amount)?;
  body.category = body.category.trim().to_owned();
  if body.category.is_empty() {
    return Err(ApiError::BadRequest("category must not be empty".into()));
  }
  if PaymentMethod::from_code(&body.payment_method).is_none() {
    return Err(ApiError::BadRequest(format!(
      "unknown payment method {:?}",
      body.payment_method
    )));
  }

  authorize(state.store.as_ref(), body.business_id, user.id).await?;

  let tx = state
    .store
    .record_transaction(body)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(transaction_id = %tx.id, business_id = %tx.business_id, "recorded transaction");
  Ok((StatusCode::CREATED, Json(tx)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /transactions/:id`
pub async fn get_one<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
  let not_found = || ApiError::NotFound(format!("transaction {id} not found"));
  let store = state.store.as_ref();

  let tx = store
    .get_transaction(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  authorize(store, tx.business_id, user.id)
    .await
    .map_err(|e| match e {
      tally_core::Error::Unauthorized(_) => not_found(),
      other => other.into(),
    })?;
  Ok(Json(tx))
}
