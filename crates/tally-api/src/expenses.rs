//! Handlers for `/expenses` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/expenses` | Optional `?business_id`; otherwise every owned business |
//! | `POST` | `/expenses` | Body: [`NewExpense`]; 403 if the business is not owned |
//! | `GET`  | `/expenses/:id` | 404 unless the record's business is owned |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  analytics::authorize,
  ledger::{Expense, NewExpense},
  store::{LedgerStore, RecordQuery},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError, transactions::check_amount};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub business_id: Option<Uuid>,
}

/// `GET /expenses[?business_id=<id>]`
pub async fn list<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Expense>>, ApiError> {
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
        .expenses(id, RecordQuery::default())
        .await
        .map_err(ApiError::store)?,
    );
  }
  rows.sort_by_key(|e| e.created_at);
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /expenses`
pub async fn create<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(mut body): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
  check_amount(body.amount)?;
  body.category = body.category.trim().to_owned();
  if body.category.is_empty() {
    return Err(ApiError::BadRequest("category must not be empty".into()));
  }

  authorize(state.store.as_ref(), body.business_id, user.id).await?;

  let expense = state
    .store
    .record_expense(body)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(expense_id = %expense.id, business_id = %expense.business_id, "recorded expense");
  Ok((StatusCode::CREATED, Json(expense)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /expenses/:id`
pub async fn get_one<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ApiError> {
  let not_found = || ApiError::NotFound(format!("expense {id} not found"));
  let store = state.store.as_ref();

  let expense = store
    .get_expense(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  authorize(store, expense.business_id, user.id)
    .await
    .map_err(|e| match e {
      tally_core::Error::Unauthorized(_) => not_found(),
      other => other.into(),
    })?;
  Ok(Json(expense))
}
