//! Handlers for `/businesses` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/businesses` | Businesses owned by the caller |
//! | `POST`   | `/businesses` | Body: [`NewBusiness`]; 409 past the per-user cap |
//! | `GET`    | `/businesses/:id` | Business with lifetime totals; 404 if not owned |
//! | `DELETE` | `/businesses/:id` | Cascades to records; 404 if not owned |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use tally_core::{
  analytics::{authorize, business_details},
  ledger::{Business, NewBusiness},
  report::BusinessDetails,
  store::LedgerStore,
};
use uuid::Uuid;

use crate::{AppState, MAX_BUSINESSES_PER_USER, auth::CurrentUser, error::ApiError};

/// Resolve a business the caller owns. Anything else is reported as missing.
async fn owned<S: LedgerStore>(
  state: &AppState<S>,
  id: Uuid,
  user: &CurrentUser,
) -> Result<Business, ApiError> {
  authorize(state.store.as_ref(), id, user.0.id)
    .await
    .map_err(|e| match e {
      tally_core::Error::Unauthorized(_) => {
        ApiError::NotFound(format!("business {id} not found"))
      }
      other => other.into(),
    })
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /businesses`
pub async fn list<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Business>>, ApiError> {
  let businesses = state
    .store
    .list_businesses(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(businesses))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /businesses`
pub async fn create<S: LedgerStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(mut body): Json<NewBusiness>,
) -> Result<impl IntoResponse, ApiError> {
  body.name = body.name.trim().to_owned();
  if body.name.is_empty() {
    return Err(ApiError::BadRequest("business name must not be empty".into()));
  }
  if body.currency.trim().is_empty() {
    return Err(ApiError::BadRequest("currency must not be empty".into()));
  }

  let _guard = state.business_writes.lock().await;
  let owned = state
    .store
    .list_businesses(user.id)
    .await
    .map_err(ApiError::store)?;
  if owned.len() >= MAX_BUSINESSES_PER_USER {
    return Err(ApiError::Conflict(format!(
      "a user may own at most {MAX_BUSINESSES_PER_USER} businesses"
    )));
  }

  let business = state
    .store
    .create_business(user.id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(business_id = %business.id, owner_id = %user.id, "created business");
  Ok((StatusCode::CREATED, Json(business)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /businesses/:id`
pub async fn get_one<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<BusinessDetails>, ApiError> {
  let business = owned(&state, id, &user).await?;
  let details = business_details(state.store.as_ref(), business).await?;
  Ok(Json(details))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /businesses/:id`
pub async fn delete_one<S: LedgerStore>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  owned(&state, id, &user).await?;
  state
    .store
    .delete_business(id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(business_id = %id, "deleted business");
  Ok(StatusCode::NO_CONTENT)
}
