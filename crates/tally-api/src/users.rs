//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/register` | Body: `{"email":"…","password":"…"}`; no auth |
//! | `GET`  | `/users/me` | The authenticated caller |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tally_core::{ledger::User, store::LedgerStore};

use crate::{
  AppState,
  auth::{CurrentUser, hash_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub password: String,
}

/// `POST /users/register`
pub async fn register<S: LedgerStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let email = body.email.trim().to_owned();
  if email.is_empty() || !email.contains('@') {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let existing = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("email {email} is already registered")));
  }

  let hash = hash_password(&body.password)?;
  let user = state
    .store
    .create_user(email, hash)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %user.id, "registered user");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }
