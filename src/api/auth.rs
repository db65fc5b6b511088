//! Account endpoints: register, login, current user.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::error::ApiError,
    auth::{hash_password, issue_token, verify_password, AuthBearer},
    ingest::AppState,
    repo::pg::users::UserRow,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// User representation safe to hand to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserRow> for PublicUser {
    fn from(user: &UserRow) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: PublicUser,
}

pub async fn register(
    State(st): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let users = st.repos.db.users();
    if users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "account already exists for {}",
            req.email
        )));
    }

    let user = UserRow {
        id: Uuid::new_v4(),
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash: hash_password(&req.password)?,
        created_at: Utc::now(),
    };
    users.insert(&user).await?;
    tracing::info!(user_id = %user.id, "registered new account");

    let token = issue_token(
        &st.cfg.auth.jwt_secret,
        st.cfg.auth.token_ttl_hours,
        user.id,
        &user.email,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

pub async fn login(
    State(st): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = st
        .repos
        .db
        .users()
        .find_by_email(&req.email)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let token = issue_token(
        &st.cfg.auth.jwt_secret,
        st.cfg.auth.token_ttl_hours,
        user.id,
        &user.email,
    )?;

    Ok(Json(TokenResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

pub async fn me(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
) -> Result<impl IntoResponse, ApiError> {
    let user = st
        .repos
        .db
        .users()
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(PublicUser::from(&user)))
}
