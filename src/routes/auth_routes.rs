// src/routes/auth_routes.rs

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{generate_access_token, hash_access_token, verify_admin_passkey},
    error::ApiError,
    middleware::auth_context::AdminContext,
    models::{AppState, OkData, OkResponse},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(admin_login))
        .route("/admin/logout", post(admin_logout))
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub passkey: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub data: AdminLoginData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub admin_session_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct AdminSessionRow {
    admin_session_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Exchange the dashboard passkey for an opaque short-lived access token.
/// Only hash(token) is stored.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    if req.passkey.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "passkey is required".into(),
        ));
    }

    if !verify_admin_passkey(&req.passkey, &state.admin_passkey_hash) {
        return Err(ApiError::invalid_passkey());
    }

    let access_token = generate_access_token();
    let token_hash = hash_access_token(&access_token);
    let expires_at = Utc::now() + Duration::hours(state.session_ttl_hours);

    let session: AdminSessionRow = sqlx::query_as::<_, AdminSessionRow>(
        r#"
        INSERT INTO admin_session (access_token_hash, expires_at)
        VALUES ($1, $2)
        RETURNING admin_session_id, expires_at
        "#,
    )
    .bind(&token_hash)
    .bind(expires_at)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    Ok(Json(AdminLoginResponse {
        data: AdminLoginData {
            access_token,
            expires_at: session.expires_at,
            admin_session_id: session.admin_session_id,
        },
    }))
}

pub async fn admin_logout(
    State(state): State<AppState>,
    admin: AdminContext,
) -> Result<Json<OkResponse>, ApiError> {
    let rows = sqlx::query(
        r#"
        UPDATE admin_session
        SET revoked_at = now()
        WHERE admin_session_id = $1
          AND revoked_at IS NULL
        "#,
    )
    .bind(admin.admin_session_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    if rows.rows_affected() == 0 {
        return Err(ApiError::session_expired());
    }

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}
