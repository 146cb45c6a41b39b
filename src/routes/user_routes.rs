// src/routes/user_routes.rs

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, FieldError},
    models::{ApiOk, AppState, PortalUserRow},
    validation::{is_valid_email, is_valid_phone},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/{user_id}", get(get_user))
}

/// Intake form: the three fields collected on the portal home page.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiOk<PortalUserRow>>, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim();
    let phone = req.phone.trim();

    let mut fields = Vec::new();
    if name.is_empty() {
        fields.push(FieldError::required("name", "Name"));
    }
    if !is_valid_email(email) {
        fields.push(FieldError {
            field: "email",
            message: "Email address is invalid".into(),
        });
    }
    if !is_valid_phone(phone) {
        fields.push(FieldError {
            field: "phone",
            message: "Phone number must be in international format".into(),
        });
    }
    if !fields.is_empty() {
        return Err(ApiError::Validation(fields));
    }

    // Intake is idempotent per email: re-submitting the home form with a
    // known address returns the existing portal user instead of erroring.
    let inserted: Option<PortalUserRow> = sqlx::query_as::<_, PortalUserRow>(
        r#"
        INSERT INTO portal_user (full_name, email, phone)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING user_id, full_name, email, phone, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    let row = match inserted {
        Some(row) => row,
        None => {
            tracing::info!(%email, "intake hit an existing portal user");
            sqlx::query_as::<_, PortalUserRow>(
                r#"
                SELECT user_id, full_name, email, phone, created_at
                FROM portal_user
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_one(&state.db)
            .await
            .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
        }
    };

    Ok(Json(ApiOk { data: row }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiOk<PortalUserRow>>, ApiError> {
    let row: PortalUserRow = sqlx::query_as::<_, PortalUserRow>(
        r#"
        SELECT user_id, full_name, email, phone, created_at
        FROM portal_user
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
    .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "user not found".into()))?;

    Ok(Json(ApiOk { data: row }))
}
