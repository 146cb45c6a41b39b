use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use crate::auth::hash_access_token;
use crate::error::ApiError;
use crate::models::AppState;

/// Proof that the request carried a live admin session token. Extracted on
/// dashboard routes only; patient-facing intake/registration/appointment
/// endpoints are public.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_session_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct SessionLookupRow {
    admin_session_id: Uuid,
}

impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let token_hash = hash_access_token(authz.token());

            let row: SessionLookupRow = sqlx::query_as::<_, SessionLookupRow>(
                r#"
                SELECT admin_session_id
                FROM admin_session
                WHERE access_token_hash = $1
                  AND revoked_at IS NULL
                  AND expires_at > now()
                "#,
            )
            .bind(&token_hash)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
            .ok_or_else(ApiError::session_expired)?;

            // Touch last_seen_at (best-effort)
            let _ = sqlx::query(
                r#"
                UPDATE admin_session
                SET last_seen_at = now()
                WHERE admin_session_id = $1
                "#,
            )
            .bind(row.admin_session_id)
            .execute(&state.db)
            .await;

            Ok(AdminContext {
                admin_session_id: row.admin_session_id,
            })
        }
    }
}
