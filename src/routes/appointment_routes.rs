// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AdminContext,
    models::{ApiOk, AppState, AppointmentMode, AppointmentRow, AppointmentStatus},
    validation::AppointmentFormValues,
    workflow::{SubmitSignal, Submission},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(create_appointment).get(list_appointments))
        .route("/appointments/{appointment_id}", get(get_appointment))
        .route(
            "/appointments/{appointment_id}/schedule",
            post(schedule_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            post(cancel_appointment),
        )
}

/* ============================================================
   Request / response DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub user_id: Uuid,
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub form: AppointmentFormValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub form: AppointmentFormValues,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub data: SubmitData,
}

/// The persisted appointment plus the UI signal: `action: "redirect"` with
/// a `location` after a create, `action: "close"` after an update.
#[derive(Debug, Serialize)]
pub struct SubmitData {
    pub appointment: AppointmentRow,
    #[serde(flatten)]
    pub signal: SubmitSignal,
}

/* ============================================================
   POST /appointments (create mode)
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    // The patient record must exist and belong to the submitting user.
    let patient: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT patient_id
        FROM patient
        WHERE patient_id = $1
          AND user_id = $2
        "#,
    )
    .bind(req.patient_id)
    .bind(req.user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    if patient.is_none() {
        return Err(ApiError::NotFound(
            "NOT_FOUND",
            "patient not found for this user".into(),
        ));
    }

    let mut submission = Submission::new(AppointmentMode::Create);
    let (appointment, signal) = submission
        .run(
            state.appointments.as_ref(),
            req.form,
            req.user_id,
            Some(req.patient_id),
            None,
        )
        .await?;

    Ok(Json(SubmitResponse {
        data: SubmitData {
            appointment,
            signal,
        },
    }))
}

/* ============================================================
   POST /appointments/{id}/schedule, /appointments/{id}/cancel
   ============================================================ */

pub async fn schedule_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    submit_update(state, AppointmentMode::Schedule, appointment_id, req).await
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    submit_update(state, AppointmentMode::Cancel, appointment_id, req).await
}

async fn submit_update(
    state: AppState,
    mode: AppointmentMode,
    appointment_id: Uuid,
    req: UpdateAppointmentRequest,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut submission = Submission::new(mode);
    let (appointment, signal) = submission
        .run(
            state.appointments.as_ref(),
            req.form,
            req.user_id,
            None,
            Some(appointment_id),
        )
        .await?;

    Ok(Json(SubmitResponse {
        data: SubmitData {
            appointment,
            signal,
        },
    }))
}

/* ============================================================
   GET /appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentRow>>, ApiError> {
    let row: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(
        r#"
        SELECT appointment_id, user_id, patient_id, primary_physician, schedule, time_zone,
               status, reason, note, cancellation_reason, created_at, updated_at
        FROM appointment
        WHERE appointment_id = $1
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
    .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "appointment not found".into()))?;

    Ok(Json(ApiOk { data: row }))
}

/* ============================================================
   GET /appointments (admin dashboard)
   ============================================================ */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBrief {
    pub patient_id: Uuid,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListItem {
    #[serde(flatten)]
    pub appointment: AppointmentRow,
    pub patient: PatientBrief,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListData {
    pub total_count: i64,
    pub pending_count: i64,
    pub scheduled_count: i64,
    pub cancelled_count: i64,
    pub appointments: Vec<AppointmentListItem>,
}

#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    appointment_id: Uuid,
    user_id: Uuid,
    patient_id: Uuid,
    primary_physician: String,
    schedule: DateTime<Utc>,
    time_zone: String,
    status: AppointmentStatus,
    reason: String,
    note: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    patient_name: String,
}

pub async fn list_appointments(
    State(state): State<AppState>,
    _admin: AdminContext,
) -> Result<Json<ApiOk<AppointmentListData>>, ApiError> {
    let rows: Vec<ListRow> = sqlx::query_as::<_, ListRow>(
        r#"
        SELECT
          a.appointment_id,
          a.user_id,
          a.patient_id,
          a.primary_physician,
          a.schedule,
          a.time_zone,
          a.status,
          a.reason,
          a.note,
          a.cancellation_reason,
          a.created_at,
          a.updated_at,
          p.full_name AS patient_name
        FROM appointment a
        JOIN patient p ON p.patient_id = a.patient_id
        ORDER BY a.created_at DESC
        LIMIT 100
        "#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    // Counts cover the whole table, not just the page returned above.
    let counts: Vec<(i16, i64)> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*)
        FROM appointment
        GROUP BY status
        "#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    let mut pending_count = 0;
    let mut scheduled_count = 0;
    let mut cancelled_count = 0;
    for (status, count) in counts {
        match status {
            0 => pending_count = count,
            1 => scheduled_count = count,
            2 => cancelled_count = count,
            _ => {}
        }
    }

    let appointments = rows
        .into_iter()
        .map(|r| AppointmentListItem {
            appointment: AppointmentRow {
                appointment_id: r.appointment_id,
                user_id: r.user_id,
                patient_id: r.patient_id,
                primary_physician: r.primary_physician,
                schedule: r.schedule,
                time_zone: r.time_zone,
                status: r.status,
                reason: r.reason,
                note: r.note,
                cancellation_reason: r.cancellation_reason,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            patient: PatientBrief {
                patient_id: r.patient_id,
                full_name: r.patient_name,
            },
        })
        .collect();

    Ok(Json(ApiOk {
        data: AppointmentListData {
            total_count: pending_count + scheduled_count + cancelled_count,
            pending_count,
            scheduled_count,
            cancelled_count,
            appointments,
        },
    }))
}
