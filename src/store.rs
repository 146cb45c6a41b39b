use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AppointmentRow, AppointmentStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("appointment not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Field set persisted by a create-mode submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub patient_id: Uuid,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub note: Option<String>,
    pub time_zone: String,
}

/// Field set persisted by a schedule- or cancel-mode submission. `None`
/// fields keep their stored value; in cancel mode everything but status,
/// cancellation reason, and time zone usually stays `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentUpdate {
    pub primary_physician: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub time_zone: String,
}

/// The persistence collaborator behind the appointment workflow. The
/// controller only sees this trait; Postgres sits behind it in production
/// and a stub sits behind it in tests.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create_appointment(&self, new: NewAppointment)
    -> Result<AppointmentRow, StoreError>;

    async fn update_appointment(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<AppointmentRow, StoreError>;
}

#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: sqlx::PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn create_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<AppointmentRow, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            INSERT INTO appointment
                (user_id, patient_id, primary_physician, schedule, time_zone, status, reason, note)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING appointment_id, user_id, patient_id, primary_physician, schedule, time_zone,
                      status, reason, note, cancellation_reason, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.patient_id)
        .bind(&new.primary_physician)
        .bind(new.schedule)
        .bind(&new.time_zone)
        .bind(new.status)
        .bind(&new.reason)
        .bind(new.note.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_appointment(
        &self,
        user_id: Uuid,
        appointment_id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<AppointmentRow, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            UPDATE appointment
            SET primary_physician   = COALESCE($3, primary_physician),
                schedule            = COALESCE($4, schedule),
                status              = $5,
                cancellation_reason = COALESCE($6, cancellation_reason),
                time_zone           = $7,
                updated_at          = now()
            WHERE appointment_id = $1
              AND user_id = $2
            RETURNING appointment_id, user_id, patient_id, primary_physician, schedule, time_zone,
                      status, reason, note, cancellation_reason, created_at, updated_at
            "#,
        )
        .bind(appointment_id)
        .bind(user_id)
        .bind(update.primary_physician.as_deref())
        .bind(update.schedule)
        .bind(update.status)
        .bind(update.cancellation_reason.as_deref())
        .bind(&update.time_zone)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound)
    }
}
