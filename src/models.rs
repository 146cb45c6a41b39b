use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::AppointmentStore;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub appointments: Arc<dyn AppointmentStore>,
    pub admin_passkey_hash: String,
    pub session_ttl_hours: i64,
}

/* -------------------------
   Generic API envelopes
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub data: OkData,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

/* -------------------------
   Domain enums
--------------------------*/

/// Which variant of the appointment form is being submitted. Immutable for
/// the lifetime of one submission; selects the required fields, the store
/// operation, and the derived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentMode {
    Create,
    Schedule,
    Cancel,
}

impl AppointmentMode {
    /// Status is a pure function of the mode; the client never chooses it.
    pub fn derived_status(self) -> AppointmentStatus {
        match self {
            AppointmentMode::Schedule => AppointmentStatus::Scheduled,
            AppointmentMode::Cancel => AppointmentStatus::Cancelled,
            AppointmentMode::Create => AppointmentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "smallint")]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending = 0,
    Scheduled = 1,
    Cancelled = 2,
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PortalUserRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRow {
    pub appointment_id: Uuid,
    pub user_id: Uuid,
    pub patient_id: Uuid,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub time_zone: String,
    pub status: AppointmentStatus,
    pub reason: String,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_mode() {
        assert_eq!(
            AppointmentMode::Create.derived_status(),
            AppointmentStatus::Pending
        );
        assert_eq!(
            AppointmentMode::Schedule.derived_status(),
            AppointmentStatus::Scheduled
        );
        assert_eq!(
            AppointmentMode::Cancel.derived_status(),
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn mode_uses_lowercase_wire_names() {
        let mode: AppointmentMode = serde_json::from_str(r#""schedule""#).unwrap();
        assert_eq!(mode, AppointmentMode::Schedule);
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
    }
}
