use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, FieldError};
use crate::models::{AppointmentMode, AppointmentRow};
use crate::store::{AppointmentStore, AppointmentUpdate, NewAppointment, StoreError};
use crate::validation::{validate_appointment, AppointmentFormValues};

/// Post-submit contract for the consuming UI: either navigate to the
/// success view for a freshly created appointment, or close the dialog
/// that hosted a schedule/cancel form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SubmitSignal {
    Redirect { location: String },
    Close,
}

/// Lifecycle of one submission. A validation failure never leaves `Idle`
/// (the form simply shows its field errors); `Failed` is reserved for a
/// store call that went through and errored.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Succeeded(SubmitSignal),
    Failed(String),
}

/// One appointment form submission. The mode is fixed at construction and
/// decides the required fields, the store operation, and the derived
/// status.
pub struct Submission {
    mode: AppointmentMode,
    state: SubmitState,
}

impl Submission {
    pub fn new(mode: AppointmentMode) -> Self {
        Self {
            mode,
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Validate, assemble the mode-specific payload, call the store, and
    /// translate the result into a UI signal. Side effects are strictly
    /// sequential; nothing here retries or defends against a concurrent
    /// second submission.
    pub async fn run(
        &mut self,
        store: &dyn AppointmentStore,
        values: AppointmentFormValues,
        user_id: Uuid,
        patient_id: Option<Uuid>,
        appointment_id: Option<Uuid>,
    ) -> Result<(AppointmentRow, SubmitSignal), ApiError> {
        if let Err(fields) = validate_appointment(self.mode, &values) {
            return Err(ApiError::Validation(fields));
        }

        let status = self.mode.derived_status();
        self.state = SubmitState::Submitting;

        let result = match self.mode {
            AppointmentMode::Create => {
                let Some(patient_id) = patient_id else {
                    self.state = SubmitState::Idle;
                    return Err(ApiError::BadRequest(
                        "VALIDATION_ERROR",
                        "patientId is required to create an appointment".into(),
                    ));
                };
                let Some(schedule) = values.schedule else {
                    self.state = SubmitState::Idle;
                    return Err(ApiError::Validation(vec![FieldError::required(
                        "schedule", "Schedule",
                    )]));
                };

                let new = NewAppointment {
                    user_id,
                    patient_id,
                    primary_physician: trimmed(values.primary_physician).unwrap_or_default(),
                    schedule,
                    reason: trimmed(values.reason).unwrap_or_default(),
                    status,
                    note: trimmed(values.note),
                    time_zone: trimmed(values.time_zone).unwrap_or_default(),
                };

                store.create_appointment(new).await.map(|row| {
                    let location = format!(
                        "/patients/{user_id}/new-appointment/success?appointmentId={}",
                        row.appointment_id
                    );
                    (row, SubmitSignal::Redirect { location })
                })
            }
            AppointmentMode::Schedule | AppointmentMode::Cancel => {
                let Some(appointment_id) = appointment_id else {
                    self.state = SubmitState::Idle;
                    return Err(ApiError::BadRequest(
                        "VALIDATION_ERROR",
                        "appointmentId is required to update an appointment".into(),
                    ));
                };

                // Unsupplied fields stay None so the store keeps their
                // current values; a cancel submission only carries status,
                // cancellation reason, and time zone.
                let update = AppointmentUpdate {
                    primary_physician: trimmed(values.primary_physician),
                    schedule: values.schedule,
                    status,
                    cancellation_reason: trimmed(values.cancellation_reason),
                    time_zone: trimmed(values.time_zone).unwrap_or_default(),
                };

                store
                    .update_appointment(user_id, appointment_id, update)
                    .await
                    .map(|row| (row, SubmitSignal::Close))
            }
        };

        match result {
            Ok((row, signal)) => {
                self.state = SubmitState::Succeeded(signal.clone());
                Ok((row, signal))
            }
            Err(err) => {
                tracing::error!(mode = ?self.mode, error = %err, "appointment submission failed");
                self.state = SubmitState::Failed(err.to_string());
                Err(match err {
                    StoreError::NotFound => {
                        ApiError::NotFound("NOT_FOUND", "appointment not found".into())
                    }
                    other => ApiError::Internal(format!("store error: {other}")),
                })
            }
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use crate::models::AppointmentStatus;

    struct StubStore {
        created: Mutex<Vec<NewAppointment>>,
        updated: Mutex<Vec<(Uuid, Uuid, AppointmentUpdate)>>,
        fail: bool,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                updated: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn call_count(&self) -> usize {
            self.created.lock().unwrap().len() + self.updated.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl AppointmentStore for StubStore {
        async fn create_appointment(
            &self,
            new: NewAppointment,
        ) -> Result<AppointmentRow, StoreError> {
            if self.fail {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            let row = AppointmentRow {
                appointment_id: Uuid::new_v4(),
                user_id: new.user_id,
                patient_id: new.patient_id,
                primary_physician: new.primary_physician.clone(),
                schedule: new.schedule,
                time_zone: new.time_zone.clone(),
                status: new.status,
                reason: new.reason.clone(),
                note: new.note.clone(),
                cancellation_reason: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.created.lock().unwrap().push(new);
            Ok(row)
        }

        async fn update_appointment(
            &self,
            user_id: Uuid,
            appointment_id: Uuid,
            update: AppointmentUpdate,
        ) -> Result<AppointmentRow, StoreError> {
            if self.fail {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            let row = AppointmentRow {
                appointment_id,
                user_id,
                patient_id: Uuid::new_v4(),
                primary_physician: update
                    .primary_physician
                    .clone()
                    .unwrap_or_else(|| "Dr. Lee".into()),
                schedule: update
                    .schedule
                    .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()),
                time_zone: update.time_zone.clone(),
                status: update.status,
                reason: "checkup".into(),
                note: None,
                cancellation_reason: update.cancellation_reason.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.updated
                .lock()
                .unwrap()
                .push((user_id, appointment_id, update));
            Ok(row)
        }
    }

    fn create_values() -> AppointmentFormValues {
        AppointmentFormValues {
            primary_physician: Some("Dr. Lee".into()),
            schedule: Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()),
            reason: Some("checkup".into()),
            note: Some("prefers mornings".into()),
            cancellation_reason: None,
            time_zone: Some("America/New_York".into()),
        }
    }

    #[tokio::test]
    async fn create_success_redirects_to_success_view() {
        let store = StubStore::new();
        let user_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        let mut submission = Submission::new(AppointmentMode::Create);
        let (row, signal) = submission
            .run(&store, create_values(), user_id, Some(patient_id), None)
            .await
            .unwrap();

        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, AppointmentStatus::Pending);
        assert_eq!(created[0].primary_physician, "Dr. Lee");
        assert_eq!(created[0].patient_id, patient_id);

        let expected = format!(
            "/patients/{user_id}/new-appointment/success?appointmentId={}",
            row.appointment_id
        );
        assert_eq!(
            signal,
            SubmitSignal::Redirect {
                location: expected.clone()
            }
        );
        assert_eq!(
            submission.state(),
            &SubmitState::Succeeded(SubmitSignal::Redirect { location: expected })
        );
    }

    #[tokio::test]
    async fn validation_failure_makes_no_store_call() {
        let store = StubStore::new();
        let mut values = create_values();
        values.primary_physician = None;

        let mut submission = Submission::new(AppointmentMode::Create);
        let err = submission
            .run(&store, values, Uuid::new_v4(), Some(Uuid::new_v4()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(fields) if fields[0].field == "primaryPhysician"));
        assert_eq!(store.call_count(), 0);
        assert_eq!(submission.state(), &SubmitState::Idle);
    }

    #[tokio::test]
    async fn create_without_patient_id_is_rejected() {
        let store = StubStore::new();
        let mut submission = Submission::new(AppointmentMode::Create);
        let err = submission
            .run(&store, create_values(), Uuid::new_v4(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest("VALIDATION_ERROR", _)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn schedule_always_derives_scheduled() {
        let store = StubStore::new();
        let appointment_id = Uuid::new_v4();

        let mut submission = Submission::new(AppointmentMode::Schedule);
        let (row, signal) = submission
            .run(
                &store,
                create_values(),
                Uuid::new_v4(),
                None,
                Some(appointment_id),
            )
            .await
            .unwrap();

        assert_eq!(signal, SubmitSignal::Close);
        assert_eq!(row.status, AppointmentStatus::Scheduled);
        let updated = store.updated.lock().unwrap();
        assert_eq!(updated[0].1, appointment_id);
        assert_eq!(updated[0].2.status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn cancel_sends_only_cancellation_fields() {
        let store = StubStore::new();
        let values = AppointmentFormValues {
            cancellation_reason: Some("urgent meeting came up".into()),
            time_zone: Some("Europe/London".into()),
            ..Default::default()
        };

        let mut submission = Submission::new(AppointmentMode::Cancel);
        let (row, signal) = submission
            .run(&store, values, Uuid::new_v4(), None, Some(Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(signal, SubmitSignal::Close);
        assert_eq!(row.status, AppointmentStatus::Cancelled);

        let updated = store.updated.lock().unwrap();
        let update = &updated[0].2;
        assert_eq!(update.status, AppointmentStatus::Cancelled);
        assert_eq!(update.primary_physician, None);
        assert_eq!(update.schedule, None);
        assert_eq!(
            update.cancellation_reason.as_deref(),
            Some("urgent meeting came up")
        );
        assert_eq!(update.time_zone, "Europe/London");
    }

    #[tokio::test]
    async fn cancel_with_empty_reason_never_reaches_the_store() {
        let store = StubStore::new();
        let values = AppointmentFormValues {
            cancellation_reason: Some("".into()),
            time_zone: Some("Europe/London".into()),
            ..Default::default()
        };

        let mut submission = Submission::new(AppointmentMode::Cancel);
        let err = submission
            .run(&store, values, Uuid::new_v4(), None, Some(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn update_without_appointment_id_is_rejected() {
        let store = StubStore::new();
        let mut submission = Submission::new(AppointmentMode::Schedule);
        let err = submission
            .run(&store, create_values(), Uuid::new_v4(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest("VALIDATION_ERROR", _)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced_and_marks_submission_failed() {
        let store = StubStore::failing();
        let mut submission = Submission::new(AppointmentMode::Create);
        let err = submission
            .run(
                &store,
                create_values(),
                Uuid::new_v4(),
                Some(Uuid::new_v4()),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Internal(_)));
        assert!(matches!(submission.state(), SubmitState::Failed(_)));
    }
}
