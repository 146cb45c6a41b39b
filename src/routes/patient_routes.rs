// src/routes/patient_routes.rs

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, FieldError},
    models::{ApiOk, AppState, PortalUserRow},
    validation::{is_valid_email, is_valid_phone},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatientRow {
    pub patient_id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: chrono::NaiveDate,
    pub gender: i16,
    pub address: String,
    pub occupation: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub primary_physician: String,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: chrono::NaiveDate,
    pub gender: i16, // 0,1,2
    pub address: String,
    pub occupation: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub primary_physician: String,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub treatment_consent: Option<bool>,
    pub disclosure_consent: Option<bool>,
    pub privacy_consent: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", post(register_patient))
        .route("/patients/{user_id}", get(get_patient))
        .route("/patients/{user_id}/register", get(register_entry))
}

const PATIENT_COLUMNS: &str = r#"
        patient_id, user_id, full_name, email, phone, birth_date, gender, address,
        occupation, emergency_contact_name, emergency_contact_phone, primary_physician,
        insurance_provider, insurance_policy_number, allergies, current_medication,
        identification_type, identification_number, treatment_consent, disclosure_consent,
        privacy_consent, created_at
"#;

async fn find_patient_by_user(
    state: &AppState,
    user_id: Uuid,
) -> Result<Option<PatientRow>, ApiError> {
    sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        SELECT {PATIENT_COLUMNS}
        FROM patient
        WHERE user_id = $1
        "#
    ))
    .bind(user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))
}

/// Entry point of the registration flow. Loads the portal user so the form
/// can pre-fill; if this user already registered a patient record, the
/// client is sent straight to the scheduling flow instead.
pub async fn register_entry(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let user: PortalUserRow = sqlx::query_as::<_, PortalUserRow>(
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

    if find_patient_by_user(&state, user_id).await?.is_some() {
        return Ok(
            Redirect::to(&format!("/patients/{user_id}/new-appointment")).into_response(),
        );
    }

    Ok(Json(ApiOk { data: user }).into_response())
}

pub async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<RegisterPatientRequest>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    let full_name = req.full_name.trim();
    let email = req.email.trim();
    let phone = req.phone.trim();
    let address = req.address.trim();
    let emergency_name = req.emergency_contact_name.trim();
    let emergency_phone = req.emergency_contact_phone.trim();
    let primary_physician = req.primary_physician.trim();

    let mut fields = Vec::new();
    if full_name.is_empty() {
        fields.push(FieldError::required("fullName", "Full name"));
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
    if address.is_empty() {
        fields.push(FieldError::required("address", "Address"));
    }
    if emergency_name.is_empty() {
        fields.push(FieldError::required(
            "emergencyContactName",
            "Emergency contact name",
        ));
    }
    if !is_valid_phone(emergency_phone) {
        fields.push(FieldError {
            field: "emergencyContactPhone",
            message: "Emergency contact phone must be in international format".into(),
        });
    }
    if primary_physician.is_empty() {
        fields.push(FieldError::required("primaryPhysician", "Primary physician"));
    }
    if !(0..=2).contains(&req.gender) {
        fields.push(FieldError {
            field: "gender",
            message: "gender must be 0,1,2".into(),
        });
    }
    if !req.privacy_consent {
        fields.push(FieldError {
            field: "privacyConsent",
            message: "Privacy consent is required to register".into(),
        });
    }
    if !fields.is_empty() {
        return Err(ApiError::Validation(fields));
    }

    // Ensure the owning portal user exists
    let user_exists: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT user_id
        FROM portal_user
        WHERE user_id = $1
        "#,
    )
    .bind(req.user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    if user_exists.is_none() {
        return Err(ApiError::NotFound("NOT_FOUND", "user not found".into()));
    }

    if find_patient_by_user(&state, req.user_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "ALREADY_REGISTERED",
            "a patient record already exists for this user".into(),
        ));
    }

    let row: PatientRow = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        INSERT INTO patient (
          user_id, full_name, email, phone, birth_date, gender, address, occupation,
          emergency_contact_name, emergency_contact_phone, primary_physician,
          insurance_provider, insurance_policy_number, allergies, current_medication,
          identification_type, identification_number, treatment_consent,
          disclosure_consent, privacy_consent
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20)
        RETURNING {PATIENT_COLUMNS}
        "#
    ))
    .bind(req.user_id)
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .bind(req.birth_date)
    .bind(req.gender)
    .bind(address)
    .bind(req.occupation.as_deref().map(str::trim))
    .bind(emergency_name)
    .bind(emergency_phone)
    .bind(primary_physician)
    .bind(req.insurance_provider.as_deref().map(str::trim))
    .bind(req.insurance_policy_number.as_deref().map(str::trim))
    .bind(req.allergies.as_deref())
    .bind(req.current_medication.as_deref())
    .bind(req.identification_type.as_deref())
    .bind(req.identification_number.as_deref())
    .bind(req.treatment_consent.unwrap_or(false))
    .bind(req.disclosure_consent.unwrap_or(false))
    .bind(req.privacy_consent)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::Internal(format!("db error: {e}")))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    let row = find_patient_by_user(&state, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "patient not found".into()))?;

    Ok(Json(ApiOk { data: row }))
}
