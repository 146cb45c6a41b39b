use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FieldError;
use crate::models::AppointmentMode;

/// Time zones offered by the portal's picker. Submissions naming anything
/// else are rejected.
pub const TIME_ZONES: &[&str] = &[
    "Africa/Nairobi",
    "America/New_York",
    "Europe/London",
    "Africa/Lagos",
    "Asia/Tokyo",
    "Asia/Singapore",
    "Australia/Sydney",
    "Europe/Berlin",
    "Europe/Paris",
    "America/Los_Angeles",
    "America/Chicago",
    "America/Denver",
    "Asia/Shanghai",
    "Asia/Hong_Kong",
    "Europe/Moscow",
    "Africa/Cairo",
    "America/Sao_Paulo",
    "Asia/Seoul",
    "Europe/Amsterdam",
    "Asia/Dubai",
    "Europe/Zurich",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    DateTime,
}

/// One row of the per-mode validation ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

// Requiredness lives in these two tables and nowhere else. Create and
// schedule share a ruleset; cancel only demands the cancellation reason.
// Time zone is mandatory in every mode.
const CREATE_RULES: &[FieldRule] = &[
    FieldRule { field: "primaryPhysician", label: "Primary physician", kind: FieldKind::Text, required: true },
    FieldRule { field: "schedule", label: "Schedule", kind: FieldKind::DateTime, required: true },
    FieldRule { field: "reason", label: "Reason", kind: FieldKind::Text, required: true },
    FieldRule { field: "note", label: "Note", kind: FieldKind::Text, required: false },
    FieldRule { field: "cancellationReason", label: "Cancellation reason", kind: FieldKind::Text, required: false },
    FieldRule { field: "timeZone", label: "Time zone", kind: FieldKind::Text, required: true },
];

const CANCEL_RULES: &[FieldRule] = &[
    FieldRule { field: "primaryPhysician", label: "Primary physician", kind: FieldKind::Text, required: false },
    FieldRule { field: "schedule", label: "Schedule", kind: FieldKind::DateTime, required: false },
    FieldRule { field: "reason", label: "Reason", kind: FieldKind::Text, required: false },
    FieldRule { field: "note", label: "Note", kind: FieldKind::Text, required: false },
    FieldRule { field: "cancellationReason", label: "Cancellation reason", kind: FieldKind::Text, required: true },
    FieldRule { field: "timeZone", label: "Time zone", kind: FieldKind::Text, required: true },
];

/// Schema selector: mode in, ruleset out. Deterministic, no side effects.
pub const fn appointment_schema(mode: AppointmentMode) -> &'static [FieldRule] {
    match mode {
        AppointmentMode::Create | AppointmentMode::Schedule => CREATE_RULES,
        AppointmentMode::Cancel => CANCEL_RULES,
    }
}

/// Raw appointment form values as submitted by the client. Everything is
/// optional here; requiredness is the schema's job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentFormValues {
    pub primary_physician: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    pub time_zone: Option<String>,
}

impl AppointmentFormValues {
    fn text_value(&self, field: &str) -> Option<&str> {
        match field {
            "primaryPhysician" => self.primary_physician.as_deref(),
            "reason" => self.reason.as_deref(),
            "note" => self.note.as_deref(),
            "cancellationReason" => self.cancellation_reason.as_deref(),
            "timeZone" => self.time_zone.as_deref(),
            _ => None,
        }
    }
}

/// Walk the mode's ruleset against the submitted values and collect every
/// offending field; never stops at the first failure.
pub fn validate_appointment(
    mode: AppointmentMode,
    values: &AppointmentFormValues,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    for rule in appointment_schema(mode) {
        if !rule.required {
            continue;
        }
        let missing = match rule.kind {
            FieldKind::DateTime => values.schedule.is_none(),
            FieldKind::Text => values
                .text_value(rule.field)
                .map(str::trim)
                .is_none_or(str::is_empty),
        };
        if missing {
            errors.push(FieldError::required(rule.field, rule.label));
        }
    }

    if let Some(tz) = values
        .time_zone
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if !TIME_ZONES.contains(&tz) {
            errors.push(FieldError {
                field: "timeZone",
                message: format!("unsupported time zone: {tz}"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/* -------------------------
   Intake / registration field checks
--------------------------*/

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// E.164 shape: leading '+', then 10 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filled() -> AppointmentFormValues {
        AppointmentFormValues {
            primary_physician: Some("Dr. Lee".into()),
            schedule: Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()),
            reason: Some("checkup".into()),
            note: None,
            cancellation_reason: None,
            time_zone: Some("America/New_York".into()),
        }
    }

    fn failed_fields(mode: AppointmentMode, values: &AppointmentFormValues) -> Vec<&'static str> {
        match validate_appointment(mode, values) {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.field).collect(),
        }
    }

    #[test]
    fn schema_selection_is_idempotent() {
        for mode in [
            AppointmentMode::Create,
            AppointmentMode::Schedule,
            AppointmentMode::Cancel,
        ] {
            assert_eq!(appointment_schema(mode), appointment_schema(mode));
        }
    }

    #[test]
    fn create_and_schedule_share_a_ruleset() {
        assert_eq!(
            appointment_schema(AppointmentMode::Create),
            appointment_schema(AppointmentMode::Schedule)
        );
    }

    #[test]
    fn time_zone_required_in_every_mode() {
        for mode in [
            AppointmentMode::Create,
            AppointmentMode::Schedule,
            AppointmentMode::Cancel,
        ] {
            let mut values = filled();
            values.cancellation_reason = Some("conflict".into());
            values.time_zone = Some("  ".into());
            assert!(failed_fields(mode, &values).contains(&"timeZone"));
        }
    }

    #[test]
    fn unsupported_time_zone_rejected() {
        let mut values = filled();
        values.time_zone = Some("Mars/Olympus_Mons".into());
        let errors = validate_appointment(AppointmentMode::Create, &values).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeZone");
        assert!(errors[0].message.contains("unsupported"));
    }

    #[test]
    fn create_demands_physician_schedule_and_reason() {
        let values = AppointmentFormValues {
            time_zone: Some("Europe/Berlin".into()),
            ..Default::default()
        };
        let fields = failed_fields(AppointmentMode::Create, &values);
        assert_eq!(fields, vec!["primaryPhysician", "schedule", "reason"]);
    }

    #[test]
    fn create_with_all_mandatory_fields_passes() {
        assert!(validate_appointment(AppointmentMode::Create, &filled()).is_ok());
    }

    #[test]
    fn cancel_only_demands_cancellation_reason_and_zone() {
        let values = AppointmentFormValues {
            cancellation_reason: Some("urgent meeting came up".into()),
            time_zone: Some("Europe/London".into()),
            ..Default::default()
        };
        assert!(validate_appointment(AppointmentMode::Cancel, &values).is_ok());
    }

    #[test]
    fn cancel_without_reason_fails() {
        let values = AppointmentFormValues {
            cancellation_reason: Some("".into()),
            time_zone: Some("Europe/London".into()),
            ..Default::default()
        };
        let fields = failed_fields(AppointmentMode::Cancel, &values);
        assert_eq!(fields, vec!["cancellationReason"]);
    }

    #[test]
    fn all_offending_fields_are_collected() {
        let errors =
            validate_appointment(AppointmentMode::Create, &AppointmentFormValues::default())
                .unwrap_err();
        assert_eq!(errors.len(), 4); // physician, schedule, reason, timeZone
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada example@com.org"));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+12025550123"));
        assert!(!is_valid_phone("12025550123"));
        assert!(!is_valid_phone("+1202"));
        assert!(!is_valid_phone("+1202555012x"));
    }
}
