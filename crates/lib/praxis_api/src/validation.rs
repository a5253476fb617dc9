//! Request body validation.
//!
//! Every request body implements [`Validate`], which either yields the
//! normalized input the services work with or the complete list of field
//! errors. Handlers call it before touching any service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use praxis_core::auth::normalize_email;
use praxis_core::auth::service::Registration;
use praxis_core::finance::NewTransaction;
use praxis_core::models::clinic::{AppointmentStatus, PatientStatus, TransactionKind};

use crate::models::{
    AppointmentCreateRequest, AppointmentStatusRequest, EmergencyContact, LoginRequest,
    NoteCreateRequest, NoteUpdateRequest, PatientCreateRequest, PatientUpdateRequest,
    RegisterRequest, TransactionCreateRequest,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 20_000;
pub const MIN_DURATION_MINUTES: i32 = 5;
pub const MAX_DURATION_MINUTES: i32 = 480;
pub const DEFAULT_DURATION_MINUTES: i32 = 50;

/// One rejected field, reported back in the 400 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Turn a raw request body into validated input.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Collects field errors while a body is checked.
#[derive(Debug, Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    fn email(&mut self, field: &str, raw: &str) -> String {
        let email = normalize_email(raw);
        if !is_plausible_email(&email) {
            self.reject(field, "must be a valid email address");
        }
        email
    }

    fn password(&mut self, field: &str, raw: &str) {
        if raw.chars().count() < MIN_PASSWORD_LEN {
            self.reject(
                field,
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
    }

    fn name(&mut self, field: &str, raw: &str) -> String {
        let name = raw.trim();
        if name.is_empty() {
            self.reject(field, "must not be empty");
        } else if name.chars().count() > MAX_NAME_LEN {
            self.reject(field, format!("must be at most {MAX_NAME_LEN} characters"));
        }
        name.to_string()
    }

    /// Trimmed optional text; blank becomes `None`.
    fn text(&mut self, field: &str, raw: Option<String>, max: usize) -> Option<String> {
        let text = raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        if text.chars().count() > max {
            self.reject(field, format!("must be at most {max} characters"));
        }
        Some(text)
    }

    fn required_text(&mut self, field: &str, raw: &str) -> String {
        let text = raw.trim();
        if text.is_empty() {
            self.reject(field, "must not be empty");
        } else if text.chars().count() > MAX_TEXT_LEN {
            self.reject(field, format!("must be at most {MAX_TEXT_LEN} characters"));
        }
        text.to_string()
    }

    fn non_negative(&mut self, field: &str, cents: Option<i64>) {
        if cents.is_some_and(|c| c < 0) {
            self.reject(field, "must not be negative");
        }
    }

    fn emergency_contact(&mut self, contact: &EmergencyContact) {
        if contact.name.trim().is_empty() {
            self.reject("emergencyContact.name", "must not be empty");
        }
        if contact.phone.trim().is_empty() {
            self.reject("emergencyContact.phone", "must not be empty");
        }
    }
}

/// One `@`, a non-empty local part and a dotted domain.
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Validated login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldError>> {
        let mut check = Checker::default();
        let email = normalize_email(&self.email);
        if email.is_empty() {
            check.reject("email", "must not be empty");
        }
        if self.password.is_empty() {
            check.reject("password", "must not be empty");
        }
        check.finish(Credentials {
            email,
            password: self.password,
        })
    }
}

impl Validate for RegisterRequest {
    type Output = Registration;

    fn validate(self) -> Result<Registration, Vec<FieldError>> {
        let mut check = Checker::default();
        let email = check.email("email", &self.email);
        check.password("password", &self.password);
        let name = check.name("name", &self.name);
        let specialty = check.text("specialty", self.specialty, MAX_NAME_LEN);
        check.non_negative("defaultSessionPriceCents", self.default_session_price_cents);
        check.finish(Registration {
            email,
            password: self.password,
            name,
            specialty,
            default_session_price_cents: self.default_session_price_cents.unwrap_or(0),
        })
    }
}

/// Plaintext patient fields, ready to be sealed.
#[derive(Debug, Clone, Default)]
pub struct PatientInput {
    pub full_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub contact_phone: Option<String>,
    pub diagnosis: Option<String>,
    pub clinical_context: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub session_price_cents: Option<i64>,
}

impl Validate for PatientCreateRequest {
    type Output = PatientInput;

    fn validate(self) -> Result<PatientInput, Vec<FieldError>> {
        let mut check = Checker::default();
        let full_name = check.name("fullName", &self.full_name);
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| check.email("email", &e));
        let contact_phone = check.text("contactPhone", self.contact_phone, MAX_NAME_LEN);
        let diagnosis = check.text("diagnosis", self.diagnosis, MAX_TEXT_LEN);
        let clinical_context = check.text("clinicalContext", self.clinical_context, MAX_TEXT_LEN);
        if let Some(contact) = &self.emergency_contact {
            check.emergency_contact(contact);
        }
        check.non_negative("sessionPriceCents", self.session_price_cents);
        check.finish(PatientInput {
            full_name,
            email,
            birth_date: self.birth_date,
            contact_phone,
            diagnosis,
            clinical_context,
            emergency_contact: self.emergency_contact,
            session_price_cents: self.session_price_cents,
        })
    }
}

/// Partial patient update. Outer `None` keeps a field, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PatientPatch {
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub contact_phone: Option<Option<String>>,
    pub diagnosis: Option<Option<String>>,
    pub clinical_context: Option<Option<String>>,
    pub emergency_contact: Option<Option<EmergencyContact>>,
    pub session_price_cents: Option<Option<i64>>,
    pub status: Option<PatientStatus>,
}

impl Validate for PatientUpdateRequest {
    type Output = PatientPatch;

    fn validate(self) -> Result<PatientPatch, Vec<FieldError>> {
        let mut check = Checker::default();
        let full_name = self.full_name.map(|n| check.name("fullName", &n));
        let email = self.email.map(|e| {
            e.filter(|e| !e.trim().is_empty())
                .map(|e| check.email("email", &e))
        });
        let contact_phone = self
            .contact_phone
            .map(|p| check.text("contactPhone", p, MAX_NAME_LEN));
        let diagnosis = self
            .diagnosis
            .map(|d| check.text("diagnosis", d, MAX_TEXT_LEN));
        let clinical_context = self
            .clinical_context
            .map(|c| check.text("clinicalContext", c, MAX_TEXT_LEN));
        if let Some(Some(contact)) = &self.emergency_contact {
            check.emergency_contact(contact);
        }
        check.non_negative("sessionPriceCents", self.session_price_cents.flatten());
        let status = self.status.and_then(|s| match s.parse::<PatientStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                check.reject("status", "must be one of: active, inactive");
                None
            }
        });
        check.finish(PatientPatch {
            full_name,
            email,
            birth_date: self.birth_date,
            contact_phone,
            diagnosis,
            clinical_context,
            emergency_contact: self.emergency_contact,
            session_price_cents: self.session_price_cents,
            status,
        })
    }
}

/// Validated appointment creation input.
#[derive(Debug, Clone)]
pub struct AppointmentInput {
    pub patient_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    /// `None` falls back to the patient's or clinician's price.
    pub price_cents: Option<i64>,
}

impl Validate for AppointmentCreateRequest {
    type Output = AppointmentInput;

    fn validate(self) -> Result<AppointmentInput, Vec<FieldError>> {
        let mut check = Checker::default();
        let duration_minutes = self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            check.reject(
                "durationMinutes",
                format!("must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES}"),
            );
        }
        check.non_negative("priceCents", self.price_cents);
        check.finish(AppointmentInput {
            patient_id: self.patient_id,
            starts_at: self.starts_at,
            duration_minutes,
            price_cents: self.price_cents,
        })
    }
}

impl Validate for AppointmentStatusRequest {
    type Output = AppointmentStatus;

    fn validate(self) -> Result<AppointmentStatus, Vec<FieldError>> {
        let mut check = Checker::default();
        match self.status.trim().parse::<AppointmentStatus>() {
            Ok(status) => check.finish(status),
            Err(_) => {
                check.reject(
                    "status",
                    "must be one of: scheduled, completed, cancelled, no_show",
                );
                Err(check.errors)
            }
        }
    }
}

/// Validated note creation input; the patient comes from the path.
#[derive(Debug, Clone)]
pub struct NoteInput {
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub private_notes: String,
}

impl Validate for NoteCreateRequest {
    type Output = NoteInput;

    fn validate(self) -> Result<NoteInput, Vec<FieldError>> {
        let mut check = Checker::default();
        let title = check.name("title", &self.title);
        let private_notes = check.required_text("privateNotes", &self.private_notes);
        check.finish(NoteInput {
            appointment_id: self.appointment_id,
            title,
            private_notes,
        })
    }
}

/// Partial note update.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub private_notes: Option<String>,
}

impl Validate for NoteUpdateRequest {
    type Output = NotePatch;

    fn validate(self) -> Result<NotePatch, Vec<FieldError>> {
        let mut check = Checker::default();
        let title = self.title.map(|t| check.name("title", &t));
        let private_notes = self
            .private_notes
            .map(|n| check.required_text("privateNotes", &n));
        check.finish(NotePatch {
            title,
            private_notes,
        })
    }
}

impl Validate for TransactionCreateRequest {
    type Output = NewTransaction;

    fn validate(self) -> Result<NewTransaction, Vec<FieldError>> {
        let mut check = Checker::default();
        let kind = match self.kind.trim().parse::<TransactionKind>() {
            Ok(kind) => kind,
            Err(_) => {
                check.reject("kind", "must be one of: income, expense");
                TransactionKind::Income
            }
        };
        if self.amount_cents <= 0 {
            check.reject("amountCents", "must be greater than zero");
        }
        let description = check.name("description", &self.description);
        let category = check.text("category", self.category, MAX_NAME_LEN);
        check.finish(NewTransaction {
            kind,
            amount_cents: self.amount_cents,
            description,
            category,
            occurred_on: self.occurred_on.unwrap_or_else(|| Utc::now().date_naive()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    fn register(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            specialty: None,
            default_session_price_cents: None,
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_plausible_email("ana@clinic.example"));
        assert!(!is_plausible_email("ana"));
        assert!(!is_plausible_email("@clinic.example"));
        assert!(!is_plausible_email("ana@clinic"));
        assert!(!is_plausible_email("ana@.example"));
        assert!(!is_plausible_email("ana@clinic."));
        assert!(!is_plausible_email("a@b@c.example"));
        assert!(!is_plausible_email("a na@clinic.example"));
    }

    #[test]
    fn register_normalizes_email_and_defaults_price() {
        let reg = register("  Ana@Clinic.Example ", "long-enough", " Dr. Ana ")
            .validate()
            .unwrap();
        assert_eq!(reg.email, "ana@clinic.example");
        assert_eq!(reg.name, "Dr. Ana");
        assert_eq!(reg.default_session_price_cents, 0);
    }

    #[test]
    fn register_reports_every_bad_field() {
        let errors = register("nope", "short", "   ").validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "password", "name"]);
    }

    #[test]
    fn register_rejects_overlong_name_and_negative_price() {
        let mut req = register("ana@clinic.example", "long-enough", &"x".repeat(201));
        req.default_session_price_cents = Some(-1);
        let errors = req.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["name", "defaultSessionPriceCents"]);
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginRequest {
            email: " ".into(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "password"]);

        let creds = LoginRequest {
            email: "ANA@clinic.example".into(),
            password: "whatever".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(creds.email, "ana@clinic.example");
    }

    #[test]
    fn patient_create_trims_and_drops_blank_optionals() {
        let input = PatientCreateRequest {
            full_name: " Maria Silva ".into(),
            email: Some("  ".into()),
            birth_date: None,
            contact_phone: Some(" +55 11 99999-0000 ".into()),
            diagnosis: Some("".into()),
            clinical_context: None,
            emergency_contact: None,
            session_price_cents: Some(15000),
        }
        .validate()
        .unwrap();
        assert_eq!(input.full_name, "Maria Silva");
        assert_eq!(input.email, None);
        assert_eq!(input.contact_phone.as_deref(), Some("+55 11 99999-0000"));
        assert_eq!(input.diagnosis, None);
    }

    #[test]
    fn patient_create_checks_nested_contact() {
        let errors = PatientCreateRequest {
            full_name: "Maria".into(),
            email: Some("maria".into()),
            emergency_contact: Some(EmergencyContact {
                name: " ".into(),
                phone: "123".into(),
                relationship: None,
            }),
            diagnosis: Some("d".repeat(MAX_TEXT_LEN + 1)),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["email", "diagnosis", "emergencyContact.name"]
        );
    }

    #[test]
    fn patient_patch_distinguishes_clear_from_keep() {
        let patch = PatientUpdateRequest {
            diagnosis: Some(None),
            contact_phone: Some(Some("555".into())),
            status: Some("inactive".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.diagnosis, Some(None));
        assert_eq!(patch.contact_phone, Some(Some("555".into())));
        assert_eq!(patch.clinical_context, None);
        assert_eq!(patch.status, Some(PatientStatus::Inactive));

        let errors = PatientUpdateRequest {
            full_name: Some("".into()),
            status: Some("archived".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["fullName", "status"]);
    }

    #[test]
    fn appointment_duration_bounds() {
        let base = AppointmentCreateRequest {
            patient_id: Uuid::now_v7(),
            starts_at: Utc::now(),
            duration_minutes: None,
            price_cents: None,
        };
        assert_eq!(
            base.clone().validate().unwrap().duration_minutes,
            DEFAULT_DURATION_MINUTES
        );

        for minutes in [4, 481, -10] {
            let req = AppointmentCreateRequest {
                duration_minutes: Some(minutes),
                ..base.clone()
            };
            assert_eq!(fields(&req.validate().unwrap_err()), vec!["durationMinutes"]);
        }
        for minutes in [5, 480] {
            let req = AppointmentCreateRequest {
                duration_minutes: Some(minutes),
                ..base.clone()
            };
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn appointment_status_parses_known_values_only() {
        let ok = AppointmentStatusRequest {
            status: "no_show".into(),
        };
        assert_eq!(ok.validate().unwrap(), AppointmentStatus::NoShow);
        let bad = AppointmentStatusRequest {
            status: "done".into(),
        };
        assert_eq!(fields(&bad.validate().unwrap_err()), vec!["status"]);
    }

    #[test]
    fn note_requires_title_and_body() {
        let errors = NoteCreateRequest {
            appointment_id: None,
            title: "".into(),
            private_notes: "  ".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["title", "privateNotes"]);

        let patch = NoteUpdateRequest {
            title: None,
            private_notes: Some(" revised ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(patch.private_notes.as_deref(), Some("revised"));
    }

    #[test]
    fn transaction_amount_must_be_positive() {
        let req = TransactionCreateRequest {
            kind: "refund".into(),
            amount_cents: 0,
            description: "Rent".into(),
            category: None,
            occurred_on: None,
        };
        assert_eq!(
            fields(&req.validate().unwrap_err()),
            vec!["kind", "amountCents"]
        );

        let tx = TransactionCreateRequest {
            kind: "expense".into(),
            amount_cents: 250_000,
            description: " Rent ".into(),
            category: Some("office".into()),
            occurred_on: NaiveDate::from_ymd_opt(2026, 3, 1),
        }
        .validate()
        .unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.description, "Rent");
        assert_eq!(tx.occurred_on, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }
}
