use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::auth::Role;
use crate::backend::BackendError;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Field messages in the order the form checks them
///
/// Serialized as a JSON object keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(|(_, message)| message.as_str())
    }

    /// Keeps the first message given for a field
    fn add(&mut self, field: &'static str, message: &str) {
        if self.get(field).is_none() {
            self.0.push((field, message.to_string()));
        }
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(field, message)| (*field, message)))
    }
}

/// Per-field validation messages, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{} champ(s) invalide(s)", .fields.len())]
pub struct ValidationErrors {
    pub fields: FieldErrors,
}

impl ValidationErrors {
    fn add(&mut self, field: &'static str, message: &str) {
        self.fields.add(field, message);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field)
    }

    /// Message of the first field in form order, used as the toast text
    pub fn first(&self) -> Option<&str> {
        self.fields.first()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn chars(value: &str) -> usize {
    value.trim().chars().count()
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "L'email est requis");
    } else if !is_valid_email(email.trim()) {
        errors.add("email", "Format d'email invalide");
    }
}

fn check_name(errors: &mut ValidationErrors, field: &'static str, value: &str, required: &str, short: &str) {
    if value.trim().is_empty() {
        errors.add(field, required);
    } else if chars(value) < 2 {
        errors.add(field, short);
    }
}

fn check_min(errors: &mut ValidationErrors, field: &'static str, value: &str, min: usize, message: &str) {
    if chars(value) < min {
        errors.add(field, message);
    }
}

fn insert_non_empty(payload: &mut Map<String, Value>, key: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        payload.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Email check applied to account bodies forwarded as-is to the backend
pub fn check_account_email(body: &Value) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, body.get("email").and_then(Value::as_str).unwrap_or(""));
    errors.into_result()
}

/// Create and edit form for system users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemUserForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub specialty: String,
    pub phone_number: String,
    pub role: String,
}

impl SystemUserForm {
    /// The password is only required when creating an account
    pub fn validate(&self, editing: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_email(&mut errors, &self.email);
        if !editing && self.password.is_empty() {
            errors.add("password", "Le mot de passe est requis");
        }
        if !self.password.is_empty() && self.password.chars().count() < 6 {
            errors.add("password", "Le mot de passe doit contenir au moins 6 caractères");
        }
        check_name(
            &mut errors,
            "firstName",
            &self.first_name,
            "Le prénom est requis",
            "Le prénom doit contenir au moins 2 caractères",
        );
        check_name(
            &mut errors,
            "lastName",
            &self.last_name,
            "Le nom est requis",
            "Le nom doit contenir au moins 2 caractères",
        );
        if self.role.trim().is_empty() {
            errors.add("role", "Le rôle est requis");
        } else if Role::parse_assignable(&self.role).is_none() {
            errors.add("role", "Le rôle sélectionné n'est pas valide");
        }

        errors.into_result()
    }

    /// JSON body for the backend, without the password when it was left empty
    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("email".into(), json!(self.email.trim()));
        payload.insert("firstName".into(), json!(self.first_name.trim()));
        payload.insert("lastName".into(), json!(self.last_name.trim()));
        insert_non_empty(&mut payload, "title", &self.title);
        insert_non_empty(&mut payload, "specialty", &self.specialty);
        insert_non_empty(&mut payload, "phoneNumber", &self.phone_number);
        let role = Role::parse_assignable(&self.role).unwrap_or(Role::Manager);
        payload.insert("role".into(), json!(role.as_str()));
        if !self.password.is_empty() {
            payload.insert("password".into(), json!(self.password));
        }
        Value::Object(payload)
    }
}

/// Registration of a new participant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub specialty: String,
    pub country: String,
    pub workplace: String,
    pub phone_number: String,
    pub participation_mode: String,
    pub gdpr_consent: bool,
}

impl ParticipantForm {
    pub const MODES: [&'static str; 2] = ["online", "in_person"];

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_email(&mut errors, &self.email);
        if self.password.chars().count() < 6 {
            errors.add("password", "Le mot de passe doit contenir au moins 6 caractères");
        }
        check_min(&mut errors, "firstName", &self.first_name, 2, "Le prénom doit contenir au moins 2 caractères");
        check_min(&mut errors, "lastName", &self.last_name, 2, "Le nom doit contenir au moins 2 caractères");
        check_min(&mut errors, "title", &self.title, 1, "Le titre est requis");
        check_min(&mut errors, "specialty", &self.specialty, 2, "La spécialité doit contenir au moins 2 caractères");
        check_min(&mut errors, "country", &self.country, 2, "Le pays doit contenir au moins 2 caractères");
        check_min(&mut errors, "workplace", &self.workplace, 2, "Le lieu d'exercice doit contenir au moins 2 caractères");
        check_min(&mut errors, "phoneNumber", &self.phone_number, 5, "Le numéro de téléphone doit contenir au moins 5 caractères");
        if !Self::MODES.contains(&self.participation_mode.as_str()) {
            errors.add("participationMode", "Le mode de participation doit être en ligne ou en présentiel");
        }
        if !self.gdpr_consent {
            errors.add("gdprConsent", "Le consentement au traitement des données est requis");
        }

        errors.into_result()
    }

    pub fn payload(&self) -> Value {
        json!({
            "email": self.email.trim(),
            "password": self.password,
            "firstName": self.first_name.trim(),
            "lastName": self.last_name.trim(),
            "title": self.title.trim(),
            "specialty": self.specialty.trim(),
            "country": self.country.trim(),
            "workplace": self.workplace.trim(),
            "phoneNumber": self.phone_number.trim(),
            "participationMode": self.participation_mode,
            "gdprConsent": self.gdpr_consent,
        })
    }
}

/// Edit form of the current user's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub specialty: String,
    pub phone_number: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.first_name.trim().is_empty() {
            errors.add("firstName", "Le prénom est requis");
        }
        if self.last_name.trim().is_empty() {
            errors.add("lastName", "Le nom est requis");
        }
        errors.into_result()
    }

    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("firstName".into(), json!(self.first_name.trim()));
        payload.insert("lastName".into(), json!(self.last_name.trim()));
        insert_non_empty(&mut payload, "title", &self.title);
        insert_non_empty(&mut payload, "specialty", &self.specialty);
        insert_non_empty(&mut payload, "phoneNumber", &self.phone_number);
        Value::Object(payload)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub from: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Le mot de passe est requis");
        }
        errors.into_result()
    }

    pub fn payload(&self) -> Value {
        json!({ "email": self.email.trim(), "password": self.password })
    }
}

pub const LOGIN_INVALID: &str = "Email ou mot de passe incorrect. Veuillez réessayer.";
pub const LOGIN_UNREACHABLE: &str =
    "Impossible de se connecter au serveur. Vérifiez votre connexion internet.";
pub const LOGIN_GENERIC: &str = "Une erreur est survenue. Veuillez réessayer plus tard.";
pub const LOGIN_STAFF_ONLY: &str =
    "Vous n'avez pas accès à l'administration. Veuillez contacter un administrateur si besoin.";

/// Message shown when the backend refuses a login
pub fn login_message(err: &BackendError) -> String {
    match err {
        BackendError::Network(_) => LOGIN_UNREACHABLE.to_string(),
        BackendError::InvalidBody(_) => LOGIN_GENERIC.to_string(),
        BackendError::Status { .. } | BackendError::UnreadableStatus { .. } => {
            let message = err.message();
            let refused = matches!(err.status(), Some(StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED));
            if refused || message == Some("Unauthorized") {
                LOGIN_INVALID.to_string()
            } else {
                message.unwrap_or(LOGIN_GENERIC).to_string()
            }
        }
    }
}

/// Kind of system-user mutation an error message is produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Save,
    Delete,
}

fn raw_message(status: StatusCode, message: Option<&str>) -> String {
    message.map(str::to_string).unwrap_or_else(|| {
        format!(
            "Erreur {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
    })
}

/// Friendlier French text for backend errors on system-user mutations
pub fn mutation_message(err: &BackendError, mutation: Mutation) -> String {
    let (status, message) = match err {
        BackendError::Status { status, .. } | BackendError::UnreadableStatus { status } => (*status, err.message()),
        BackendError::Network(_) => {
            return "Impossible de contacter le serveur - veuillez réessayer".to_string();
        }
        BackendError::InvalidBody(_) => return "Réponse invalide du serveur".to_string(),
    };

    let text = match (status.as_u16(), mutation) {
        (400, Mutation::Save) => {
            let raw = raw_message(status, message);
            if raw.contains("email") {
                "Cette adresse email est déjà utilisée"
            } else if raw.contains("password") {
                "Le mot de passe ne respecte pas les critères de sécurité"
            } else if raw.contains("role") {
                "Le rôle sélectionné n'est pas valide"
            } else if raw.contains("required") {
                "Tous les champs obligatoires doivent être remplis"
            } else {
                "Les données fournies sont incomplètes ou incorrectes"
            }
        }
        (401, _) => "Session expirée - veuillez vous reconnecter",
        (403, Mutation::Save) => "Vous n'avez pas les permissions pour effectuer cette action",
        (403, Mutation::Delete) => "Vous n'avez pas les permissions pour supprimer cet utilisateur",
        (404, _) => "Utilisateur introuvable",
        (409, Mutation::Save) => "Un utilisateur avec cette adresse email existe déjà",
        (409, Mutation::Delete) => {
            "Impossible de supprimer cet utilisateur (peut-être en cours d'utilisation)"
        }
        (422, Mutation::Save) => "Les données fournies ne respectent pas le format attendu",
        (500, Mutation::Save) => "Erreur interne du serveur - veuillez réessayer plus tard",
        _ => return raw_message(status, message),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: Option<&str>) -> BackendError {
        BackendError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: message.map(str::to_string),
        }
    }

    fn valid_user() -> SystemUserForm {
        SystemUserForm {
            email: "admin@forum.sn".into(),
            password: "secret1".into(),
            first_name: "Awa".into(),
            last_name: "Diop".into(),
            role: "ADMIN".into(),
            ..Default::default()
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }

    #[test]
    fn system_user_rules() {
        assert!(valid_user().validate(false).is_ok());

        let form = SystemUserForm { email: "pas-un-email".into(), ..valid_user() };
        let errors = form.validate(false).unwrap_err();
        assert_eq!(errors.get("email"), Some("Format d'email invalide"));

        let form = SystemUserForm { password: String::new(), ..valid_user() };
        assert_eq!(
            form.validate(false).unwrap_err().get("password"),
            Some("Le mot de passe est requis")
        );
        assert!(form.validate(true).is_ok());

        let form = SystemUserForm { password: "abc".into(), first_name: "A".into(), role: "USER".into(), ..valid_user() };
        let errors = form.validate(true).unwrap_err();
        assert_eq!(errors.fields.len(), 3);
        assert_eq!(errors.get("firstName"), Some("Le prénom doit contenir au moins 2 caractères"));
    }

    #[test]
    fn first_error_follows_form_order() {
        let form = SystemUserForm { password: "abc".into(), first_name: "A".into(), ..valid_user() };
        let errors = form.validate(false).unwrap_err();
        assert_eq!(errors.first(), Some("Le mot de passe doit contenir au moins 6 caractères"));

        let fields = serde_json::to_value(&errors.fields).unwrap();
        assert_eq!(fields["firstName"], "Le prénom doit contenir au moins 2 caractères");
        assert_eq!(fields.as_object().unwrap().len(), 2);
    }

    #[test]
    fn forwarded_account_bodies_only_need_an_email() {
        let participant = json!({"email": "p@forum.sn", "participationMode": "online", "gdprConsent": true});
        assert!(check_account_email(&participant).is_ok());

        let errors = check_account_email(&json!({"firstName": "Ali"})).unwrap_err();
        assert_eq!(errors.get("email"), Some("L'email est requis"));
        let errors = check_account_email(&json!({"email": "p@forum"})).unwrap_err();
        assert_eq!(errors.first(), Some("Format d'email invalide"));
    }

    #[test]
    fn empty_password_is_left_out() {
        let form = SystemUserForm { password: String::new(), ..valid_user() };
        let payload = form.payload();
        assert!(payload.get("password").is_none());
        assert_eq!(payload["role"], "ADMIN");
        assert!(payload.get("title").is_none());
    }

    #[test]
    fn participant_rules() {
        let form = ParticipantForm {
            email: "p@forum.sn".into(),
            password: "secret1".into(),
            first_name: "Ali".into(),
            last_name: "Ba".into(),
            title: "Dr".into(),
            specialty: "Oncologie".into(),
            country: "Sénégal".into(),
            workplace: "CHU Fann".into(),
            phone_number: "+221 77".into(),
            participation_mode: "online".into(),
            gdpr_consent: true,
        };
        assert!(form.validate().is_ok());

        let bad = ParticipantForm { participation_mode: "hybrid".into(), phone_number: "12".into(), ..form };
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("participationMode").is_some());
        assert!(errors.get("phoneNumber").is_some());
    }

    #[test]
    fn profile_and_login_rules() {
        assert!(ProfileForm::default().validate().unwrap_err().get("lastName").is_some());
        let login = LoginForm { email: "x".into(), password: String::new(), from: None };
        let errors = login.validate().unwrap_err();
        assert_eq!(errors.first(), Some("Format d'email invalide"));
        assert_eq!(errors.fields.len(), 2);
    }

    #[test]
    fn login_errors_are_remapped() {
        assert_eq!(login_message(&status(401, None)), LOGIN_INVALID);
        assert_eq!(login_message(&status(500, Some("Unauthorized"))), LOGIN_INVALID);
        assert_eq!(login_message(&status(503, Some("Maintenance"))), "Maintenance");
        assert_eq!(login_message(&status(503, None)), LOGIN_GENERIC);
        let unreadable = BackendError::UnreadableStatus { status: StatusCode::UNAUTHORIZED };
        assert_eq!(login_message(&unreadable), LOGIN_INVALID);
    }

    #[test]
    fn mutation_errors_are_remapped() {
        assert_eq!(
            mutation_message(&status(400, Some("email must be unique")), Mutation::Save),
            "Cette adresse email est déjà utilisée"
        );
        assert_eq!(
            mutation_message(&status(400, Some("bad")), Mutation::Save),
            "Les données fournies sont incomplètes ou incorrectes"
        );
        assert_eq!(
            mutation_message(&status(409, None), Mutation::Delete),
            "Impossible de supprimer cet utilisateur (peut-être en cours d'utilisation)"
        );
        assert_eq!(mutation_message(&status(404, None), Mutation::Save), "Utilisateur introuvable");
        assert_eq!(mutation_message(&status(418, None), Mutation::Delete), "Erreur 418: I'm a teapot");
    }
}
