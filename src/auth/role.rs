use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role as issued by the backend
///
/// Unknown role strings are kept verbatim so they can still be displayed,
/// but they never grant access to the dashboard. A missing role is an empty
/// unknown role, never `USER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SpAdmin,
    Admin,
    Manager,
    User,
    Other(String),
}

impl Role {
    /// Roles that can be assigned to system users from the dashboard
    pub const ASSIGNABLE: [Role; 3] = [Role::SpAdmin, Role::Admin, Role::Manager];

    pub fn as_str(&self) -> &str {
        match self {
            Role::SpAdmin => "SPADMIN",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
            Role::Other(raw) => raw,
        }
    }

    /// French label shown in tables and badges
    pub fn label(&self) -> &str {
        match self {
            Role::SpAdmin => "Super Administrateur",
            Role::Admin => "Administrateur",
            Role::Manager => "Manager",
            Role::User => "Participant",
            Role::Other(raw) => raw,
        }
    }

    /// Badge colour used by the stylesheet
    pub fn color(&self) -> &'static str {
        match self {
            Role::SpAdmin => "red",
            Role::Admin => "blue",
            Role::Manager => "green",
            Role::User | Role::Other(_) => "gray",
        }
    }

    /// SPADMIN, ADMIN and MANAGER may use the dashboard
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::SpAdmin | Role::Admin | Role::Manager)
    }

    /// Strict parse used by forms: only the three staff roles are accepted
    pub fn parse_assignable(raw: &str) -> Option<Role> {
        let role = Role::from(raw.trim().to_string());
        role.is_staff().then_some(role)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SPADMIN" => Role::SpAdmin,
            "ADMIN" => Role::Admin,
            "MANAGER" => Role::Manager,
            "USER" => Role::User,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_role_names() {
        assert_eq!(Role::from("SPADMIN".to_string()), Role::SpAdmin);
        assert_eq!(Role::from("admin".to_string()), Role::Admin);
        assert_eq!(Role::from("USER".to_string()), Role::User);
        assert_eq!(
            Role::from("AUDITOR".to_string()),
            Role::Other("AUDITOR".to_string())
        );
    }

    #[test]
    fn only_staff_roles_reach_the_dashboard() {
        assert!(Role::SpAdmin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::User.is_staff());
        assert!(!Role::Other("AUDITOR".into()).is_staff());
    }

    #[test]
    fn missing_role_is_unknown() {
        assert_eq!(Role::default(), Role::Other(String::new()));
        assert_ne!(Role::default(), Role::User);
        assert!(!Role::default().is_staff());
    }

    #[test]
    fn labels_are_french() {
        assert_eq!(Role::SpAdmin.label(), "Super Administrateur");
        assert_eq!(Role::User.label(), "Participant");
        assert_eq!(Role::parse_assignable("USER"), None);
        assert_eq!(Role::parse_assignable("manager"), Some(Role::Manager));
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let role: Role = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, Role::Manager);
        assert_eq!(serde_json::to_string(&Role::SpAdmin).unwrap(), "\"SPADMIN\"");
    }
}
