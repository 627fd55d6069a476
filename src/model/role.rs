use serde::{Deserialize, Serialize};

/// Exclusive capability class of an authenticated identity.
/// An admin is not an employee for employee-only endpoints, and vice versa.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Admin,
}

impl Role {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "employee" => Some(Role::Employee),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_round_trip() {
        assert_eq!(Role::from_str("employee"), Some(Role::Employee));
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::Employee.as_str(), "employee");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(Role::from_str("hr"), None);
        assert_eq!(Role::from_str("Admin"), None);
        assert_eq!(Role::from_str(""), None);
    }

    #[test]
    fn role_serializes_as_lowercase_string() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(parsed, Role::Employee);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }
}
