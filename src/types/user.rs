//! User accounts, roles and login state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dashboard role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Teacher,
    Librarian,
    Warden,
    Accountant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Librarian => "librarian",
            Role::Warden => "warden",
            Role::Accountant => "accountant",
        };
        f.write_str(label)
    }
}

/// Role-specific profile, keyed by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Admin,
    #[serde(rename_all = "camelCase")]
    Student {
        roll_number: String,
        department: String,
        semester: u8,
    },
    #[serde(rename_all = "camelCase")]
    Teacher {
        employee_id: String,
        department: String,
        #[serde(default)]
        subjects: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Librarian { employee_id: String },
    #[serde(rename_all = "camelCase")]
    Warden { employee_id: String, hostel: String },
    #[serde(rename_all = "camelCase")]
    Accountant { employee_id: String },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Admin => Role::Admin,
            RoleProfile::Student { .. } => Role::Student,
            RoleProfile::Teacher { .. } => Role::Teacher,
            RoleProfile::Librarian { .. } => Role::Librarian,
            RoleProfile::Warden { .. } => Role::Warden,
            RoleProfile::Accountant { .. } => Role::Accountant,
        }
    }
}

/// Failed-login counter and lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginState {
    pub attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile: RoleProfile,
    pub login: LoginState,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserAccount {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Whether this account is the given student, by username or roll number
    pub fn is_student(&self, student: &str) -> bool {
        match &self.profile {
            RoleProfile::Student { roll_number, .. } => {
                self.username == student || roll_number == student
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_is_tagged_by_role() {
        let json = r#"{"role":"student","rollNumber":"CS-042","department":"CS","semester":3}"#;
        let profile: RoleProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.role(), Role::Student);
        assert_eq!(
            profile,
            RoleProfile::Student {
                roll_number: "CS-042".to_string(),
                department: "CS".to_string(),
                semester: 3,
            }
        );
    }

    #[test]
    fn test_is_student_matches_username_or_roll_number() {
        let account = UserAccount {
            username: "asha".to_string(),
            password_hash: String::new(),
            profile: RoleProfile::Student {
                roll_number: "CS-001".to_string(),
                department: "CS".to_string(),
                semester: 1,
            },
            login: LoginState::default(),
            last_login: None,
        };

        assert!(account.is_student("asha"));
        assert!(account.is_student("CS-001"));
        assert!(!account.is_student("CS-002"));
    }

    #[test]
    fn test_unit_profile_round_trips_role_tag() {
        let json = serde_json::to_string(&RoleProfile::Admin).unwrap();
        assert_eq!(json, r#"{"role":"admin"}"#);
    }
}
