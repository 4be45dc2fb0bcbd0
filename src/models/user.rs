// User data model
// Matches the users/{uid} document structure

use serde::{Deserialize, Serialize};

use crate::api::auth::Principal;

/// Platform role stored on the user document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Full user document
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserRecord {
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserRecord {
    /// Build a user document from a verified principal (first sign-in)
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            email: principal.email.clone(),
            display_name: principal.display_name.clone(),
            photo_url: principal.photo_url.clone(),
            role: Role::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_user() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "email": "a@b.c"
        }))
        .unwrap();
        assert_eq!(record.role, Role::User);
    }

    #[test]
    fn test_role_round_trip() {
        let v = serde_json::to_value(Role::Admin).unwrap();
        assert_eq!(v, serde_json::json!("admin"));
    }
}
