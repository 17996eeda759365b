//! User model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User id (also used as document ID)
    pub id: Uuid,
    /// Email address (unique, checked at registration)
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Argon2 password hash (PHC string format)
    pub password_hash: String,
    /// Whether this user can manage challenges and storage
    #[serde(default)]
    pub is_admin: bool,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

impl User {
    /// First letter of the last name, as shown on the leaderboard.
    pub fn last_initial(&self) -> String {
        self.last_name
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(last_name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: last_name.to_string(),
            password_hash: String::new(),
            is_admin: false,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_last_initial() {
        assert_eq!(make_user("Doe").last_initial(), "D");
    }

    #[test]
    fn test_last_initial_empty_last_name() {
        assert_eq!(make_user("").last_initial(), "");
    }
}
