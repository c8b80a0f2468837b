//! Identity of the signed-in user

use serde::{Deserialize, Serialize};
use supabase_todo_auth::User;

/// The authenticated user as the rest of the client sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// Name given at sign up
    pub display_name: Option<String>,
}

impl Identity {
    /// Name to greet the user with: display name, else the part of the email
    /// before `@`, else `"User"`.
    pub fn greeting_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_string()
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(display_name: Option<&str>, email: Option<&str>) -> Identity {
        Identity {
            id: "u1".to_string(),
            email: email.map(str::to_string),
            display_name: display_name.map(str::to_string),
        }
    }

    #[test]
    fn test_greeting_name_fallbacks() {
        assert_eq!(identity(Some("Ada"), Some("ada@example.com")).greeting_name(), "Ada");
        assert_eq!(identity(None, Some("ada@example.com")).greeting_name(), "ada");
        assert_eq!(identity(Some(""), None).greeting_name(), "User");
    }

    #[test]
    fn test_from_user_reads_metadata_name() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "ada@example.com",
            "user_metadata": { "name": "Ada Lovelace" }
        }))
        .unwrap();

        let identity = Identity::from(&user);
        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
    }
}
