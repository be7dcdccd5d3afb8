use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Registered account as seen by other modules (no serde).
///
/// `password_hash` is a PHC-formatted Argon2 string, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input after presence checks.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
