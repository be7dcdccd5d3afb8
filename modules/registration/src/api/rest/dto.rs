use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::User;

/// REST DTO for the registered user. Password material never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// `POST /register` body. Both fields are optional at the wire level so that
/// absent and `null` values reach the presence check instead of failing decoding.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterReq {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for RegisterReq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterReq")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Successful registration envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResp {
    pub message: String,
    pub user: UserDto,
}

/// Error envelope shared by every failure status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
