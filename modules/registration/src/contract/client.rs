use async_trait::async_trait;

use crate::contract::{error::RegistrationError, model::User};

/// Public API trait for the registration module that other modules can use
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Register a new account. Both fields must be present and non-empty.
    async fn register(&self, email: &str, password: &str) -> Result<User, RegistrationError>;
}
