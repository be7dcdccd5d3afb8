use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Internal error")]
    Internal,
}

impl RegistrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(email: impl Into<String>) -> Self {
        Self::Conflict {
            email: email.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for RegistrationError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            MissingCredentials => Self::validation("Email and password are required"),
            EmailAlreadyRegistered { email } => Self::conflict(email),
            PasswordHashing { .. } | Database { .. } => Self::internal(),
        }
    }
}
