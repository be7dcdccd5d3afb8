use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("User with email '{email}' already exists")]
    EmailAlreadyRegistered { email: String },

    #[error("Password hashing failed: {message}")]
    PasswordHashing { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn missing_credentials() -> Self {
        Self::MissingCredentials
    }

    pub fn email_already_registered(email: impl Into<String>) -> Self {
        Self::EmailAlreadyRegistered {
            email: email.into(),
        }
    }

    pub fn password_hashing(message: impl Into<String>) -> Self {
        Self::PasswordHashing {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
