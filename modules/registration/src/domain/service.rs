use std::sync::Arc;

use crate::contract::model::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::password::PasswordHasher;
use crate::domain::repo::{InsertError, UsersRepository};
use chrono::Utc;
use tracing::{debug, field::Empty, info, instrument, warn, Span};
use uuid::Uuid;

/// Domain service with the registration rules.
/// Depends only on the repository and hasher ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn UsersRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repo, hasher }
    }

    /// Register a new user.
    ///
    /// Absent and empty values are both treated as missing; no format checks
    /// are applied. Email uniqueness is left to storage so that racing
    /// registrations for the same address produce exactly one row.
    #[instrument(
        name = "registration.service.register",
        skip_all,
        fields(email = Empty, user_id = Empty)
    )]
    pub async fn register(
        &self,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<User, DomainError> {
        let new_user = Self::require_credentials(email, password)?;
        Span::current().record("email", new_user.email.as_str());
        info!("Registering new user");

        let password_hash = self.hash_off_runtime(new_user.password).await?;

        let email = new_user.email;
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        match self.repo.insert(user).await {
            Ok(stored) => {
                Span::current().record("user_id", tracing::field::display(stored.id));
                info!("Successfully registered user");
                Ok(stored)
            }
            Err(InsertError::DuplicateEmail) => {
                warn!("Email already registered");
                Err(DomainError::email_already_registered(email))
            }
            Err(InsertError::Other(e)) => Err(DomainError::database(format!("{e:#}"))),
        }
    }

    fn require_credentials(
        email: Option<String>,
        password: Option<String>,
    ) -> Result<NewUser, DomainError> {
        match (email, password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok(NewUser { email, password })
            }
            _ => {
                debug!("Rejecting registration with missing credentials");
                Err(DomainError::missing_credentials())
            }
        }
    }

    /// Hashing is CPU-bound; run it on the blocking pool.
    async fn hash_off_runtime(&self, password: String) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::password_hashing(e.to_string()))?
    }
}
