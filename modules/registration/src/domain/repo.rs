use crate::contract::model::User;
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a failed insert, split so the domain can tell a uniqueness
/// violation apart from every other storage failure.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a fully-formed domain user and return the stored row.
    ///
    /// Email uniqueness is enforced by storage; a violation must surface as
    /// [`InsertError::DuplicateEmail`].
    async fn insert(&self, u: User) -> Result<User, InsertError>;

    /// Load a user by email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
}
