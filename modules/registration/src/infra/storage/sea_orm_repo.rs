//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait`, so you can construct it
//! with a `DatabaseConnection` **or** a transactional connection.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr,
};

use crate::contract::User;
use crate::domain::repo::{InsertError, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// SQLite reports 2067/1555, PostgreSQL SQLSTATE 23505; SeaORM folds both
/// into `SqlErr::UniqueConstraintViolation`.
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, u: User) -> Result<User, InsertError> {
        let m: UserAM = u.into();
        match m.insert(&self.conn).await {
            Ok(stored) => Ok(stored.into()),
            Err(e) if is_unique_violation(&e) => Err(InsertError::DuplicateEmail),
            Err(e) => Err(InsertError::Other(anyhow::Error::new(e).context("insert failed"))),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }
}
