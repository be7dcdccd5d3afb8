use sea_orm::Set;

use crate::contract::model::User;
use crate::infra::storage::entity::{ActiveModel, Model};

impl From<Model> for User {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            password_hash: m.password_hash,
            created_at: m.created_at,
        }
    }
}

impl From<User> for ActiveModel {
    fn from(u: User) -> Self {
        Self {
            id: Set(u.id),
            email: Set(u.email),
            password_hash: Set(u.password_hash),
            created_at: Set(u.created_at),
        }
    }
}
