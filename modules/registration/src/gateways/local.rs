use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{client::RegistrationApi, error::RegistrationError, model::User};
use crate::domain::service::Service;

/// Local implementation of the RegistrationApi trait that delegates to the domain service
pub struct RegistrationLocalClient {
    service: Arc<Service>,
}

impl RegistrationLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RegistrationApi for RegistrationLocalClient {
    async fn register(&self, email: &str, password: &str) -> Result<User, RegistrationError> {
        self.service
            .register(Some(email.to_owned()), Some(password.to_owned()))
            .await
            .map_err(RegistrationError::from)
    }
}
