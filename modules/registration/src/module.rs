use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::RegistrationConfig;
use crate::contract::client::RegistrationApi;
use crate::domain::password::Argon2Hasher;
use crate::domain::service::Service;
use crate::gateways::local::RegistrationLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmUsersRepository;

/// Wires the registration module: storage adapter → domain service → REST / local client.
#[derive(Clone)]
pub struct Registration {
    db: DatabaseConnection,
    service: Arc<Service>,
}

impl Registration {
    /// Build the module on top of an already connected database handle.
    pub fn new(db: DatabaseConnection, cfg: RegistrationConfig) -> anyhow::Result<Self> {
        info!("Initializing registration module");
        debug!(
            "Loaded registration config: argon2 m={} t={} p={}",
            cfg.argon2_memory_kib, cfg.argon2_iterations, cfg.argon2_parallelism
        );

        let hasher = Argon2Hasher::new(
            cfg.argon2_memory_kib,
            cfg.argon2_iterations,
            cfg.argon2_parallelism,
        )
        .context("invalid argon2 parameters")?;

        // Wire repository (infra) to domain service (port)
        let repo = SeaOrmUsersRepository::new(db.clone());
        let service = Service::new(Arc::new(repo), Arc::new(hasher));

        Ok(Self {
            db,
            service: Arc::new(service),
        })
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running registration database migrations");
        Migrator::up(&self.db, None)
            .await
            .context("registration migrations failed")?;
        info!("Registration database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn RegistrationApi> {
        Arc::new(RegistrationLocalClient::new(self.service()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering registration REST routes");
        routes::register_routes(router, self.service())
    }
}
