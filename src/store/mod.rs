//! Persistence layer: PostgreSQL connection pooling plus the repository
//! traits the scheduling manager is written against.
//!
//! Storage is trait-based so the orchestrator can run on Postgres in
//! production and on [`memory::MemoryStore`] in embedded and test setups.

use sqlx::postgres::{PgPool, PgPoolOptions};

pub mod config;
pub mod errors;
pub mod memory;
pub mod pg;
pub mod repository;

pub use config::DatabaseConfig;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pg::{PgMatchStore, PgRegistrationStore, PgTournamentStore};
pub use repository::{MatchStore, RegistrationStore, TournamentStore};

/// Shared connection pool behind the three Postgres store implementations.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool against `config`.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// The three repository implementations sharing this pool, ready to be
    /// handed to the scheduling manager.
    pub fn stores(&self) -> (PgTournamentStore, PgRegistrationStore, PgMatchStore) {
        (
            PgTournamentStore::new(self.pool.clone()),
            PgRegistrationStore::new(self.pool.clone()),
            PgMatchStore::new(self.pool.clone()),
        )
    }

    /// Round-trip a trivial query to verify the connection
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(self) {
        self.pool.close().await;
    }
}
