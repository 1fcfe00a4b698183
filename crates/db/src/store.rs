use photon_core::error::CoreError;
use photon_core::store::PlayerStore;
use photon_core::types::PlayerId;

use crate::repositories::PlayerRepo;
use crate::DbPool;

/// [`PlayerStore`] backed by the `players` table.
#[derive(Debug, Clone)]
pub struct PgPlayerStore {
    pool: DbPool,
}

impl PgPlayerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn unavailable(err: sqlx::Error) -> CoreError {
    CoreError::StoreUnavailable(err.to_string())
}

impl PlayerStore for PgPlayerStore {
    async fn lookup(&self, player_id: PlayerId) -> Result<Option<String>, CoreError> {
        PlayerRepo::find_by_id(&self.pool, player_id)
            .await
            .map(|player| player.map(|p| p.codename))
            .map_err(|e| {
                tracing::error!(player_id, error = %e, "Player lookup failed");
                unavailable(e)
            })
    }

    async fn upsert(&self, player_id: PlayerId, codename: &str) -> Result<(), CoreError> {
        let inserted = PlayerRepo::insert_if_absent(&self.pool, player_id, codename)
            .await
            .map_err(|e| {
                tracing::error!(player_id, error = %e, "Player insert failed");
                unavailable(e)
            })?;

        if inserted {
            tracing::info!(player_id, codename, "Registered new player");
        } else {
            tracing::debug!(player_id, "Player already registered, codename kept");
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("Database pool closed");
        }
    }
}
