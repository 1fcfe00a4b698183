//! Repository for the `players` table.

use photon_core::types::PlayerId;
use sqlx::PgPool;

use crate::models::player::Player;

/// Column list for `players` queries.
const COLUMNS: &str = "id, codename, created_at";

/// Provides query operations for player records.
pub struct PlayerRepo;

impl PlayerRepo {
    /// Find a player by id.
    pub async fn find_by_id(pool: &PgPool, id: PlayerId) -> Result<Option<Player>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM players WHERE id = $1");
        sqlx::query_as::<_, Player>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a player unless the id already exists.
    ///
    /// Returns `true` when a row was inserted. An existing codename is
    /// never overwritten.
    pub async fn insert_if_absent(
        pool: &PgPool,
        id: PlayerId,
        codename: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO players (id, codename) VALUES ($1, $2) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(codename)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Total number of registered players.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players")
            .fetch_one(pool)
            .await
    }
}
