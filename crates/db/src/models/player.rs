//! Player record model.

use chrono::{DateTime, Utc};
use photon_core::types::PlayerId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `players` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub codename: String,
    pub created_at: DateTime<Utc>,
}
