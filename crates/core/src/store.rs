//! Player persistence contract and an in-memory implementation.
//!
//! Write policy for every implementation is **insert-if-absent**: once a
//! player id has a codename, later writes for that id leave it untouched.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::types::PlayerId;

/// Lookup and registration of player codenames.
///
/// Transport-level failures surface as [`CoreError::StoreUnavailable`];
/// an unknown id is `Ok(None)`, not an error.
pub trait PlayerStore: Send + Sync {
    /// Return the codename stored for `player_id`, if any.
    fn lookup(
        &self,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    /// Store `codename` for `player_id` unless the id already exists.
    fn upsert(
        &self,
        player_id: PlayerId,
        codename: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Release the underlying connection. Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Process-local store used in offline mode and tests.
#[derive(Debug, Default)]
pub struct InMemoryPlayerStore {
    players: RwLock<HashMap<PlayerId, String>>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, e.g. with fixtures.
    pub fn with_players<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = (PlayerId, S)>,
        S: Into<String>,
    {
        let players = players
            .into_iter()
            .map(|(id, codename)| (id, codename.into()))
            .collect();
        Self {
            players: RwLock::new(players),
        }
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

impl PlayerStore for InMemoryPlayerStore {
    async fn lookup(&self, player_id: PlayerId) -> Result<Option<String>, CoreError> {
        Ok(self.players.read().await.get(&player_id).cloned())
    }

    async fn upsert(&self, player_id: PlayerId, codename: &str) -> Result<(), CoreError> {
        let mut players = self.players.write().await;
        players
            .entry(player_id)
            .or_insert_with(|| codename.to_string());
        Ok(())
    }

    async fn close(&self) {}
}
