//! Capacity-bounded, per-session team rosters.
//!
//! Rows live only for the session; nothing here is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::team::Team;
use crate::types::{EquipmentId, PlayerId};

/// Maximum number of players a single team can hold.
pub const MAX_PLAYERS_PER_TEAM: usize = 15;

/// A checked-in player with their assigned equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub player_id: PlayerId,
    pub codename: String,
    pub equipment_id: EquipmentId,
}

impl fmt::Display for PlayerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | eq:{}",
            self.player_id, self.codename, self.equipment_id
        )
    }
}

/// Ordered list of [`PlayerRow`]s for one team, never longer than
/// [`MAX_PLAYERS_PER_TEAM`].
#[derive(Debug, Clone)]
pub struct Roster {
    team: Team,
    rows: Vec<PlayerRow>,
}

impl Roster {
    pub fn new(team: Team) -> Self {
        Self {
            team,
            rows: Vec::with_capacity(MAX_PLAYERS_PER_TEAM),
        }
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= MAX_PLAYERS_PER_TEAM
    }

    pub fn rows(&self) -> &[PlayerRow] {
        &self.rows
    }

    /// Fails with [`CoreError::TeamFull`] when the roster is at capacity;
    /// the roster is unchanged in that case.
    pub fn ensure_capacity(&self) -> Result<(), CoreError> {
        if self.is_full() {
            return Err(CoreError::TeamFull {
                team: self.team,
                capacity: MAX_PLAYERS_PER_TEAM,
            });
        }
        Ok(())
    }

    /// Append a row, rejecting it if the roster is already full.
    pub fn push(&mut self, row: PlayerRow) -> Result<(), CoreError> {
        self.ensure_capacity()?;
        self.rows.push(row);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
