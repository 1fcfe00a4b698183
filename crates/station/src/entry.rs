//! Player entry: roster intake for both teams.
//!
//! [`EntryScreen`] owns the two rosters, the player store and the datagram
//! channel. Operator actions arrive one at a time, so rosters need no
//! locking; inbound datagrams are never applied here directly.
//!
//! A pending entry moves through [`EntryState`]:
//! `Empty → PlayerIdEntered → Found | NotFound → CodenameResolved →
//! EquipmentIdEntered → Committed`. The states track operator progress;
//! [`EntryScreen::add_player`] re-validates every field regardless.

use photon_core::error::CoreError;
use photon_core::roster::{PlayerRow, Roster};
use photon_core::store::PlayerStore;
use photon_core::team::Team;
use photon_core::validation::{normalize_codename, parse_equipment_id, parse_player_id};
use photon_net::DatagramChannel;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    PlayerIdEntered,
    Found,
    NotFound,
    CodenameResolved,
    EquipmentIdEntered,
    Committed,
}

/// Raw field values of the entry being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryForm {
    pub team: Team,
    pub player_id: String,
    pub codename: String,
    pub equipment_id: String,
    pub state: EntryState,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self {
            team: Team::Red,
            player_id: String::new(),
            codename: String::new(),
            equipment_id: String::new(),
            state: EntryState::Empty,
        }
    }
}

impl EntryForm {
    /// Clear the text fields for the next entry. The selected team stays.
    fn reset_fields(&mut self) {
        self.player_id.clear();
        self.codename.clear();
        self.equipment_id.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
}

/// Where the codename of a committed row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodenameSource {
    /// The store already knew the player; its codename wins.
    Stored,
    /// New player registered with the codename the operator typed.
    Operator,
}

/// Result of a successful check-in.
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub team: Team,
    pub row: PlayerRow,
    pub codename_source: CodenameSource,
    /// Set when the equipment broadcast failed. The row is still committed.
    pub broadcast_error: Option<String>,
}

/// Finalized rosters handed to the game-start phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStart {
    pub red: Vec<PlayerRow>,
    pub green: Vec<PlayerRow>,
}

pub struct EntryScreen<S> {
    store: S,
    channel: DatagramChannel,
    red: Roster,
    green: Roster,
    form: EntryForm,
}

impl<S: PlayerStore> EntryScreen<S> {
    pub fn new(store: S, channel: DatagramChannel) -> Self {
        Self {
            store,
            channel,
            red: Roster::new(Team::Red),
            green: Roster::new(Team::Green),
            form: EntryForm::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn channel(&self) -> &DatagramChannel {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut DatagramChannel {
        &mut self.channel
    }

    pub fn roster(&self, team: Team) -> &Roster {
        match team {
            Team::Red => &self.red,
            Team::Green => &self.green,
        }
    }

    fn roster_mut(&mut self, team: Team) -> &mut Roster {
        match team {
            Team::Red => &mut self.red,
            Team::Green => &mut self.green,
        }
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    // -----------------------------------------------------------------------
    // Direct operations
    // -----------------------------------------------------------------------

    /// Look up the stored codename for a typed player id.
    pub async fn lookup(&self, player_id: &str) -> Result<LookupOutcome, CoreError> {
        let player_id = parse_player_id(player_id)?;
        match self.store.lookup(player_id).await? {
            Some(codename) => Ok(LookupOutcome::Found(codename)),
            None => Ok(LookupOutcome::NotFound),
        }
    }

    /// Validate, register and check in one player, then broadcast their
    /// equipment id.
    ///
    /// Nothing is mutated when validation or the store fails. A failed
    /// broadcast is reported in [`CheckIn::broadcast_error`] only.
    pub async fn add_player(
        &mut self,
        team: Team,
        player_id: &str,
        codename: &str,
        equipment_id: &str,
    ) -> Result<CheckIn, CoreError> {
        let player_id = parse_player_id(player_id)?;
        let typed_codename = normalize_codename(codename)?;
        let equipment_id = parse_equipment_id(equipment_id)?;
        self.roster(team).ensure_capacity()?;

        let (codename, codename_source) = match self.store.lookup(player_id).await? {
            Some(stored) => (stored, CodenameSource::Stored),
            None => {
                self.store.upsert(player_id, &typed_codename).await?;
                (typed_codename, CodenameSource::Operator)
            }
        };

        let row = PlayerRow {
            player_id,
            codename,
            equipment_id,
        };
        self.roster_mut(team).push(row.clone())?;

        tracing::info!(
            team = %team,
            player_id,
            codename = %row.codename,
            equipment_id,
            "Player checked in",
        );

        let broadcast_error = match self.channel.send_equipment_id(equipment_id).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(equipment_id, error = %e, "Equipment broadcast failed");
                Some(e.to_string())
            }
        };

        Ok(CheckIn {
            team,
            row,
            codename_source,
            broadcast_error,
        })
    }

    /// Empty both rosters. Stored players are untouched.
    pub fn clear_all(&mut self) {
        self.red.clear();
        self.green.clear();
        tracing::info!("Rosters cleared");
    }

    /// Snapshot both rosters for the game-start hand-off.
    pub fn start(&self) -> GameStart {
        GameStart {
            red: self.red.rows().to_vec(),
            green: self.green.rows().to_vec(),
        }
    }

    pub fn target_ip(&self) -> std::net::IpAddr {
        self.channel.target_ip()
    }

    /// Accepts an IP literal or a resolvable host name.
    pub async fn set_target_ip(&mut self, host: &str) -> Result<(), CoreError> {
        self.channel.set_target_ip(host).await.map_err(CoreError::from)
    }

    /// Close the store, then the channel.
    pub async fn shutdown(mut self) {
        self.store.close().await;
        self.channel.close().await;
    }

    // -----------------------------------------------------------------------
    // Form-driven flow
    // -----------------------------------------------------------------------

    pub fn set_team(&mut self, team: Team) {
        self.form.team = team;
    }

    pub fn enter_player_id(&mut self, raw: &str) {
        self.form.player_id = raw.trim().to_string();
        self.form.state = if self.form.player_id.is_empty() {
            EntryState::Empty
        } else {
            EntryState::PlayerIdEntered
        };
    }

    /// Look up the form's player id and fill in the codename when found.
    /// On a miss the codename field is cleared for the operator to type.
    pub async fn lookup_form(&mut self) -> Result<LookupOutcome, CoreError> {
        let outcome = self.lookup(&self.form.player_id).await?;
        match &outcome {
            LookupOutcome::Found(codename) => {
                self.form.codename = codename.clone();
                self.form.state = EntryState::Found;
            }
            LookupOutcome::NotFound => {
                self.form.codename.clear();
                self.form.state = EntryState::NotFound;
            }
        }
        Ok(outcome)
    }

    pub fn enter_codename(&mut self, raw: &str) {
        self.form.codename = raw.trim().to_string();
        self.form.state = EntryState::CodenameResolved;
    }

    pub fn enter_equipment_id(&mut self, raw: &str) {
        self.form.equipment_id = raw.trim().to_string();
        self.form.state = EntryState::EquipmentIdEntered;
    }

    /// Commit the form. Fields are cleared on success and kept on failure.
    pub async fn submit(&mut self) -> Result<CheckIn, CoreError> {
        let form = self.form.clone();
        let check_in = self
            .add_player(form.team, &form.player_id, &form.codename, &form.equipment_id)
            .await?;
        self.form.reset_fields();
        self.form.state = EntryState::Committed;
        Ok(check_in)
    }
}
