//! End-to-end tests for player intake: validation, store policy, roster
//! capacity and the equipment broadcast.
//!
//! Uses the in-memory store and a loopback UDP listener in place of the
//! game-side receiver.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use assert_matches::assert_matches;
use photon_core::config::UdpConfig;
use photon_core::error::CoreError;
use photon_core::roster::{PlayerRow, MAX_PLAYERS_PER_TEAM};
use photon_core::store::{InMemoryPlayerStore, PlayerStore};
use photon_core::team::Team;
use photon_core::types::PlayerId;
use photon_net::DatagramChannel;
use photon_station::console::{self, Command, Flow};
use photon_station::entry::{CodenameSource, EntryScreen, EntryState, GameStart, LookupOutcome};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Store whose every call fails as if the database were down.
struct UnreachableStore;

impl PlayerStore for UnreachableStore {
    async fn lookup(&self, _player_id: PlayerId) -> Result<Option<String>, CoreError> {
        Err(CoreError::StoreUnavailable("connection refused".to_string()))
    }

    async fn upsert(&self, _player_id: PlayerId, _codename: &str) -> Result<(), CoreError> {
        Err(CoreError::StoreUnavailable("connection refused".to_string()))
    }

    async fn close(&self) {}
}

async fn screen_with<S: PlayerStore>(store: S) -> (EntryScreen<S>, UdpSocket) {
    let game = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let config = UdpConfig {
        target_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        send_port: game.local_addr().unwrap().port(),
        receive_port: 0,
        bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    let channel = DatagramChannel::bind(&config).await.unwrap();
    (EntryScreen::new(store, channel), game)
}

async fn recv_text(socket: &UdpSocket) -> String {
    let mut buf = [0u8; 64];
    let (len, _) = timeout(WAIT, socket.recv_from(&mut buf))
        .await
        .expect("equipment datagram should arrive")
        .unwrap();
    String::from_utf8(buf[..len].to_vec()).unwrap()
}

/// Nothing should arrive within a short window.
async fn assert_silent(socket: &UdpSocket) {
    let mut buf = [0u8; 64];
    let result = timeout(Duration::from_millis(100), socket.recv_from(&mut buf)).await;
    assert!(result.is_err(), "no datagram expected");
}

fn row(player_id: PlayerId, codename: &str, equipment_id: u32) -> PlayerRow {
    PlayerRow {
        player_id,
        codename: codename.to_string(),
        equipment_id,
    }
}

// ---------------------------------------------------------------------------
// add_player
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_player_is_persisted_added_and_broadcast() {
    let (mut screen, game) = screen_with(InMemoryPlayerStore::new()).await;

    let check_in = screen.add_player(Team::Red, "42", "Falcon", "7").await.unwrap();

    assert_eq!(check_in.row, row(42, "Falcon", 7));
    assert_eq!(check_in.codename_source, CodenameSource::Operator);
    assert_eq!(check_in.broadcast_error, None);
    assert_eq!(screen.roster(Team::Red).rows(), &[row(42, "Falcon", 7)]);
    assert!(screen.roster(Team::Green).is_empty());
    assert_eq!(
        screen.store().lookup(42).await.unwrap().as_deref(),
        Some("Falcon")
    );
    assert_eq!(recv_text(&game).await, "7");
}

#[tokio::test]
async fn stored_codename_overrides_operator_input() {
    let store = InMemoryPlayerStore::with_players([(42, "Falcon")]);
    let (mut screen, game) = screen_with(store).await;

    let check_in = screen.add_player(Team::Red, "42", "Ignored", "9").await.unwrap();

    assert_eq!(check_in.row, row(42, "Falcon", 9));
    assert_eq!(check_in.codename_source, CodenameSource::Stored);
    assert_eq!(screen.roster(Team::Red).rows(), &[row(42, "Falcon", 9)]);
    assert_eq!(
        screen.store().lookup(42).await.unwrap().as_deref(),
        Some("Falcon")
    );
    assert_eq!(recv_text(&game).await, "9");
}

#[tokio::test]
async fn non_integer_player_id_changes_nothing() {
    let (mut screen, game) = screen_with(InMemoryPlayerStore::new()).await;

    let result = screen.add_player(Team::Red, "abc", "Falcon", "7").await;

    assert_matches!(result, Err(CoreError::InvalidInput(_)));
    assert!(screen.roster(Team::Red).is_empty());
    assert!(screen.roster(Team::Green).is_empty());
    assert!(screen.store().is_empty().await);
    assert_silent(&game).await;
}

#[tokio::test]
async fn empty_codename_and_bad_equipment_id_are_invalid_input() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;

    assert_matches!(
        screen.add_player(Team::Green, "1", "   ", "7").await,
        Err(CoreError::InvalidInput(_))
    );
    assert_matches!(
        screen.add_player(Team::Green, "1", "Viper", "seven").await,
        Err(CoreError::InvalidInput(_))
    );
    assert_matches!(
        screen.add_player(Team::Green, "1", "Viper", "-3").await,
        Err(CoreError::InvalidInput(_))
    );
    assert!(screen.roster(Team::Green).is_empty());
    assert!(screen.store().is_empty().await);
}

#[tokio::test]
async fn sixteenth_player_is_rejected_with_team_full() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;

    for id in 1..=MAX_PLAYERS_PER_TEAM {
        screen
            .add_player(Team::Green, &id.to_string(), &format!("P{id}"), &id.to_string())
            .await
            .unwrap();
    }
    let before = screen.roster(Team::Green).rows().to_vec();

    let result = screen.add_player(Team::Green, "99", "Late", "99").await;

    assert_matches!(
        result,
        Err(CoreError::TeamFull {
            team: Team::Green,
            capacity: MAX_PLAYERS_PER_TEAM
        })
    );
    assert_eq!(screen.roster(Team::Green).rows(), before.as_slice());
    assert_eq!(screen.store().lookup(99).await.unwrap(), None);

    // The other team is unaffected.
    screen.add_player(Team::Red, "99", "Late", "99").await.unwrap();
    assert_eq!(screen.roster(Team::Red).len(), 1);
}

#[tokio::test]
async fn store_failure_aborts_before_roster_or_broadcast() {
    let (mut screen, game) = screen_with(UnreachableStore).await;

    let result = screen.add_player(Team::Red, "42", "Falcon", "7").await;

    assert_matches!(result, Err(CoreError::StoreUnavailable(_)));
    assert!(screen.roster(Team::Red).is_empty());
    assert_silent(&game).await;
}

#[tokio::test]
async fn broadcast_failure_still_commits_the_row() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;
    screen.channel_mut().close().await;

    let check_in = screen.add_player(Team::Red, "1", "Ghost", "3").await.unwrap();

    assert!(check_in.broadcast_error.is_some());
    assert_eq!(screen.roster(Team::Red).len(), 1);
}

// ---------------------------------------------------------------------------
// lookup / clear_all / start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookup_reports_found_and_not_found() {
    let store = InMemoryPlayerStore::with_players([(5, "Viper")]);
    let (screen, _game) = screen_with(store).await;

    assert_eq!(
        screen.lookup("5").await.unwrap(),
        LookupOutcome::Found("Viper".to_string())
    );
    assert_eq!(screen.lookup("6").await.unwrap(), LookupOutcome::NotFound);
    assert_eq!(screen.lookup("6").await.unwrap(), LookupOutcome::NotFound);
    assert_matches!(screen.lookup("x").await, Err(CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn clear_all_keeps_stored_players() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;
    screen.add_player(Team::Red, "42", "Falcon", "7").await.unwrap();
    screen.add_player(Team::Green, "43", "Hawk", "8").await.unwrap();

    screen.clear_all();

    assert!(screen.roster(Team::Red).is_empty());
    assert!(screen.roster(Team::Green).is_empty());
    assert_eq!(
        screen.lookup("42").await.unwrap(),
        LookupOutcome::Found("Falcon".to_string())
    );
}

#[tokio::test]
async fn start_hands_off_roster_snapshots() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;
    screen.add_player(Team::Red, "1", "Ace", "10").await.unwrap();
    screen.add_player(Team::Green, "2", "Bolt", "20").await.unwrap();
    screen.add_player(Team::Green, "3", "Comet", "30").await.unwrap();

    let game = screen.start();
    screen.clear_all();

    assert_eq!(
        game,
        GameStart {
            red: vec![row(1, "Ace", 10)],
            green: vec![row(2, "Bolt", 20), row(3, "Comet", 30)],
        }
    );

    let json: serde_json::Value = serde_json::to_value(&game).unwrap();
    assert_eq!(json["red"][0]["codename"], "Ace");
    assert_eq!(json["green"][1]["equipment_id"], 30);
}

#[tokio::test]
async fn target_ip_changes_apply_to_next_send() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;

    assert_matches!(screen.set_target_ip("").await, Err(CoreError::InvalidInput(_)));
    screen.set_target_ip("127.0.0.3").await.unwrap();
    assert_eq!(screen.target_ip().to_string(), "127.0.0.3");

    screen.set_target_ip("localhost").await.unwrap();
    assert_eq!(screen.target_ip().to_string(), "127.0.0.1");
}

// ---------------------------------------------------------------------------
// Form-driven flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn form_flow_for_new_player_clears_fields_on_success() {
    let (mut screen, game) = screen_with(InMemoryPlayerStore::new()).await;

    screen.set_team(Team::Green);
    screen.enter_player_id(" 77 ");
    assert_eq!(screen.form().state, EntryState::PlayerIdEntered);

    assert_eq!(screen.lookup_form().await.unwrap(), LookupOutcome::NotFound);
    assert_eq!(screen.form().state, EntryState::NotFound);

    screen.enter_codename("Nova");
    assert_eq!(screen.form().state, EntryState::CodenameResolved);
    screen.enter_equipment_id("4");
    assert_eq!(screen.form().state, EntryState::EquipmentIdEntered);

    let check_in = screen.submit().await.unwrap();
    assert_eq!(check_in.team, Team::Green);
    assert_eq!(check_in.row, row(77, "Nova", 4));
    assert_eq!(recv_text(&game).await, "4");

    let form = screen.form();
    assert_eq!(form.state, EntryState::Committed);
    assert_eq!(form.team, Team::Green);
    assert!(form.player_id.is_empty());
    assert!(form.codename.is_empty());
    assert!(form.equipment_id.is_empty());
}

#[tokio::test]
async fn form_lookup_fills_stored_codename() {
    let store = InMemoryPlayerStore::with_players([(12, "Raven")]);
    let (mut screen, _game) = screen_with(store).await;

    screen.enter_player_id("12");
    screen.lookup_form().await.unwrap();

    assert_eq!(screen.form().state, EntryState::Found);
    assert_eq!(screen.form().codename, "Raven");
}

#[tokio::test]
async fn failed_submit_keeps_form_fields() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;

    screen.enter_player_id("8");
    screen.enter_codename("Echo");
    screen.enter_equipment_id("not-a-number");

    assert_matches!(screen.submit().await, Err(CoreError::InvalidInput(_)));
    assert_eq!(screen.form().player_id, "8");
    assert_eq!(screen.form().codename, "Echo");
    assert_eq!(screen.form().state, EntryState::EquipmentIdEntered);
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

#[tokio::test]
async fn console_commands_drive_the_screen() {
    let (mut screen, game) = screen_with(InMemoryPlayerStore::new()).await;
    let mut started = Vec::new();
    let mut on_start = |g: GameStart| started.push(g);

    let reply = console::execute(
        &mut screen,
        "add red 42 7 Falcon".parse().unwrap(),
        &mut on_start,
    )
    .await
    .unwrap();
    assert_eq!(reply.text, "Added 42 | Falcon | eq:7 to Red");
    assert_eq!(recv_text(&game).await, "7");

    let reply = console::execute(&mut screen, Command::List, &mut on_start)
        .await
        .unwrap();
    assert!(reply.text.contains("Red Team (1/15)"));
    assert!(reply.text.contains("42 | Falcon | eq:7"));
    assert!(reply.text.contains("Green Team (0/15)"));

    let reply = console::execute(&mut screen, Command::Start, &mut on_start)
        .await
        .unwrap();
    assert_eq!(
        reply.text,
        "Starting game. Red players: 1, Green players: 0"
    );

    let reply = console::execute(&mut screen, Command::Quit, &mut on_start)
        .await
        .unwrap();
    assert_eq!(reply.flow, Flow::Quit);

    assert_eq!(started.len(), 1);
    assert_eq!(started[0].red, vec![row(42, "Falcon", 7)]);
}

#[tokio::test]
async fn console_loop_reports_errors_and_stops_on_quit() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;
    let input: &[u8] = b"add red abc 7 Falcon\nlookup 5\nquit\nadd red 1 1 Never\n";
    let mut out = Vec::new();

    console::run(&mut screen, input, &mut out, None, |_| {})
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("error: Invalid input: Player ID must be an integer"));
    assert!(text.contains("Player ID not found"));
    assert!(text.contains("Bye"));
    assert!(screen.roster(Team::Red).is_empty());
}

#[tokio::test]
async fn console_loop_prints_inbound_messages() {
    let (mut screen, _game) = screen_with(InMemoryPlayerStore::new()).await;
    let inbound = screen.channel_mut().start_queue(4);
    let receive_addr = screen.channel().receive_addr();

    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    peer.send_to(b" 202 \n", receive_addr).await.unwrap();

    // Keep stdin open long enough for the inbound message to be drained.
    let (mut writer, reader) = tokio::io::duplex(64);
    let mut out = Vec::new();
    let feeder = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::io::AsyncWriteExt::write_all(&mut writer, b"quit\n")
            .await
            .unwrap();
    };
    let reader = tokio::io::BufReader::new(reader);
    let (result, ()) = tokio::join!(
        console::run(&mut screen, reader, &mut out, inbound, |_| {}),
        feeder
    );
    result.unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("<< 202 from"), "output was: {text}");

    screen.shutdown().await;
}
