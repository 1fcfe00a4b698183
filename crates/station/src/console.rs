//! Line-oriented operator console.
//!
//! Each input line is one [`Command`]. The loop also drains the inbound
//! datagram queue, so inbound messages are handled on the console task and
//! never touch roster state from the receive task.

use std::str::FromStr;

use photon_core::error::CoreError;
use photon_core::roster::{Roster, MAX_PLAYERS_PER_TEAM};
use photon_core::store::PlayerStore;
use photon_core::team::Team;
use photon_net::InboundMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::entry::{CheckIn, CodenameSource, EntryScreen, GameStart, LookupOutcome};

pub const HELP: &str = "\
Commands:
  team <red|green>                          select the team for the next entry
  id <player_id>                            enter a player id
  lookup [player_id]                        look up the codename for the entered id
  codename <name>                           enter a codename for a new player
  equip <equipment_id>                      enter an equipment id
  add                                       add the entered player (Enter)
  add <team> <player_id> <equip_id> <name>  add a player in one step
  list                                      show both rosters
  ip [address|host]                         show or change the UDP target IP
  clear                                     clear both rosters (F12)
  start                                     start the game (F5)
  help                                      show this text
  quit                                      exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Team(Team),
    PlayerId(String),
    Lookup(Option<String>),
    Codename(String),
    Equipment(String),
    Submit,
    Add {
        team: Team,
        player_id: String,
        equipment_id: String,
        codename: String,
    },
    List,
    TargetIp(Option<String>),
    Clear,
    Start,
    Help,
    Quit,
}

fn usage(text: &str) -> CoreError {
    CoreError::InvalidInput(format!("usage: {text}"))
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CoreError::InvalidInput("empty command".to_string()));
        };
        let rest: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("team", [team]) => Command::Team(team.parse()?),
            ("team", _) => return Err(usage("team <red|green>")),
            ("id", [id]) => Command::PlayerId(id.to_string()),
            ("id", _) => return Err(usage("id <player_id>")),
            ("lookup", []) => Command::Lookup(None),
            ("lookup", [id]) => Command::Lookup(Some(id.to_string())),
            ("lookup", _) => return Err(usage("lookup [player_id]")),
            ("codename", []) => return Err(usage("codename <name>")),
            ("codename", name) => Command::Codename(name.join(" ")),
            ("equip", [id]) => Command::Equipment(id.to_string()),
            ("equip", _) => return Err(usage("equip <equipment_id>")),
            ("add", []) => Command::Submit,
            ("add", [team, player_id, equipment_id, name @ ..]) if !name.is_empty() => {
                Command::Add {
                    team: team.parse()?,
                    player_id: player_id.to_string(),
                    equipment_id: equipment_id.to_string(),
                    codename: name.join(" "),
                }
            }
            ("add", _) => return Err(usage("add <team> <player_id> <equipment_id> <codename>")),
            ("list", []) => Command::List,
            ("ip", []) => Command::TargetIp(None),
            ("ip", [ip]) => Command::TargetIp(Some(ip.to_string())),
            ("clear" | "f12", []) => Command::Clear,
            ("start" | "f5", []) => Command::Start,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (other, _) => {
                return Err(CoreError::InvalidInput(format!(
                    "unknown command '{other}', type 'help' for a list"
                )))
            }
        };
        Ok(command)
    }
}

/// What the console loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub flow: Flow,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flow: Flow::Continue,
        }
    }
}

/// Apply one command to the entry screen.
pub async fn execute<S, H>(
    screen: &mut EntryScreen<S>,
    command: Command,
    on_start: &mut H,
) -> Result<Reply, CoreError>
where
    S: PlayerStore,
    H: FnMut(GameStart),
{
    let reply = match command {
        Command::Team(team) => {
            screen.set_team(team);
            Reply::say(format!("Team: {team}"))
        }
        Command::PlayerId(id) => {
            screen.enter_player_id(&id);
            Reply::say(format!("Player ID: {}", screen.form().player_id))
        }
        Command::Lookup(id) => {
            if let Some(id) = id {
                screen.enter_player_id(&id);
            }
            match screen.lookup_form().await? {
                LookupOutcome::Found(codename) => Reply::say(format!("Found codename: {codename}")),
                LookupOutcome::NotFound => Reply::say(
                    "Player ID not found. Enter a new codename and add the player.",
                ),
            }
        }
        Command::Codename(name) => {
            screen.enter_codename(&name);
            Reply::say(format!("Codename: {}", screen.form().codename))
        }
        Command::Equipment(id) => {
            screen.enter_equipment_id(&id);
            Reply::say(format!("Equipment ID: {}", screen.form().equipment_id))
        }
        Command::Submit => Reply::say(describe_check_in(&screen.submit().await?)),
        Command::Add {
            team,
            player_id,
            equipment_id,
            codename,
        } => {
            let check_in = screen
                .add_player(team, &player_id, &codename, &equipment_id)
                .await?;
            Reply::say(describe_check_in(&check_in))
        }
        Command::List => Reply::say(format!(
            "{}\n{}",
            describe_roster(screen.roster(Team::Red)),
            describe_roster(screen.roster(Team::Green)),
        )),
        Command::TargetIp(None) => Reply::say(format!("UDP target IP: {}", screen.target_ip())),
        Command::TargetIp(Some(ip)) => {
            screen.set_target_ip(&ip).await?;
            Reply::say(format!("UDP target IP set to {}", screen.target_ip()))
        }
        Command::Clear => {
            screen.clear_all();
            Reply::say("Rosters cleared")
        }
        Command::Start => {
            let game = screen.start();
            let text = format!(
                "Starting game. Red players: {}, Green players: {}",
                game.red.len(),
                game.green.len()
            );
            on_start(game);
            Reply::say(text)
        }
        Command::Help => Reply::say(HELP),
        Command::Quit => Reply {
            text: "Bye".to_string(),
            flow: Flow::Quit,
        },
    };
    Ok(reply)
}

fn describe_check_in(check_in: &CheckIn) -> String {
    let mut text = format!("Added {} to {}", check_in.row, check_in.team);
    if check_in.codename_source == CodenameSource::Stored {
        text.push_str(" (stored codename)");
    }
    if let Some(err) = &check_in.broadcast_error {
        text.push_str(&format!("\nwarning: equipment broadcast failed: {err}"));
    }
    text
}

fn describe_roster(roster: &Roster) -> String {
    let mut text = format!(
        "{} Team ({}/{MAX_PLAYERS_PER_TEAM})",
        roster.team(),
        roster.len()
    );
    if roster.is_empty() {
        text.push_str("\n  (empty)");
    }
    for row in roster.rows() {
        text.push_str(&format!("\n  {row}"));
    }
    text
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Inbound(Option<InboundMessage>),
}

async fn next_inbound(inbound: &mut Option<mpsc::Receiver<InboundMessage>>) -> Option<InboundMessage> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Run the console until `quit` or end of input.
///
/// Command errors are printed and the loop continues; only I/O errors on
/// the console streams end it early.
pub async fn run<S, R, W, H>(
    screen: &mut EntryScreen<S>,
    input: R,
    mut out: W,
    mut inbound: Option<mpsc::Receiver<InboundMessage>>,
    mut on_start: H,
) -> std::io::Result<()>
where
    S: PlayerStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: FnMut(GameStart),
{
    let mut lines = input.lines();
    write_line(&mut out, "Player Entry. Type 'help' for commands.").await?;

    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line),
            message = next_inbound(&mut inbound) => Event::Inbound(message),
        };

        match event {
            Event::Line(line) => {
                let Some(line) = line? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let result = match line.parse::<Command>() {
                    Ok(command) => execute(screen, command, &mut on_start).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(reply) => {
                        write_line(&mut out, &reply.text).await?;
                        if reply.flow == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => write_line(&mut out, &format!("error: {e}")).await?,
                }
            }
            Event::Inbound(Some(message)) => {
                tracing::info!(sender = %message.sender, payload = %message.payload, "Inbound message");
                write_line(
                    &mut out,
                    &format!("<< {} from {}", message.payload, message.sender),
                )
                .await?;
            }
            Event::Inbound(None) => {
                tracing::debug!("Inbound queue closed");
                inbound = None;
            }
        }
    }
    Ok(())
}
