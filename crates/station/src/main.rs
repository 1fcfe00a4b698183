//! `photon-station` -- player check-in console.
//!
//! Shows the splash banner, connects to the player store, binds the UDP
//! channel and runs the operator console on stdin/stdout. See
//! [`photon_core::config`] for the environment variables.

use photon_core::config::StationConfig;
use photon_core::store::{InMemoryPlayerStore, PlayerStore};
use photon_db::repositories::PlayerRepo;
use photon_db::PgPlayerStore;
use photon_net::DatagramChannel;
use photon_station::console;
use photon_station::entry::{EntryScreen, GameStart};
use photon_station::splash::Splash;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photon_station=info,photon_net=info,photon_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StationConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let mut stdout = tokio::io::stdout();
    if let Err(e) = Splash::new(config.splash).run(&mut stdout, || ()).await {
        tracing::warn!(error = %e, "Could not draw splash banner");
    }

    if config.offline {
        tracing::info!("Offline mode: using in-memory player store");
        run_station(InMemoryPlayerStore::new(), &config).await;
        return;
    }

    let pool = photon_db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        });
    tracing::info!("Database connection pool created");

    if let Err(e) = photon_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    if let Err(e) = photon_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    }
    tracing::info!("Database migrations applied");

    match PlayerRepo::count(&pool).await {
        Ok(registered_players) => tracing::info!(registered_players, "Player store ready"),
        Err(e) => tracing::warn!(error = %e, "Could not count registered players"),
    }

    run_station(PgPlayerStore::new(pool), &config).await;
}

async fn run_station<S: PlayerStore>(store: S, config: &StationConfig) {
    let channel = DatagramChannel::bind(&config.udp)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to bind UDP sockets");
            std::process::exit(1);
        });

    let mut screen = EntryScreen::new(store, channel);
    let inbound = screen
        .channel_mut()
        .start_queue(config.inbound_queue_capacity);

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let result = tokio::select! {
        result = console::run(&mut screen, stdin, stdout, inbound, hand_off) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "Console I/O failed");
    }

    screen.shutdown().await;
    tracing::info!("Station stopped");
}

/// Boundary to the game phase, which lives outside this program.
fn hand_off(game: GameStart) {
    tracing::info!(
        red_players = game.red.len(),
        green_players = game.green.len(),
        "Game start requested",
    );
    match serde_json::to_string(&game) {
        Ok(json) => tracing::info!(rosters = %json, "Roster hand-off"),
        Err(e) => tracing::warn!(error = %e, "Could not serialise rosters"),
    }
}
