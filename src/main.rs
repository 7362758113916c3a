use clap::{Parser, Subcommand};
use ipfocuser::{Direction, FocuserConfig, HttpTransport, MotionController, MoveResult};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "ipfocuser")]
#[command(about = "Drive a network-attached telescope focuser")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query position and travel limits
    Status,
    /// Move to an absolute position in ticks
    Move { position: i64 },
    /// Move inward by a number of ticks
    In { ticks: u32 },
    /// Move outward by a number of ticks
    Out { ticks: u32 },
    /// Toggle the focuser's power supply off and on
    PowerCycle,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match FocuserConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Focuser at {} (backlash={}, approach='{}', power cycle {})",
        config.endpoint,
        config.backlash_steps,
        config.always_approach,
        if config.can_power_cycle() { "enabled" } else { "disabled" },
    );

    let mut focuser = MotionController::new(config, HttpTransport::new());

    let result = match args.command {
        Command::Status => {
            let state = match focuser.connect().await {
                Ok(state) => state,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            };
            match serde_json::to_string_pretty(&state) {
                Ok(json) => println!("{json}"),
                Err(e) => error!("Could not render state: {}", e),
            }
            return;
        }
        Command::PowerCycle => {
            if !focuser.power_cycle().await {
                std::process::exit(1);
            }
            return;
        }
        Command::Move { position } => {
            connect_for_bounds(&mut focuser).await;
            focuser.move_absolute(position).await
        }
        Command::In { ticks } => {
            require_connection(&mut focuser).await;
            focuser.move_relative(Direction::Inward, ticks).await
        }
        Command::Out { ticks } => {
            require_connection(&mut focuser).await;
            focuser.move_relative(Direction::Outward, ticks).await
        }
    };

    report(&result);
}

/// Moves validate against the device's own limits when it answers, and fall
/// back to the configured range when it does not.
async fn connect_for_bounds(focuser: &mut MotionController<HttpTransport>) {
    if let Err(e) = focuser.connect().await {
        warn!("Using configured range: {}", e);
    }
}

/// Relative moves start from the reported position, so the device must answer.
async fn require_connection(focuser: &mut MotionController<HttpTransport>) {
    if let Err(e) = focuser.connect().await {
        error!("Relative move needs the current position: {}", e);
        std::process::exit(1);
    }
}

fn report(result: &MoveResult) {
    match &result.error {
        None => println!("{}", result.position),
        Some(e) => {
            if result.position_unknown() {
                error!("Position unverified, re-connect before relative moves");
            }
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
