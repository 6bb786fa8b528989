use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rollcall::prelude::*;
use rollcall::{DEFAULT_ENDPOINT_URL, DEFAULT_SOCKET_URL};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "roll-watch", about = "Follow a dice roller table from the terminal")]
struct Cli {
    /// Six-letter slot id of the table. Defaults to the last one used.
    #[arg(long, env = "ROLLCALL_SLOT")]
    slot: Option<String>,

    /// Game master password. Needed for --accept.
    #[arg(long, env = "ROLLCALL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Open a roll cycle once connected.
    #[arg(long, value_enum)]
    accept: Option<AcceptKind>,

    /// Where the slot id is remembered between runs.
    #[arg(long, env = "ROLLCALL_STATE_FILE", default_value = "rollcall.json")]
    state_file: PathBuf,

    #[arg(long, env = "ROLLCALL_SOCKET_URL", default_value = DEFAULT_SOCKET_URL)]
    socket_url: String,

    #[arg(long, env = "ROLLCALL_ENDPOINT_URL", default_value = DEFAULT_ENDPOINT_URL)]
    endpoint_url: String,

    /// Seconds between status lines.
    #[arg(long, default_value_t = 30)]
    status_every: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AcceptKind {
    Initiative,
    Attack,
    Fortitude,
    Reflex,
    Will,
}

impl From<AcceptKind> for RollType {
    fn from(kind: AcceptKind) -> Self {
        match kind {
            AcceptKind::Initiative => RollType::Initiative,
            AcceptKind::Attack => RollType::Attack,
            AcceptKind::Fortitude => RollType::Save(SaveType::Fortitude),
            AcceptKind::Reflex => RollType::Save(SaveType::Reflex),
            AcceptKind::Will => RollType::Save(SaveType::Will),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn describe(roll: &Roll) -> String {
    let detail = match roll.detail {
        RollDetail::Initiative => "initiative".to_string(),
        RollDetail::Attack {
            attack_type,
            success,
            damage,
        } => {
            let outcome = if success { "hit" } else { "miss" };
            format!("{} attack, {outcome} for {damage}", attack_type.id())
        }
        RollDetail::Save { save_type, success } => {
            let outcome = if success { "saved" } else { "failed" };
            format!("{} save, {outcome}", save_type.short_name())
        }
    };
    let effect = roll
        .effect
        .as_deref()
        .map(|effect| format!(" [{effect}]"))
        .unwrap_or_default();
    format!(
        "{}: {} (d20 {}) {detail}{effect}",
        roll.class.display_name(),
        roll.modified_result,
        roll.die_result
    )
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), RollcallError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = DiceRollerConfig::default()
        .with_socket_url(cli.socket_url)
        .with_endpoint_url(cli.endpoint_url);
    let roller = DiceRoller::builder()
        .config(config)
        .durable_store(Arc::new(JsonFileStore::new(&cli.state_file)))
        .build()?;

    let _state = roller.on_state_change(|state| println!("table: {state}"));
    let _rolls = roller.on_roll(|roll| println!("{}", describe(roll)));
    let _errors = roller.on_error(|message, requires_login| {
        if requires_login {
            eprintln!("error: {message} (log in again)");
        } else {
            eprintln!("error: {message}");
        }
    });

    if let Some(slot) = cli.slot.as_deref() {
        roller.set_slot_id(Some(slot))?;
    }
    match roller.slot_id() {
        Some(slot) => info!(%slot, "watching table"),
        None => warn!("no slot id; pass --slot to pick a table"),
    }

    let runner = tokio::spawn({
        let roller = roller.clone();
        async move { roller.run().await }
    });

    if let Some(password) = cli.password.as_deref() {
        if !roller.is_logged_in() {
            roller.login(password).await?;
        }
    }
    if let Some(kind) = cli.accept {
        roller.accept_rolls(kind.into()).await?;
    }

    let ticker = TickService::new(TickConfig::default());
    let every = cli.status_every.max(1);
    let _status = ticker.subscribe({
        let roller = roller.clone();
        move |tick| {
            if tick.tick % every == 0 {
                info!(
                    state = %roller.state(),
                    rolls = roller.rolls().len(),
                    connection = ?roller.connection_state(),
                    "status"
                );
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not wait for ctrl-c");
    }
    info!("shutting down");
    roller.close();
    runner.abort();
    Ok(())
}
