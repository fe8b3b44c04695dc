use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cane_harvest::config::AppConfig;
use cane_harvest::session::Session;
use cane_harvest::shell;

#[derive(Parser)]
#[command(name = "cane")]
#[command(about = "Sugarcane harvest loss ledger")]
struct Cli {
    /// Directory for the ledger document and event log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Loss fraction for manual harvests (0.05 = 5%)
    #[arg(long, global = true)]
    manual_loss: Option<f64>,

    /// Loss fraction for mechanized harvests (0.15 = 15%)
    #[arg(long, global = true)]
    mechanized_loss: Option<f64>,

    /// Start with an empty ledger instead of loading the saved document
    #[arg(long, global = true)]
    no_load: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,
    /// Run shell commands given as arguments, one command per argument
    Run {
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

/// Logs go to stderr so shell output on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "cane=info,cane_harvest=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::load();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(rate) = cli.manual_loss {
        config.loss_rates.manual = rate;
    }
    if let Some(rate) = cli.mechanized_loss {
        config.loss_rates.mechanized = rate;
    }
    config
}

fn main() -> anyhow::Result<()> {
    // Database settings may live in a local .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    init_tracing();

    let config = build_config(&cli);
    let mut session = Session::from_config(&config);

    let mut stdout = io::stdout().lock();
    if !cli.no_load {
        match session.load_file() {
            Ok(count) => tracing::info!(
                "Loaded {} record(s) from {}",
                count,
                config.ledger_path().display()
            ),
            Err(e) => {
                tracing::warn!("Starting with an empty ledger: {}", e);
                writeln!(stdout, "error: {}", e)?;
                if session.document_unreadable() {
                    writeln!(
                        stdout,
                        "Starting with an empty ledger; 'save' will not overwrite the document until it loads."
                    )?;
                }
            }
        }
    }

    match cli.command {
        Some(Commands::Run { commands }) => {
            let script = commands.join("\n");
            shell::run(&mut session, script.as_bytes(), &mut stdout, false)?;
        }
        Some(Commands::Shell) | None => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            shell::run(&mut session, stdin.lock(), &mut stdout, interactive)?;
        }
    }

    Ok(())
}
