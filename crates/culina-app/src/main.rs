//! Culina binary: parse the command line, load config, run one command.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use culina_app::cli::{CliArgs, Command, InventoryAction, PreferencesAction};
use culina_app::commands::{self, ItemChanges};
use culina_app::App;
use culina_core::config::CulinaConfig;
use culina_core::error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = CulinaConfig::load_or_default(&config_file);

    // --log-level > RUST_LOG > config.
    let filter = match args.resolve_log_level() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs, config: CulinaConfig) -> Result<()> {
    let data_dir = args.resolve_data_dir();
    let app = App::open(config, data_dir.as_deref()).await?;
    let mut out = std::io::stdout().lock();
    let mut input = BufReader::new(tokio::io::stdin());

    match args.command {
        Command::Inventory { action } => match action {
            InventoryAction::List { category } => commands::inventory_list(&app, category, &mut out).await?,
            InventoryAction::Add {
                name,
                category,
                amount,
                expires,
            } => {
                commands::inventory_add(&app, &name, category, amount, expires, &mut out).await?;
            }
            InventoryAction::Edit {
                id,
                name,
                category,
                amount,
                expires,
            } => {
                let changes = ItemChanges {
                    name,
                    category,
                    amount,
                    expires,
                };
                commands::inventory_edit(&app, id, changes, &mut out).await?;
            }
            InventoryAction::Remove { ids } => {
                commands::inventory_remove(&app, &ids, &mut out).await?;
            }
            InventoryAction::Enrich => {
                commands::inventory_enrich(&app, &mut out).await?;
            }
        },
        Command::Scan { photo, yes } => {
            commands::scan(&app, &photo, yes, &mut input, &mut out).await?;
        }
        Command::Chat => commands::chat(&app, &mut input, &mut out).await?,
        Command::Preferences { action } => match action {
            PreferencesAction::Show => commands::preferences_show(&app, &mut out).await?,
            PreferencesAction::Set { text } => commands::preferences_set(&app, &text, &mut out).await?,
        },
        Command::Ping => commands::ping(&app, &mut out).await?,
    }

    out.flush()?;
    Ok(())
}
