mod cli;
mod commands;
mod config;
mod storage;

use std::io;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Read { suite, key } => {
            let store = storage::open_suite(&config, &suite)?;
            commands::read(&store, key.as_deref(), &mut stdout)?
        }
        Command::Write {
            suite,
            key,
            value,
            kind,
        } => {
            let store = storage::open_suite(&config, &suite)?;
            let value = commands::parse_value(kind, &value)?;
            commands::write(&store, &key, value)?
        }
        Command::Delete { suite, key } => {
            let store = storage::open_suite(&config, &suite)?;
            commands::delete(&store, key.as_deref())?
        }
        Command::Domains => commands::domains(&storage::data_root(&config)?, &mut stdout)?,
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info. Logs go to stderr so
    // `read` output stays pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("defaults {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
