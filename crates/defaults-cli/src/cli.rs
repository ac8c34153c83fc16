use clap::{Parser, Subcommand, ValueEnum};

/// CLI surface definition, modelled on the platform `defaults` tool.
#[derive(Parser, Debug)]
#[command(
    name = "defaults",
    about = "Inspect and edit typed preference suites",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print one value, or every entry of a suite.
    Read {
        suite: String,
        key: Option<String>,
    },
    /// Store a value under a key.
    Write {
        suite: String,
        key: String,
        value: String,
        /// How to interpret VALUE (`data` expects base64, `date` RFC 3339).
        #[arg(long, value_enum, default_value_t = ValueKind::String)]
        kind: ValueKind,
    },
    /// Remove one key, or every entry of a suite.
    Delete {
        suite: String,
        key: Option<String>,
    },
    /// List suites present in the data directory.
    Domains,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    String,
    Int,
    Float,
    Date,
    Data,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
