//! # payshield
//!
//! Operator tool for the payload-protection subsystem.
//!
//! ## Commands
//!
//! - `payshield verify [CONTEXT]` - Check credential files for one or all contexts
//! - `payshield protect|reveal` - Encrypt or decrypt fields of a JSON payload
//! - `payshield vault encrypt|decrypt|generate-key` - At-rest vault records
//! - `payshield sign` - Produce request-signing headers
//!
//! Configuration comes from `--config FILE` (JSON) or, when absent, from
//! `PAYSHIELD_*` environment variables. Logs go to stderr so stdout stays
//! machine-readable.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use payshield_mle::ShieldConfig;
use std::path::PathBuf;
use tracing::debug;

mod commands;

use commands::{PayloadArgs, SignArgs, VaultCommand};

/// Payload protection for card-network integrations
#[derive(Parser)]
#[command(name = "payshield")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON configuration file (default: PAYSHIELD_* environment)
    #[arg(
        short,
        long,
        global = true,
        env = "PAYSHIELD_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PAYSHIELD_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the credentials of one or every integration context
    #[command(name = "verify")]
    Verify {
        /// Context to check (funds-transfer, authorization); all when omitted
        #[arg(value_name = "CONTEXT")]
        context: Option<payshield_mle::ContextId>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move named fields of a JSON object into an encrypted envelope
    #[command(name = "protect")]
    Protect {
        #[command(flatten)]
        payload: PayloadArgs,

        /// Field names to encrypt (comma separated or repeated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },

    /// Decrypt the envelope of a JSON object and merge the fields back
    #[command(name = "reveal")]
    Reveal {
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// At-rest vault records
    #[command(name = "vault")]
    Vault {
        #[command(subcommand)]
        command: VaultCommand,
    },

    /// Compute request-signing headers
    #[command(name = "sign")]
    Sign {
        #[command(flatten)]
        args: SignArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = load_config(cli.config.as_deref())?;
    debug!(policy = %config.protection_policy, "configuration loaded");

    match cli.command {
        Commands::Verify { context, json } => commands::verify(&config, context, json),
        Commands::Protect { payload, fields } => commands::protect(&config, &payload, &fields),
        Commands::Reveal { payload } => commands::reveal(&config, &payload),
        Commands::Vault { command } => commands::vault(&config, command),
        Commands::Sign { args } => commands::sign(&config, &args),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ShieldConfig> {
    match path {
        Some(path) => ShieldConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ShieldConfig::from_env().context("Failed to read PAYSHIELD_* environment"),
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
