//! Subcommand handlers.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use payshield_crypto::{VaultKey, decrypt_record, encrypt_value};
use payshield_mle::{
    ConfigurationRegistry, ContextId, EncryptionEngine, FieldRedactor, RequestSigner,
    ShieldConfig, VerificationReport,
};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Input selection shared by `protect` and `reveal`.
#[derive(Args)]
pub struct PayloadArgs {
    /// Integration context whose keys are used
    #[arg(long, value_name = "CONTEXT")]
    pub context: ContextId,

    /// JSON object to read (default: stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum VaultCommand {
    /// Encrypt a value into an `iv:ciphertext` record
    Encrypt {
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Decrypt an `iv:ciphertext` record
    Decrypt {
        #[arg(value_name = "RECORD")]
        record: String,
    },

    /// Print a fresh random vault key as hex
    GenerateKey,
}

#[derive(Args)]
pub struct SignArgs {
    /// Resource path, e.g. /visadirect/fundstransfer/v1/pushfundstransactions
    #[arg(long)]
    pub path: String,

    /// Query string without the leading '?'
    #[arg(long, default_value = "")]
    pub query: String,

    /// Request body exactly as sent
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file
    #[arg(long, value_name = "FILE")]
    pub body_file: Option<PathBuf>,

    /// Sign as of this Unix timestamp instead of now
    #[arg(long)]
    pub timestamp: Option<i64>,
}

pub fn verify(config: &ShieldConfig, context: Option<ContextId>, json: bool) -> Result<()> {
    let registry = ConfigurationRegistry::new(config);
    let reports: Vec<VerificationReport> = match context {
        Some(id) => vec![registry.verify(id)],
        None => ContextId::ALL.into_iter().map(|id| registry.verify(id)).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let unhealthy = reports.iter().filter(|r| !r.is_healthy()).count();
    if unhealthy > 0 {
        bail!("{unhealthy} integration context(s) failed verification");
    }
    Ok(())
}

fn print_report(report: &VerificationReport) {
    let mark = |ok: bool| if ok { "ok" } else { "MISSING" };

    println!("{}:", report.context);
    println!("  key id             {}", mark(report.key_id_present));
    println!("  private key        {}", mark(report.private_key_present));
    println!(
        "  key permissions    {}",
        if report.private_key_permissions_ok { "ok" } else { "TOO OPEN" }
    );
    println!("  client certificate {}", mark(report.client_cert_present));
    println!("  peer certificate   {}", mark(report.peer_cert_present));
    for problem in &report.problems {
        println!("  - {problem}");
    }
    println!();
}

pub fn protect(config: &ShieldConfig, args: &PayloadArgs, fields: &[String]) -> Result<()> {
    let payload = read_payload(args)?;
    let names: Vec<&str> = fields.iter().map(String::as_str).collect();

    let protected = redactor(config)
        .protect(payload, &names, args.context)
        .context("Failed to protect payload")?;

    println!("{}", serde_json::to_string_pretty(&protected)?);
    Ok(())
}

pub fn reveal(config: &ShieldConfig, args: &PayloadArgs) -> Result<()> {
    let payload = read_payload(args)?;

    let revealed = redactor(config)
        .reveal(payload, args.context)
        .context("Failed to reveal payload")?;

    println!("{}", serde_json::to_string_pretty(&revealed)?);
    Ok(())
}

fn redactor(config: &ShieldConfig) -> FieldRedactor {
    let registry = Arc::new(ConfigurationRegistry::new(config));
    let engine = Arc::new(EncryptionEngine::new(registry));
    FieldRedactor::new(engine, config.protection_policy)
}

fn read_payload(args: &PayloadArgs) -> Result<Map<String, Value>> {
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    match serde_json::from_str::<Value>(&text).context("Payload is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("Payload must be a JSON object"),
    }
}

pub fn vault(config: &ShieldConfig, command: VaultCommand) -> Result<()> {
    match command {
        VaultCommand::Encrypt { value } => {
            let key = config.load_vault_key()?;
            let record = encrypt_value(&key, &value).context("Failed to encrypt value")?;
            println!("{record}");
        }
        VaultCommand::Decrypt { record } => {
            let key = config.load_vault_key()?;
            let value = decrypt_record(&key, &record).context("Failed to decrypt record")?;
            println!("{value}");
        }
        VaultCommand::GenerateKey => {
            let key = VaultKey::generate();
            info!("generated vault key");
            println!("{}", hex::encode(key.as_bytes()));
        }
    }
    Ok(())
}

pub fn sign(config: &ShieldConfig, args: &SignArgs) -> Result<()> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone().into_bytes(),
        (None, Some(path)) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        (None, None) => Vec::new(),
    };

    let signer = RequestSigner::from_config(config)?;
    let token = match args.timestamp {
        Some(ts) => signer.sign_at(&args.path, &args.query, &body, ts)?,
        None => signer.sign(&args.path, &args.query, &body)?,
    };

    for (name, value) in token.headers() {
        println!("{name}: {value}");
    }
    Ok(())
}
