use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleetgate::config::GateConfig;
use fleetgate::telemetry::init_logging;
use fleetgate_auth::prelude::Certificate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use x509_parser::pem::Pem;

/// fleetgate - admission gate tooling for fleet RPCs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (overrides the configured one)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a device id against the configured format policy
    CheckId {
        /// Device id to check
        id: String,
    },

    /// Print fingerprint and names of every certificate in a PEM file
    InspectCert {
        /// PEM file holding one or more certificates
        #[arg(value_name = "PEM")]
        path: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,

    /// Show build information
    Version,
}

#[derive(Debug, Serialize)]
struct CertSummary {
    index: usize,
    sha256: String,
    subject: String,
    common_name: Option<String>,
    subject_alt_names: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = GateConfig::load(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, cli.debug, config.logging.json)?;
    debug!(config = ?cli.config, "configuration loaded");

    let result = match cli.command {
        Commands::CheckId { id } => cmd_check_id(&id, &config),
        Commands::InspectCert { path, json } => cmd_inspect_cert(&path, json).await,
        Commands::Config => cmd_config(&config),
        Commands::Version => cmd_version(),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check_id(id: &str, config: &GateConfig) -> Result<()> {
    config
        .device_id_policy()
        .check(id)
        .map_err(|violation| anyhow::anyhow!("invalid ({}): {}", violation.rule(), violation))?;
    println!("valid");
    Ok(())
}

async fn cmd_inspect_cert(path: &Path, json: bool) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut summaries = Vec::new();
    for (index, pem) in Pem::iter_from_buffer(&data).enumerate() {
        let pem = pem.with_context(|| format!("Malformed PEM block #{index}"))?;
        if pem.label != "CERTIFICATE" {
            debug!(label = %pem.label, "skipping non-certificate PEM block");
            continue;
        }
        let cert = Certificate::from_der(pem.contents);
        summaries.push(CertSummary {
            index: summaries.len(),
            sha256: cert.fingerprint_hex(),
            subject: cert.subject_dn()?,
            common_name: cert.subject_common_name()?,
            subject_alt_names: cert.subject_alt_names()?,
        });
    }
    anyhow::ensure!(
        !summaries.is_empty(),
        "no certificates found in {}",
        path.display()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for summary in &summaries {
        println!("certificate #{}", summary.index);
        println!("  sha256: {}", summary.sha256);
        println!("  subject: {}", summary.subject);
        println!(
            "  subject CN: {}",
            summary.common_name.as_deref().unwrap_or("(none)")
        );
        if summary.subject_alt_names.is_empty() {
            println!("  SANs: (none)");
        } else {
            println!("  SANs: {}", summary.subject_alt_names.join(", "));
        }
    }
    Ok(())
}

fn cmd_config(config: &GateConfig) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn cmd_version() -> Result<()> {
    println!("fleetgate {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE"));
    println!("Git Commit: {}", env!("GIT_HASH"));
    Ok(())
}
