use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certificate_verifier::{
    config::Config,
    models::VerificationInput,
    rendering::PdfRenderBackend,
    services::{AssetStore, CertificateService, RosterCache},
    sources::SpreadsheetRosterSource,
    utils::SystemClock,
};

#[derive(Parser)]
#[command(name = "certificate-verifier")]
#[command(version)]
#[command(about = "Verify a participant against the roster and render their certificate")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path [default: $CONFIG_FILE, then config.toml]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Participant name as entered by the caller
    #[arg(short, long)]
    participant: String,

    /// Team name as entered by the caller
    #[arg(short, long)]
    team: String,

    /// Also write the decoded certificate PDF to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the full response as JSON
    #[arg(long)]
    json: bool,

    /// Roster workbook (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_filter = format!("certificate_verifier={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting certificate verifier v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            info!("Configuration loaded from: {}", path.display());
            config
        }
        None => Config::load()?,
    };

    if let Some(roster) = cli.roster {
        config.roster.path = roster;
    }

    let source = SpreadsheetRosterSource::new(&config.roster.path, config.roster.columns());
    let roster = Arc::new(
        RosterCache::new(Arc::new(source), Arc::new(SystemClock), config.roster.ttl)
            .with_policy(config.roster.stale_policy),
    );

    let assets = if config.certificate.cache_assets {
        AssetStore::preloaded(&config.certificate.template_path, &config.certificate.font_path)
            .await
            .context("Failed to load certificate assets")?
    } else {
        AssetStore::on_disk(&config.certificate.template_path, &config.certificate.font_path)
    };

    let service = CertificateService::new(
        roster,
        Arc::new(PdfRenderBackend),
        assets,
        config.certificate.layout(),
    );

    let response = service
        .verify_and_generate_certificate(VerificationInput::new(cli.participant, cli.team))
        .await;

    if let (Some(path), Some(artifact)) = (&cli.output, &response.artifact) {
        let document = STANDARD
            .decode(artifact)
            .context("Certificate artifact is not valid base64")?;
        tokio::fs::write(path, document)
            .await
            .with_context(|| format!("Failed to write certificate to {}", path.display()))?;
        info!("Certificate written to {}", path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(message) = &response.message {
        println!("{message}");
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
