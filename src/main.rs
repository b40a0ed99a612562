//! WgPeer - WireGuard peer provisioning
//!
//! Lists peers, shows an existing peer as a QR code, or provisions a new
//! one and restarts its wg-quick interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wgpeer::commands::{cmd_create, cmd_list, cmd_show, report_error};
use wgpeer::config::Settings;
use wgpeer::error::Result;
use wgpeer::keys::WgKeyGenerator;
use wgpeer::peers::PeerManager;
use wgpeer::qr::QrencodeRenderer;
use wgpeer::service::SystemdService;

/// WgPeer - WireGuard peer provisioning
#[derive(Parser)]
#[command(name = "wgpeer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Peer to show or create (lists all peers when omitted)
    name: Option<String>,

    /// Path to the settings file
    #[arg(short, long, default_value = ".env")]
    env_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Print the peer list as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, &mut std::io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.env_file)?;
    info!(
        "Using {} in {}",
        settings.interface,
        settings.store_dir.display()
    );

    let manager = PeerManager::new(
        &settings,
        WgKeyGenerator::default(),
        SystemdService::default(),
        QrencodeRenderer::default(),
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.name {
        None => cmd_list(&manager, cli.json, &mut out),
        Some(name) => {
            if manager.exists(&name)? {
                cmd_show(&manager, &name, &mut out)
            } else {
                cmd_create(&manager, &name, &mut out)
            }
        }
    }
}
