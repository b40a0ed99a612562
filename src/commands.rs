//! Command implementations behind the `wgpeer` CLI
//!
//! Each command writes what the user sees to `out`. Diagnostics go through
//! `tracing` on stderr.

use std::io::Write;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::keys::KeyGenerator;
use crate::peers::PeerManager;
use crate::qr::QrRenderer;
use crate::service::ServiceManager;

/// `--json` listing
#[derive(Serialize)]
struct PeerListing<'a> {
    interface: &'a str,
    peers: Vec<String>,
}

/// List all peers
pub fn cmd_list<K, S, Q, W>(manager: &PeerManager<'_, K, S, Q>, json: bool, out: &mut W) -> Result<()>
where
    K: KeyGenerator,
    S: ServiceManager,
    Q: QrRenderer,
    W: Write,
{
    let peers = manager.list()?;

    if json {
        let listing = PeerListing {
            interface: manager.interface(),
            peers,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&listing)?).map_err(Error::Output)?;
        return Ok(());
    }

    writeln!(out, "All clients:").map_err(Error::Output)?;
    for peer in peers {
        writeln!(out, "{}", peer).map_err(Error::Output)?;
    }
    Ok(())
}

/// Show an existing peer's QR code
pub fn cmd_show<K, S, Q, W>(manager: &PeerManager<'_, K, S, Q>, name: &str, out: &mut W) -> Result<()>
where
    K: KeyGenerator,
    S: ServiceManager,
    Q: QrRenderer,
    W: Write,
{
    let qr = manager.render(name)?;
    writeln!(out, "{}", qr).map_err(Error::Output)
}

/// Provision a new peer, restart the interface and show its QR code
pub fn cmd_create<K, S, Q, W>(manager: &PeerManager<'_, K, S, Q>, name: &str, out: &mut W) -> Result<()>
where
    K: KeyGenerator,
    S: ServiceManager,
    Q: QrRenderer,
    W: Write,
{
    if !nix::unistd::Uid::effective().is_root() {
        warn!("Not running as root; writing the WireGuard directory will likely fail");
    }

    let peer = manager.provision(name)?;
    info!("Provisioned {} at {} (slot {})", peer.name, peer.address, peer.slot);

    writeln!(out, "Restarting wireguard...").map_err(Error::Output)?;
    out.flush().map_err(Error::Output)?;
    manager.reload()?;

    cmd_show(manager, &peer.name, out)
}

/// Report a fatal error: log it with its category, then print `Error: <message>`
pub fn report_error<W: Write>(e: &Error, out: &mut W) {
    error!(category = %e.category(), "Aborting: {:?}", e);
    // Nowhere left to report a failed write to stderr.
    let _ = writeln!(out, "Error: {}", e);
}
