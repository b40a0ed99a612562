//! WgPeer - WireGuard peer provisioning for wg-quick interfaces
//!
//! Keeps client ("peer") configurations for a WireGuard server whose
//! interface is managed by `wg-quick`. The configuration directory is the
//! only state: peers are discovered from their `<name>_publickey` files and
//! new ones get the next address after the `[Peer]` sections already present
//! in `<interface>.conf`.
//!
//! # Features
//!
//! - List provisioned peers
//! - Show an existing peer's client configuration as a terminal QR code
//! - Provision a new peer: keypair via `wg`, client document, server stanza,
//!   `wg-quick@<interface>` restart
//! - Advisory store lock so concurrent runs cannot hand out the same address
//!
//! External tools sit behind the [`keys::KeyGenerator`],
//! [`service::ServiceManager`] and [`qr::QrRenderer`] traits.

pub mod commands;
pub mod config;
pub mod error;
pub mod keys;
pub mod lock;
pub mod peers;
pub mod process;
pub mod qr;
pub mod render;
pub mod service;
pub mod store;

pub use config::Settings;
pub use error::{Error, ErrorCategory, Result};
pub use peers::{PeerManager, ProvisionedPeer};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{Error, Result};
    pub use crate::keys::{KeyGenerator, PeerKeys, WgKeyGenerator};
    pub use crate::peers::{PeerManager, ProvisionedPeer};
    pub use crate::qr::{QrRenderer, QrencodeRenderer};
    pub use crate::service::{ServiceManager, SystemdService};
    pub use crate::store::Store;
}
