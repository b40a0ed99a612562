//! Peer lifecycle
//!
//! Lists, shows and provisions peers over the store. Provisioning runs
//! count → server key → keygen → client document → stanza append while
//! holding the store lock; restarting the service and rendering the QR code
//! are separate steps driven by the caller.

use std::net::Ipv4Addr;

use tracing::info;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::keys::{provision_keys, KeyGenerator};
use crate::lock::StoreLock;
use crate::qr::QrRenderer;
use crate::render::{slot_address, ClientConfig, PeerStanza};
use crate::service::ServiceManager;
use crate::store::{validate_peer_name, Store};

/// A freshly provisioned peer
#[derive(Debug, Clone)]
pub struct ProvisionedPeer {
    pub name: String,
    /// Number of `[Peer]` sections found before this one was added
    pub slot: usize,
    pub address: Ipv4Addr,
}

/// Orchestrates the peer lifecycle against one store
pub struct PeerManager<'a, K, S, Q> {
    settings: &'a Settings,
    store: Store,
    keys: K,
    service: S,
    qr: Q,
}

impl<'a, K, S, Q> PeerManager<'a, K, S, Q>
where
    K: KeyGenerator,
    S: ServiceManager,
    Q: QrRenderer,
{
    pub fn new(settings: &'a Settings, keys: K, service: S, qr: Q) -> Self {
        Self {
            settings,
            store: Store::new(&settings.store_dir),
            keys,
            service,
            qr,
        }
    }

    /// Name of the managed WireGuard interface
    pub fn interface(&self) -> &str {
        &self.settings.interface
    }

    /// All peer names, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        self.store.list_peers()
    }

    /// Whether `name` is already provisioned
    pub fn exists(&self, name: &str) -> Result<bool> {
        validate_peer_name(name)?;
        self.store.peer_exists(name)
    }

    /// QR rendering of a peer's client document
    pub fn render(&self, name: &str) -> Result<String> {
        validate_peer_name(name)?;
        self.qr.render(&self.store.client_config_path(name))
    }

    /// Provision a new peer
    ///
    /// Nothing is rolled back if a step fails part way.
    pub fn provision(&self, name: &str) -> Result<ProvisionedPeer> {
        validate_peer_name(name)?;

        let _lock = StoreLock::acquire(&self.store.lock_path())?;

        // Another run may have created it while we waited for the lock.
        if self.store.peer_exists(name)? {
            return Err(Error::PeerExists(name.to_string()));
        }

        let slot = self.store.count_peers(&self.settings.interface)?;
        let address = slot_address(slot)?;
        let server_public_key = self
            .store
            .read_server_public_key(&self.settings.server_public_key_file)?;
        info!("Provisioning {} as {} (slot {})", name, address, slot);

        let keys = provision_keys(&self.store, &self.keys, name)?;

        let client_config = self.store.client_config_path(name);
        ClientConfig::new(self.settings, &keys.private_key, &server_public_key, address)
            .write_to(&client_config)?;

        PeerStanza::new(&keys.public_key, address)
            .append_to(&self.store.interface_config_path(&self.settings.interface))?;

        Ok(ProvisionedPeer {
            name: name.to_string(),
            slot,
            address,
        })
    }

    /// Restart the interface so it picks up appended peers
    pub fn reload(&self) -> Result<()> {
        self.service.restart(&self.settings.interface)
    }
}
