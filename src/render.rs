//! Client documents and server-side peer stanzas

use std::fmt;
use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::net::Ipv4Addr;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use crate::config::Settings;
use crate::error::{Error, Result};

/// First two host addresses (.0 network, .1 server) are reserved
pub const RESERVED_HOSTS: usize = 2;
/// Highest usable last octet in 10.0.0.0/24
const LAST_HOST: usize = 254;
/// Keepalive written into client documents, in seconds
pub const PERSISTENT_KEEPALIVE: u16 = 20;

/// Address assigned to the peer in `slot` (10.0.0.{slot+2})
pub fn slot_address(slot: usize) -> Result<Ipv4Addr> {
    let host = slot + RESERVED_HOSTS;
    if host > LAST_HOST {
        return Err(Error::AddressSpaceExhausted(slot));
    }
    Ok(Ipv4Addr::new(10, 0, 0, host as u8))
}

/// Client-side configuration document
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub private_key: String,
    pub address: Ipv4Addr,
    pub dns: String,
    pub server_public_key: String,
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(
        settings: &Settings,
        private_key: &str,
        server_public_key: &str,
        address: Ipv4Addr,
    ) -> Self {
        Self {
            private_key: private_key.to_string(),
            address,
            dns: settings.dns.clone(),
            server_public_key: server_public_key.to_string(),
            endpoint: settings.endpoint(),
        }
    }

    /// Write the document to `path` with owner-only permissions, creating
    /// the parent directory if needed
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(parent)
                .map_err(|e| Error::fs("create", parent, e))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| Error::fs("create", path, e))?;
        file.write_all(self.to_string().as_bytes())
            .map_err(|e| Error::fs("write", path, e))?;

        tracing::info!("Client config written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Interface]\n\
             PrivateKey = {}\n\
             Address = {}/32\n\
             DNS = {}\n\
             \n\
             [Peer]\n\
             PublicKey = {}\n\
             Endpoint = {}\n\
             AllowedIPs = 0.0.0.0/0\n\
             PersistentKeepalive = {}",
            self.private_key,
            self.address,
            self.dns,
            self.server_public_key,
            self.endpoint,
            PERSISTENT_KEEPALIVE,
        )
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("dns", &self.dns)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// `[Peer]` stanza for the server's interface configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStanza {
    pub public_key: String,
    pub address: Ipv4Addr,
}

impl PeerStanza {
    pub fn new(public_key: &str, address: Ipv4Addr) -> Self {
        Self {
            public_key: public_key.to_string(),
            address,
        }
    }

    /// Append the stanza to an existing interface configuration file
    pub fn append_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| Error::fs("open", path, e))?;
        file.write_all(self.to_string().as_bytes())
            .map_err(|e| Error::fs("append to", path, e))?;

        tracing::info!("Peer {} appended to {}", self.address, path.display());
        Ok(())
    }
}

impl fmt::Display for PeerStanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n\n[Peer]\nPublicKey = {}\nAllowedIPs = {}/32",
            self.public_key, self.address
        )
    }
}
