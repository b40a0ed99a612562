//! Store directory layout
//!
//! The store (normally `/etc/wireguard`) is the only source of truth:
//!
//! ```text
//! <store>/<peer>_privatekey
//! <store>/<peer>_publickey
//! <store>/<interface>.conf
//! <store>/clients/<peer>.conf
//! <store>/<server public key file>
//! <store>/.wgpeer.lock
//! ```

use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};
use crate::process::trim_newline;

/// Suffix marking a peer's public key file
pub const PUBLIC_KEY_SUFFIX: &str = "_publickey";
/// Suffix marking a peer's private key file
pub const PRIVATE_KEY_SUFFIX: &str = "_privatekey";
/// Delimiter counted to find the number of configured peers
pub const PEER_SECTION: &str = "[Peer]";

const CLIENTS_DIR: &str = "clients";
const LOCK_FILE: &str = ".wgpeer.lock";

/// Paths and read-only queries over the store directory
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn private_key_path(&self, peer: &str) -> PathBuf {
        self.root.join(format!("{}{}", peer, PRIVATE_KEY_SUFFIX))
    }

    pub fn public_key_path(&self, peer: &str) -> PathBuf {
        self.root.join(format!("{}{}", peer, PUBLIC_KEY_SUFFIX))
    }

    pub fn interface_config_path(&self, interface: &str) -> PathBuf {
        self.root.join(format!("{}.conf", interface))
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.root.join(CLIENTS_DIR)
    }

    pub fn client_config_path(&self, peer: &str) -> PathBuf {
        self.clients_dir().join(format!("{}.conf", peer))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// List peer names, derived from `<peer>_publickey` file names
    ///
    /// Sorted by name. Fails as a whole if the directory cannot be read.
    /// Key files whose name is not valid UTF-8 are skipped with a warning.
    pub fn list_peers(&self) -> Result<Vec<String>> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| Error::fs("list", &self.root, e))?;

        let mut peers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::fs("list", &self.root, e))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    if raw.as_bytes().ends_with(PUBLIC_KEY_SUFFIX.as_bytes()) {
                        warn!("Skipping key file with non UTF-8 name {:?}", raw);
                    }
                    continue;
                }
            };
            if let Some(peer) = name.strip_suffix(PUBLIC_KEY_SUFFIX) {
                if !peer.is_empty() {
                    peers.push(peer.to_string());
                }
            }
        }

        peers.sort();
        Ok(peers)
    }

    /// Whether a peer with this name has a public key in the store
    pub fn peer_exists(&self, peer: &str) -> Result<bool> {
        Ok(self.list_peers()?.iter().any(|p| p == peer))
    }

    /// Count `[Peer]` sections in the interface configuration
    ///
    /// This is a plain substring count: a `[Peer]` inside a comment or value
    /// is counted too. A missing or empty file is an error.
    pub fn count_peers(&self, interface: &str) -> Result<usize> {
        let path = self.interface_config_path(interface);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::fs("read", &path, e))?;
        if content.trim().is_empty() {
            return Err(Error::EmptyFile(path));
        }
        Ok(count_peer_sections(&content))
    }

    /// Read the server public key, without its trailing newline
    pub fn read_server_public_key(&self, file_name: &str) -> Result<String> {
        read_key_file(&self.root.join(file_name))
    }
}

/// Number of non-overlapping `[Peer]` occurrences
pub fn count_peer_sections(content: &str) -> usize {
    content.matches(PEER_SECTION).count()
}

/// Read a single-key file, stripping the trailing newline
pub fn read_key_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::fs("read", path, e))?;
    let key = trim_newline(&content);
    if key.is_empty() {
        return Err(Error::EmptyFile(path.to_path_buf()));
    }
    Ok(key.to_string())
}

/// Reject peer names that cannot be used as a file name stem
pub fn validate_peer_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidPeerName(name.to_string()));
    }
    Ok(())
}
