//! WgPeer Settings
//!
//! Settings are read once at startup from a dotenv file and then passed
//! around by reference. A variable already present in the process
//! environment wins over the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default store directory
pub const DEFAULT_STORE_DIR: &str = "/etc/wireguard";

/// DNS server handed to clients
pub const DNS_IP: &str = "DNS_IP";
/// Public address of the WireGuard server
pub const SERVER_IP: &str = "SERVER_IP";
/// Listen port of the WireGuard server
pub const SERVER_PORT: &str = "SERVER_PORT";
/// wg-quick interface name (e.g. wg0)
pub const INTERFACE: &str = "INTERFACE";
/// File holding the server public key, relative to the store directory
pub const SERVER_PUBLIC_KEY_FILE: &str = "SERVER_PUBLIC_KEY_FILE";
/// Optional override of the store directory
pub const WG_DIR: &str = "WG_DIR";

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// DNS address written into client documents
    pub dns: String,

    /// Server address used in the client endpoint
    pub server_address: String,

    /// Server port used in the client endpoint
    pub server_port: String,

    /// Interface name; selects `<interface>.conf` and `wg-quick@<interface>`
    pub interface: String,

    /// Server public key file name inside the store directory
    pub server_public_key_file: String,

    /// Store directory
    pub store_dir: PathBuf,
}

impl Settings {
    /// Load settings from a dotenv file, letting the process environment
    /// override values found in the file
    pub fn load(path: &Path) -> Result<Self> {
        let file = read_env_file(path)?;
        tracing::debug!("Loaded {} variable(s) from {}", file.len(), path.display());

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Build settings from any key lookup. Absent and blank values count as
    /// missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(Error::MissingSetting(key))
        };

        let store_dir = lookup(WG_DIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));

        Ok(Self {
            dns: required(DNS_IP)?,
            server_address: required(SERVER_IP)?,
            server_port: required(SERVER_PORT)?,
            interface: required(INTERFACE)?,
            server_public_key_file: required(SERVER_PUBLIC_KEY_FILE)?,
            store_dir,
        })
    }

    /// Client endpoint as `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.server_address, self.server_port)
    }

    /// systemd unit that runs the interface
    pub fn service_unit(&self) -> String {
        format!("wg-quick@{}", self.interface)
    }
}

/// Parse a dotenv file without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        if e.not_found() {
            Error::SettingsNotFound(path.to_path_buf())
        } else {
            Error::SettingsParse(e)
        }
    })?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn full_env() -> HashMap<String, String> {
        [
            (DNS_IP, "1.1.1.1"),
            (SERVER_IP, "203.0.113.7"),
            (SERVER_PORT, "51820"),
            (INTERFACE, "wg0"),
            (SERVER_PUBLIC_KEY_FILE, "server_publickey"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_from_lookup() {
        let env = full_env();
        let settings = Settings::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.dns, "1.1.1.1");
        assert_eq!(settings.interface, "wg0");
        assert_eq!(settings.endpoint(), "203.0.113.7:51820");
        assert_eq!(settings.service_unit(), "wg-quick@wg0");
        assert_eq!(settings.store_dir, PathBuf::from(DEFAULT_STORE_DIR));
    }

    #[test]
    fn test_missing_dns_is_reported() {
        let mut env = full_env();
        env.remove(DNS_IP);
        let err = Settings::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(DNS_IP)));
    }

    #[test]
    fn test_blank_value_is_missing() {
        let mut env = full_env();
        env.insert(INTERFACE.to_string(), "   ".to_string());
        let err = Settings::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(INTERFACE)));
    }

    #[test]
    fn test_store_dir_override() {
        let mut env = full_env();
        env.insert(WG_DIR.to_string(), "/srv/wg".to_string());
        let settings = Settings::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.store_dir, PathBuf::from("/srv/wg"));
    }

    #[test]
    fn test_read_env_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "DNS_IP=9.9.9.9\nSERVER_IP=vpn.example.com\n# comment\nSERVER_PORT=\"51820\"\n",
        )
        .unwrap();

        let vars = read_env_file(&path).unwrap();
        assert_eq!(vars.get(DNS_IP).map(String::as_str), Some("9.9.9.9"));
        assert_eq!(vars.get(SERVER_IP).map(String::as_str), Some("vpn.example.com"));
        assert_eq!(vars.get(SERVER_PORT).map(String::as_str), Some("51820"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempdir().unwrap();
        let err = read_env_file(&dir.path().join(".env")).unwrap_err();
        assert!(matches!(err, Error::SettingsNotFound(_)));
    }
}
