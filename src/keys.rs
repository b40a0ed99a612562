//! Peer key provisioning
//!
//! Keys are produced by an external generator (the `wg` tool by default)
//! and persisted next to the interface configuration.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{Error, Result};
use crate::process;
use crate::store::Store;

/// Source of WireGuard keypairs
pub trait KeyGenerator {
    /// Generate a new private key
    fn generate_private(&self) -> Result<String>;

    /// Derive the public key matching `private_key`
    fn derive_public(&self, private_key: &str) -> Result<String>;
}

/// Key generator backed by `wg genkey` / `wg pubkey`
#[derive(Debug, Clone)]
pub struct WgKeyGenerator {
    program: String,
}

impl WgKeyGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for WgKeyGenerator {
    fn default() -> Self {
        Self::new("wg")
    }
}

impl KeyGenerator for WgKeyGenerator {
    fn generate_private(&self) -> Result<String> {
        process::run_line(Command::new(&self.program).arg("genkey"), None)
    }

    fn derive_public(&self, private_key: &str) -> Result<String> {
        // The private key goes through stdin so it never shows up in `ps`.
        let input = format!("{}\n", private_key);
        process::run_line(
            Command::new(&self.program).arg("pubkey"),
            Some(input.as_bytes()),
        )
    }
}

/// A peer's keypair
#[derive(Clone, PartialEq, Eq)]
pub struct PeerKeys {
    pub private_key: String,
    pub public_key: String,
}

impl std::fmt::Debug for PeerKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerKeys")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Generate a keypair for `peer` and write `<peer>_privatekey` and
/// `<peer>_publickey`
///
/// The private key file is written before the public key is derived; if a
/// later step fails it is left in place.
pub fn provision_keys<K: KeyGenerator>(store: &Store, generator: &K, peer: &str) -> Result<PeerKeys> {
    let private_key = generator.generate_private()?;
    let private_path = store.private_key_path(peer);
    write_key_file(&private_path, &private_key)?;

    let public_key = generator.derive_public(&private_key)?;
    let public_path = store.public_key_path(peer);
    write_key_file(&public_path, &public_key)?;

    info!("Generated keypair for {}", peer);
    Ok(PeerKeys {
        private_key,
        public_key,
    })
}

/// Write a key without trailing newline, owner-only
fn write_key_file(path: &Path, key: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| Error::fs("create", path, e))?;
    file.write_all(key.as_bytes())
        .map_err(|e| Error::fs("write", path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// Deterministic generator: `private-N` / `public-of-private-N`
    #[derive(Default)]
    pub(crate) struct CountingKeys {
        pub(crate) issued: Cell<u32>,
    }

    impl KeyGenerator for CountingKeys {
        fn generate_private(&self) -> Result<String> {
            let n = self.issued.get() + 1;
            self.issued.set(n);
            Ok(format!("private-{}", n))
        }

        fn derive_public(&self, private_key: &str) -> Result<String> {
            Ok(format!("public-of-{}", private_key))
        }
    }

    struct FailingPublic;

    impl KeyGenerator for FailingPublic {
        fn generate_private(&self) -> Result<String> {
            Ok("private".into())
        }

        fn derive_public(&self, _private_key: &str) -> Result<String> {
            Err(Error::EmptyOutput("wg pubkey".into()))
        }
    }

    #[test]
    fn test_provision_keys_writes_both_files() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let keys = provision_keys(&store, &CountingKeys::default(), "alice").unwrap();
        assert_eq!(keys.private_key, "private-1");
        assert_eq!(keys.public_key, "public-of-private-1");

        let private = std::fs::read_to_string(store.private_key_path("alice")).unwrap();
        let public = std::fs::read_to_string(store.public_key_path("alice")).unwrap();
        assert_eq!(private, "private-1");
        assert_eq!(public, "public-of-private-1");

        let mode = std::fs::metadata(store.private_key_path("alice"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_failed_derivation_keeps_private_key() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        assert!(provision_keys(&store, &FailingPublic, "bob").is_err());
        assert!(store.private_key_path("bob").exists());
        assert!(!store.public_key_path("bob").exists());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let keys = PeerKeys {
            private_key: "very-secret".into(),
            public_key: "pub".into(),
        };
        let shown = format!("{:?}", keys);
        assert!(!shown.contains("very-secret"));
        assert!(shown.contains("pub"));
    }

    #[test]
    fn test_wg_generator_missing_binary() {
        let generator = WgKeyGenerator::new("/nonexistent/wg");
        assert!(matches!(
            generator.generate_private(),
            Err(Error::Spawn { .. })
        ));
    }
}
