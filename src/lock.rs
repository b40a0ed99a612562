//! Advisory store lock
//!
//! Serializes the count → provision → append sequence between concurrent
//! `wgpeer` runs. Only cooperating processes honour it.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::fcntl::{flock, FlockArg};
use tracing::debug;

use crate::error::{Error, Result};

/// Exclusive lock on the store, released on drop
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the exclusive lock on `path` is held
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = open_lock_file(path)?;

        flock(file.as_raw_fd(), FlockArg::LockExclusive).map_err(|source| Error::Lock {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Acquired store lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock only if nobody else holds it
    #[cfg(test)]
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = open_lock_file(path)?;

        match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(nix::errno::Errno::EWOULDBLOCK) => Ok(None),
            Err(source) => Err(Error::Lock {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)
        .map_err(|e| Error::fs("open", path, e))
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
            tracing::warn!("Failed to release {}: {}", self.path.display(), e);
        } else {
            debug!("Released store lock {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".wgpeer.lock");

        let held = StoreLock::acquire(&path).unwrap();
        assert!(StoreLock::try_acquire(&path).unwrap().is_none());

        drop(held);
        assert!(StoreLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_lock_in_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(".wgpeer.lock");
        assert!(matches!(StoreLock::acquire(&path), Err(Error::Fs { .. })));
    }
}
