//! Restarting the tunnel service

use std::process::Command;

use tracing::info;

use crate::error::Result;
use crate::process;

/// Something that can restart the service behind an interface
pub trait ServiceManager {
    fn restart(&self, interface: &str) -> Result<()>;
}

/// `systemctl restart wg-quick@<interface>`
#[derive(Debug, Clone)]
pub struct SystemdService {
    program: String,
}

impl SystemdService {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemdService {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl ServiceManager for SystemdService {
    fn restart(&self, interface: &str) -> Result<()> {
        let unit = format!("wg-quick@{}", interface);
        process::run(Command::new(&self.program).args(["restart", unit.as_str()]), None)?;
        info!("Restarted {}", unit);
        Ok(())
    }
}
