//! Terminal QR rendering of client documents

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::process;

/// Turns a client document into a scannable text rendering
pub trait QrRenderer {
    fn render(&self, document: &Path) -> Result<String>;
}

/// `qrencode -t ansiutf8 < <document>`
#[derive(Debug, Clone)]
pub struct QrencodeRenderer {
    program: String,
}

impl QrencodeRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for QrencodeRenderer {
    fn default() -> Self {
        Self::new("qrencode")
    }
}

impl QrRenderer for QrencodeRenderer {
    fn render(&self, document: &Path) -> Result<String> {
        let input = File::open(document).map_err(|e| Error::fs("open", document, e))?;
        let stdout = process::run(
            Command::new(&self.program)
                .args(["-t", "ansiutf8"])
                .stdin(Stdio::from(input)),
            None,
        )?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
