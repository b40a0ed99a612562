//! Running external commands
//!
//! Every collaborator binary (wg, systemctl, qrencode) is run to completion
//! with stdout captured. There is no timeout.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Human readable form of a command, used in logs and errors
pub fn describe(cmd: &Command) -> String {
    let mut out = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        out.push(' ');
        out.push_str(&arg.to_string_lossy());
    }
    out
}

/// Run a command, optionally feeding `input` on stdin, and return its stdout
///
/// A non-zero exit status is an error carrying the command's stderr.
pub fn run(cmd: &mut Command, input: Option<&[u8]>) -> Result<Vec<u8>> {
    let program = describe(cmd);
    tracing::debug!("Running {}", program);

    // Without input, stdin is whatever the caller configured (e.g. a file).
    if input.is_some() {
        cmd.stdin(Stdio::piped());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
        program: program.clone(),
        source,
    })?;

    if let Some(data) = input {
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(data) {
                Ok(()) => {}
                // The child exited without reading all of it; its status says why.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!("{} closed stdin early", program);
                }
                Err(source) => {
                    return Err(Error::Spawn {
                        program: program.clone(),
                        source,
                    })
                }
            }
        }
    }

    let output = child.wait_with_output().map_err(|source| Error::Spawn {
        program: program.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Run a command and return its stdout as a single line with the trailing
/// newline removed. Empty output is an error.
pub fn run_line(cmd: &mut Command, input: Option<&[u8]>) -> Result<String> {
    let stdout = run(cmd, input)?;
    let line = trim_newline(&String::from_utf8_lossy(&stdout)).to_string();
    if line.is_empty() {
        return Err(Error::EmptyOutput(describe(cmd)));
    }
    Ok(line)
}

/// Strip trailing line terminators
pub fn trim_newline(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let mut cmd = Command::new("systemctl");
        cmd.args(["restart", "wg-quick@wg0"]);
        assert_eq!(describe(&cmd), "systemctl restart wg-quick@wg0");
    }

    #[test]
    fn test_run_line_strips_newline() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo key"]);
        assert_eq!(run_line(&mut cmd, None).unwrap(), "key");
    }

    #[test]
    fn test_run_feeds_stdin() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "read k; echo \"pub-$k\""]);
        let line = run_line(&mut cmd, Some("secret\n".as_bytes())).unwrap();
        assert_eq!(line, "pub-secret");
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        match run(&mut cmd, None).unwrap_err() {
            Error::CommandFailed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_child_exiting_before_reading_stdin_reports_its_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo 'bad key' >&2; exit 1"]);
        let input = vec![b'k'; 1024 * 1024];
        match run(&mut cmd, Some(&input)).unwrap_err() {
            Error::CommandFailed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr, "bad key");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_output_is_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "true"]);
        assert!(matches!(run_line(&mut cmd, None), Err(Error::EmptyOutput(_))));
    }

    #[test]
    fn test_missing_program() {
        let mut cmd = Command::new("/nonexistent/wgpeer-test-binary");
        assert!(matches!(run(&mut cmd, None), Err(Error::Spawn { .. })));
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline("abc\n"), "abc");
        assert_eq!(trim_newline("abc\r\n"), "abc");
        assert_eq!(trim_newline("abc"), "abc");
    }
}
