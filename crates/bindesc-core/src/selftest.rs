//! Post-install smoke test.
//!
//! Runs the installed executable with the verification rule's arguments,
//! stdin closed and output captured to temp files. Only a zero exit within
//! the timeout passes.

use std::fs::{self, File};
use std::io::{self, Seek};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use bindesc_schema::VerificationRule;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Captured output is truncated to this many bytes in error messages.
const OUTPUT_TAIL: usize = 2048;

#[derive(Error, Debug)]
pub enum SelfTestFailure {
    #[error("Failed to run {}: {source}", path.display())]
    Spawn { path: PathBuf, source: io::Error },

    #[error("{} exited with status {code}{}", path.display(), stderr_suffix(stderr))]
    NonZeroExit {
        path: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("{} was terminated by signal {signal}", path.display())]
    Signal { path: PathBuf, signal: i32 },

    #[error("{} did not exit within {secs}s and was killed", path.display())]
    Timeout { path: PathBuf, secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// A passing run.
#[derive(Debug, Clone)]
pub struct SelfTestOutcome {
    pub elapsed: Duration,
    pub stdout: String,
}

/// Run `binary` per `rule`.
///
/// # Errors
///
/// Every way the run can fail is a [`SelfTestFailure`]; a hanging process
/// is killed and reaped before `Timeout` is returned.
pub fn run(binary: &Path, rule: &VerificationRule) -> Result<SelfTestOutcome, SelfTestFailure> {
    let mut stdout = tempfile::tempfile()?;
    let mut stderr = tempfile::tempfile()?;

    tracing::debug!(binary = %binary.display(), args = ?rule.args, timeout = rule.timeout_secs, "smoke test");
    let started = Instant::now();
    let mut child = Command::new(binary)
        .args(&rule.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout.try_clone()?))
        .stderr(Stdio::from(stderr.try_clone()?))
        .spawn()
        .map_err(|source| SelfTestFailure::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;

    let timeout = Duration::from_secs(rule.timeout_secs);
    let Some(status) = child.wait_timeout(timeout)? else {
        if let Err(e) = child.kill() {
            tracing::warn!(error = %e, "failed to kill hung smoke test");
        }
        child.wait()?;
        return Err(SelfTestFailure::Timeout {
            path: binary.to_path_buf(),
            secs: rule.timeout_secs,
        });
    };
    let elapsed = started.elapsed();

    if status.success() {
        return Ok(SelfTestOutcome {
            elapsed,
            stdout: read_tail(&mut stdout)?,
        });
    }

    if let Some(code) = status.code() {
        return Err(SelfTestFailure::NonZeroExit {
            path: binary.to_path_buf(),
            code,
            stderr: read_tail(&mut stderr)?,
        });
    }

    Err(SelfTestFailure::Signal {
        path: binary.to_path_buf(),
        signal: signal_of(status),
    })
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> i32 {
    -1
}

fn read_tail(file: &mut File) -> io::Result<String> {
    file.rewind()?;
    let mut buf = Vec::new();
    io::Read::read_to_end(file, &mut buf)?;
    let start = buf.len().saturating_sub(OUTPUT_TAIL);
    Ok(String::from_utf8_lossy(&buf[start..]).into_owned())
}

/// Whether `path` exists and is a regular file.
pub fn is_installed(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("dbui");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn rule(args: &[&str], timeout_secs: u64) -> VerificationRule {
        VerificationRule {
            args: args.iter().map(ToString::to_string).collect(),
            timeout_secs,
        }
    }

    #[test]
    fn zero_exit_passes() {
        let dir = tempdir().unwrap();
        let bin = script(dir.path(), "echo ready; exit 0");

        let outcome = run(&bin, &VerificationRule::default()).unwrap();
        assert_eq!(outcome.stdout.trim(), "ready");
    }

    #[test]
    fn args_are_passed_through() {
        let dir = tempdir().unwrap();
        let bin = script(dir.path(), r#"[ "$1" = "--version" ] || exit 7"#);

        assert!(run(&bin, &rule(&["--version"], 10)).is_ok());
        assert!(run(&bin, &rule(&[], 10)).is_err());
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let dir = tempdir().unwrap();
        let bin = script(dir.path(), "echo broken >&2; exit 3");

        match run(&bin, &VerificationRule::default()).unwrap_err() {
            SelfTestFailure::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn hung_binary_is_killed() {
        let dir = tempdir().unwrap();
        let bin = script(dir.path(), "exec sleep 30");

        let started = Instant::now();
        let err = run(&bin, &rule(&[], 1)).unwrap_err();
        assert!(matches!(err, SelfTestFailure::Timeout { secs: 1, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn signal_is_a_failure() {
        let dir = tempdir().unwrap();
        let bin = script(dir.path(), "kill -9 $$");

        let err = run(&bin, &VerificationRule::default()).unwrap_err();
        assert!(matches!(err, SelfTestFailure::Signal { signal: 9, .. }));
    }

    #[test]
    fn missing_binary_fails_to_spawn() {
        let dir = tempdir().unwrap();
        let err = run(&dir.path().join("absent"), &VerificationRule::default()).unwrap_err();
        assert!(matches!(err, SelfTestFailure::Spawn { .. }));
        assert!(!is_installed(&dir.path().join("absent")));
    }
}
