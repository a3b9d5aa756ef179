//! Privileged file and service operations.
use crate::util::truncate_string;
use anyhow::{anyhow, Context, Result};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

const MAX_STDERR_BYTES: usize = 512;

/// Operations that need escalated permission.
pub trait Elevator {
    /// Read a privileged file's full text.
    fn read(&self, path: &Path) -> Result<String>;
    /// Move `source` over `dest`.
    fn install(&self, source: &Path, dest: &Path) -> Result<()>;
    fn chown(&self, path: &Path, owner: &str) -> Result<()>;
    fn chmod(&self, path: &Path, mode: &str) -> Result<()>;
    /// Run an arbitrary command and return its stdout.
    fn run(&self, argv: &[&str]) -> Result<String>;
}

/// `sudo -S`, with the secret written to stdin for every call.
pub struct SudoElevator {
    secret: String,
}

impl SudoElevator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn sudo(&self, argv: &[&str]) -> Result<String> {
        let rendered = argv.join(" ");
        tracing::info!(command = %rendered, "sudo");
        let sudo = which::which("sudo").context("locate sudo")?;
        let mut child = Command::new(sudo)
            .args(["-S", "-p", ""])
            .args(argv)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn sudo {rendered}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            feed_secret(&mut stdin, &self.secret).context("write secret to sudo stdin")?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("wait for sudo {rendered}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "`sudo {rendered}` exited with {}: {}",
                output.status,
                truncate_string(stderr.trim(), MAX_STDERR_BYTES)
            ));
        }
        String::from_utf8(output.stdout).with_context(|| format!("decode output of {rendered}"))
    }
}

/// Write the secret line. sudo with cached credentials may exit without
/// reading it; the exit status decides the outcome then.
fn feed_secret(stdin: &mut impl Write, secret: &str) -> io::Result<()> {
    match stdin.write_all(format!("{secret}\n").as_bytes()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("sudo closed stdin before reading the secret");
            Ok(())
        }
        other => other,
    }
}

impl Elevator for SudoElevator {
    fn read(&self, path: &Path) -> Result<String> {
        self.sudo(&["cat", &*path.to_string_lossy()])
    }

    fn install(&self, source: &Path, dest: &Path) -> Result<()> {
        self.sudo(&["mv", &*source.to_string_lossy(), &*dest.to_string_lossy()])
            .map(|_| ())
    }

    fn chown(&self, path: &Path, owner: &str) -> Result<()> {
        self.sudo(&["chown", owner, &*path.to_string_lossy()])
            .map(|_| ())
    }

    fn chmod(&self, path: &Path, mode: &str) -> Result<()> {
        self.sudo(&["chmod", mode, &*path.to_string_lossy()])
            .map(|_| ())
    }

    fn run(&self, argv: &[&str]) -> Result<String> {
        self.sudo(argv)
    }
}
