//! Network seams used by identity resolution.
use crate::util::run_with_timeout;
use anyhow::{anyhow, Context, Result};
use std::process::Command;
use std::time::Duration;

/// One command to run on the remote server.
#[derive(Debug, Clone)]
pub struct RemoteRequest<'a> {
    pub user: &'a str,
    pub host: &'a str,
    pub command: &'a str,
    pub secret: Option<&'a str>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

pub trait Transport {
    /// GET `url` and return the body; non-success statuses are errors.
    fn http_get(&self, url: &str, timeout: Duration) -> Result<String>;

    /// Run a command over a remote shell session and capture its output.
    fn remote_exec(&self, request: &RemoteRequest<'_>) -> Result<RemoteOutput>;
}

/// ureq for HTTP, `ssh` (through `sshpass` when a secret is configured) for
/// remote commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTransport;

impl Transport for SystemTransport {
    fn http_get(&self, url: &str, timeout: Duration) -> Result<String> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent = ureq::Agent::new_with_config(config);
        let mut response = agent.get(url).call().with_context(|| format!("GET {url}"))?;
        let body = response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("read response body from {url}"))?;
        Ok(body)
    }

    fn remote_exec(&self, request: &RemoteRequest<'_>) -> Result<RemoteOutput> {
        let ssh = which::which("ssh").context("locate ssh")?;
        let destination = format!("{}@{}", request.user, request.host);
        let ssh_args = [
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", request.connect_timeout.as_secs()),
            destination,
            request.command.to_string(),
        ];

        let mut cmd = match request.secret {
            Some(secret) => {
                let sshpass = which::which("sshpass")
                    .context("locate sshpass (required for password-based remote mode)")?;
                let mut cmd = Command::new(sshpass);
                cmd.arg("-e").arg(&ssh).args(&ssh_args).env("SSHPASS", secret);
                cmd
            }
            None => {
                let mut cmd = Command::new(&ssh);
                cmd.args(["-o", "BatchMode=yes"]).args(&ssh_args);
                cmd
            }
        };

        let output = run_with_timeout(&mut cmd, request.timeout)
            .map_err(|err| anyhow!("run remote command on {}: {err:#}", request.host))?;
        Ok(RemoteOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
            timed_out: output.timed_out,
        })
    }
}
