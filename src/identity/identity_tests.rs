use super::{resolve, RemoteOutput, RemoteRequest, ResolveParams, Transport};
use crate::config::{ConfigDocument, ExecutionMode};
use crate::error::Error;
use anyhow::anyhow;
use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Default)]
struct CannedTransport {
    http: Option<Result<String, String>>,
    remote: Option<RemoteOutput>,
    commands: RefCell<Vec<String>>,
}

impl Transport for CannedTransport {
    fn http_get(&self, url: &str, _timeout: Duration) -> anyhow::Result<String> {
        self.commands.borrow_mut().push(format!("GET {url}"));
        match &self.http {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(anyhow!("{reason}")),
            None => Err(anyhow!("http not expected")),
        }
    }

    fn remote_exec(&self, request: &RemoteRequest<'_>) -> anyhow::Result<RemoteOutput> {
        self.commands
            .borrow_mut()
            .push(format!("{}@{}: {}", request.user, request.host, request.command));
        self.remote.clone().ok_or_else(|| anyhow!("remote not expected"))
    }
}

fn params() -> ResolveParams {
    let mut doc = ConfigDocument::default();
    doc.network.remote_server.user = "ops".to_string();
    doc.network.remote_server.host = "vpn.example.net".to_string();
    doc.security.sudo_pswd = Some("secret".to_string());
    ResolveParams::from_document(&doc)
}

#[test]
fn local_mode_trims_echo_body() {
    let transport = CannedTransport {
        http: Some(Ok("203.0.113.5\n".to_string())),
        ..Default::default()
    };

    let address = resolve(&transport, ExecutionMode::Local, &params()).expect("resolve");
    assert_eq!(address, Ipv4Addr::new(203, 0, 113, 5));
    assert_eq!(
        transport.commands.borrow().as_slice(),
        ["GET https://api.ipify.org"]
    );
}

#[test]
fn local_transport_error_is_network_unreachable() {
    let transport = CannedTransport {
        http: Some(Err("connection refused".to_string())),
        ..Default::default()
    };

    let err = resolve(&transport, ExecutionMode::Local, &params()).expect_err("unreachable");
    assert!(matches!(err, Error::NetworkUnreachable { .. }), "{err}");
}

#[test]
fn local_mode_never_returns_a_malformed_address() {
    for body in ["<html>rate limited</html>", "", "2001:db8::1", "203.0.113"] {
        let transport = CannedTransport {
            http: Some(Ok(body.to_string())),
            ..Default::default()
        };
        let err = resolve(&transport, ExecutionMode::Local, &params()).expect_err(body);
        assert!(matches!(err, Error::NetworkUnreachable { .. }), "{body}: {err}");
    }
}

#[test]
fn remote_mode_runs_echo_request_on_server() {
    let transport = CannedTransport {
        remote: Some(RemoteOutput {
            stdout: " 198.51.100.7 \n".to_string(),
            exit_code: Some(0),
            ..Default::default()
        }),
        ..Default::default()
    };

    let address = resolve(&transport, ExecutionMode::Remote, &params()).expect("resolve");
    assert_eq!(address, Ipv4Addr::new(198, 51, 100, 7));
    let commands = transport.commands.borrow();
    assert!(commands[0].starts_with("ops@vpn.example.net: curl -s"));
    assert!(commands[0].ends_with("https://api.ipify.org"));
}

#[test]
fn remote_empty_output_fails_regardless_of_exit_code() {
    for exit_code in [Some(0), Some(255), None] {
        let transport = CannedTransport {
            remote: Some(RemoteOutput {
                stdout: "  \n".to_string(),
                exit_code,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = resolve(&transport, ExecutionMode::Remote, &params()).expect_err("empty");
        assert!(
            matches!(err, Error::RemoteCommandFailed { .. }),
            "{exit_code:?}: {err}"
        );
    }
}

#[test]
fn remote_nonzero_exit_fails_even_with_output() {
    let transport = CannedTransport {
        remote: Some(RemoteOutput {
            stdout: "198.51.100.7".to_string(),
            stderr: "warning".to_string(),
            exit_code: Some(1),
            timed_out: false,
        }),
        ..Default::default()
    };

    let err = resolve(&transport, ExecutionMode::Remote, &params()).expect_err("exit 1");
    assert!(matches!(err, Error::RemoteCommandFailed { .. }), "{err}");
}

#[test]
fn remote_mode_requires_server_coordinates() {
    let transport = CannedTransport::default();
    let params = ResolveParams::from_document(&ConfigDocument::default());

    let err = resolve(&transport, ExecutionMode::Remote, &params).expect_err("no host");
    assert!(matches!(err, Error::RemoteCommandFailed { .. }), "{err}");
    assert!(transport.commands.borrow().is_empty());
}
