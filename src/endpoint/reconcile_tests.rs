use super::{apply_endpoint, TunnelTarget};
use crate::endpoint::Elevator;
use crate::error::Error;
use anyhow::anyhow;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

const TUNNEL: &str = "[Interface]
PrivateKey = aGVsbG8=
Address = 10.8.0.2/24

[Peer]
PublicKey = d29ybGQ=
Endpoint = 10.0.0.1:51820
PersistentKeepalive = 25
";

/// Privileged filesystem and command runner held in memory.
#[derive(Default)]
struct FakeElevator {
    files: RefCell<BTreeMap<PathBuf, String>>,
    log: RefCell<Vec<String>>,
    /// Scripted results for `run`, consumed in order; missing entries succeed.
    run_results: RefCell<VecDeque<Result<String, String>>>,
    fail_read: bool,
    fail_install: bool,
}

impl FakeElevator {
    fn with_file(path: &Path, text: &str) -> Self {
        let fake = Self::default();
        fake.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
        fake
    }

    fn script(&self, results: Vec<Result<&str, &str>>) {
        *self.run_results.borrow_mut() = results
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
    }

    fn contents(&self, path: &Path) -> String {
        self.files.borrow().get(path).cloned().unwrap_or_default()
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Elevator for FakeElevator {
    fn read(&self, path: &Path) -> anyhow::Result<String> {
        self.log.borrow_mut().push(format!("read {}", path.display()));
        if self.fail_read {
            return Err(anyhow!("permission denied"));
        }
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such file"))
    }

    fn install(&self, source: &Path, dest: &Path) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("install {}", dest.display()));
        if self.fail_install {
            return Err(anyhow!("read-only filesystem"));
        }
        let text = std::fs::read_to_string(source)?;
        std::fs::remove_file(source)?;
        self.files.borrow_mut().insert(dest.to_path_buf(), text);
        Ok(())
    }

    fn chown(&self, path: &Path, owner: &str) -> anyhow::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("chown {owner} {}", path.display()));
        Ok(())
    }

    fn chmod(&self, path: &Path, mode: &str) -> anyhow::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("chmod {mode} {}", path.display()));
        Ok(())
    }

    fn run(&self, argv: &[&str]) -> anyhow::Result<String> {
        self.log.borrow_mut().push(argv.join(" "));
        match self.run_results.borrow_mut().pop_front() {
            Some(Ok(out)) => Ok(out),
            Some(Err(reason)) => Err(anyhow!("{reason}")),
            None => Ok(String::new()),
        }
    }
}

fn target() -> TunnelTarget {
    TunnelTarget {
        config_path: PathBuf::from("/etc/wireguard/wg0-client.conf"),
        ..TunnelTarget::default()
    }
}

#[test]
fn swaps_address_and_restarts_in_order() {
    let target = target();
    let fake = FakeElevator::with_file(&target.config_path, TUNNEL);
    fake.script(vec![Ok(""), Ok(""), Ok("interface: wg0-client\n")]);

    let report =
        apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect("apply endpoint");

    assert_eq!(
        fake.contents(&target.config_path),
        TUNNEL.replace("10.0.0.1:51820", "203.0.113.5:51820")
    );
    assert!(report.content_changed);
    assert_eq!(report.status.as_deref(), Some("interface: wg0-client\n"));
    assert_eq!(
        fake.log(),
        [
            "read /etc/wireguard/wg0-client.conf",
            "install /etc/wireguard/wg0-client.conf",
            "chown root:root /etc/wireguard/wg0-client.conf",
            "chmod 600 /etc/wireguard/wg0-client.conf",
            "wg-quick down wg0-client",
            "wg-quick up wg0-client",
            "wg show wg0-client",
        ]
    );
}

#[test]
fn same_address_twice_keeps_content_but_restarts_both_times() {
    let target = target();
    let fake = FakeElevator::with_file(&target.config_path, TUNNEL);
    let address = Ipv4Addr::new(203, 0, 113, 5);

    apply_endpoint(&fake, &target, address).expect("first apply");
    let after_first = fake.contents(&target.config_path);
    let second = apply_endpoint(&fake, &target, address).expect("second apply");

    assert_eq!(fake.contents(&target.config_path), after_first);
    assert!(!second.content_changed);
    let ups = fake
        .log()
        .iter()
        .filter(|line| line.as_str() == "wg-quick up wg0-client")
        .count();
    assert_eq!(ups, 2);
}

#[test]
fn missing_endpoint_line_warns_and_still_restarts() {
    let target = target();
    let text = "[Interface]\nAddress = 10.8.0.2/24\n";
    let fake = FakeElevator::with_file(&target.config_path, text);

    let report = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect("apply");
    assert_eq!(report.replacements, 0);
    assert_eq!(fake.contents(&target.config_path), text);
    assert!(fake.log().contains(&"wg-quick up wg0-client".to_string()));
}

#[test]
fn down_failure_is_not_fatal() {
    let target = target();
    let fake = FakeElevator::with_file(&target.config_path, TUNNEL);
    fake.script(vec![Err("wg0-client is not a WireGuard interface")]);

    let report = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect("apply");
    assert!(report.down_warning.is_some());
}

#[test]
fn read_failure_is_privileged_read_failed() {
    let target = target();
    let fake = FakeElevator {
        fail_read: true,
        ..FakeElevator::with_file(&target.config_path, TUNNEL)
    };

    let err = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect_err("read");
    assert!(matches!(err, Error::PrivilegedReadFailed { .. }), "{err}");
    assert_eq!(fake.log().len(), 1);
}

#[test]
fn install_failure_is_privileged_write_failed_and_skips_restart() {
    let target = target();
    let fake = FakeElevator {
        fail_install: true,
        ..FakeElevator::with_file(&target.config_path, TUNNEL)
    };

    let err = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect_err("write");
    assert!(matches!(err, Error::PrivilegedWriteFailed { .. }), "{err}");
    assert!(!fake.log().iter().any(|line| line.starts_with("wg-quick")));
    assert_eq!(fake.contents(&target.config_path), TUNNEL);
}

#[test]
fn up_failure_restores_snapshot_and_retries() {
    let target = target();
    let fake = FakeElevator::with_file(&target.config_path, TUNNEL);
    fake.script(vec![Ok(""), Err("RTNETLINK answers: Address in use"), Ok("")]);

    let err = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect_err("up");
    match err {
        Error::ServiceRestartFailed { rolled_back, .. } => assert!(rolled_back),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(fake.contents(&target.config_path), TUNNEL);
    let ups = fake
        .log()
        .iter()
        .filter(|line| line.as_str() == "wg-quick up wg0-client")
        .count();
    assert_eq!(ups, 2);
}

#[test]
fn rollback_that_cannot_bring_interface_up_is_reported() {
    let target = target();
    let fake = FakeElevator::with_file(&target.config_path, TUNNEL);
    fake.script(vec![Ok(""), Err("up failed"), Err("still failing")]);

    let err = apply_endpoint(&fake, &target, Ipv4Addr::new(203, 0, 113, 5)).expect_err("up");
    assert!(matches!(
        err,
        Error::ServiceRestartFailed {
            rolled_back: false,
            ..
        }
    ));
}
