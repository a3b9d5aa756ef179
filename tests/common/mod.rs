//! Shared helpers for driving the compiled binaries.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn troster(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_troster"));
    cmd.current_dir(cwd).env("RUST_LOG", "warn");
    cmd
}

pub fn endpoint_rewrite(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_endpoint-rewrite"));
    cmd.current_dir(cwd).env("RUST_LOG", "warn");
    cmd
}

pub fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("spawn binary")
}

pub fn shell_available() -> bool {
    which_sh().is_some()
}

fn which_sh() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("sh"))
        .find(|candidate| candidate.is_file())
}

/// Write `config.yaml` plus an English roster with alice and bob.
pub fn write_fixture(dir: &Path, extra_yaml: &str) -> PathBuf {
    let roster = dir.join("roster_en.csv");
    std::fs::write(
        &roster,
        "Timestamp:,Username:,E-Mail Address:\n\
         2024/05/01 09:15,alice,alice@example.net\n\
         2024/05/02 11:40,bob,bob@example.net\n",
    )
    .expect("write roster");
    let config = dir.join("config.yaml");
    let yaml = format!(
        "user_management:\n  data_sources:\n    en: '{}'\nemail:\n  sender: ops@example.net\n{extra_yaml}",
        roster.display()
    );
    std::fs::write(&config, yaml).expect("write config");
    config
}

pub fn read_yaml(path: &Path) -> serde_yaml::Value {
    let text = std::fs::read_to_string(path).expect("read config");
    serde_yaml::from_str(&text).expect("parse config")
}
