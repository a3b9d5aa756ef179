//! Single-run guard for the shared document.
use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Exclusive `<config>.lock` marker held for the duration of a run.
///
/// Dropping the guard removes the marker. A marker left behind by a crashed
/// run has to be removed by hand.
#[derive(Debug)]
pub struct RunGuard {
    path: PathBuf,
}

impl RunGuard {
    pub fn acquire(config_path: &Path) -> Result<Self> {
        let path = lock_path_for(config_path);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::RunLocked { path })
            }
            Err(source) => return Err(Error::ConfigWriteError { path, source }),
        };
        if let Err(source) = writeln!(file, "{}", std::process::id()) {
            let _ = fs::remove_file(&path);
            return Err(Error::ConfigWriteError { path, source });
        }
        tracing::debug!(lock = %path.display(), "run guard acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %err, "failed to release run guard");
        }
    }
}

fn lock_path_for(config_path: &Path) -> PathBuf {
    let mut name = config_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "config".into());
    name.push(".lock");
    config_path.with_file_name(name)
}
