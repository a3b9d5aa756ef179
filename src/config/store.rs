//! Whole-document load and save for the shared YAML config.
//!
//! There is no field-level update and no merge: every save overwrites the file
//! with the caller's in-memory copy. Concurrent writers are kept out by
//! [`super::RunGuard`], not by this module.
use super::ConfigDocument;
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Check-out/check-in access to the shared document.
pub trait DocumentStore {
    fn load(&self) -> Result<ConfigDocument>;
    fn save(&self, doc: &ConfigDocument) -> Result<()>;
    /// Location handed to external stages so they can read the same document.
    fn location(&self) -> &Path;
}

/// YAML file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for ConfigStore {
    fn load(&self) -> Result<ConfigDocument> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigMissing {
                    path: self.path.clone(),
                })
            }
            Err(err) => {
                return Err(Error::ConfigMalformed {
                    path: self.path.clone(),
                    reason: err.to_string(),
                })
            }
        };
        if text.trim().is_empty() {
            return Err(Error::ConfigMalformed {
                path: self.path.clone(),
                reason: "document is empty".to_string(),
            });
        }
        let doc: ConfigDocument =
            serde_yaml::from_str(&text).map_err(|err| Error::ConfigMalformed {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        tracing::debug!(path = %self.path.display(), "config loaded");
        Ok(doc)
    }

    fn save(&self, doc: &ConfigDocument) -> Result<()> {
        let write_error = |source: io::Error| Error::ConfigWriteError {
            path: self.path.clone(),
            source,
        };
        let text = serde_yaml::to_string(doc).map_err(|err| write_error(io::Error::other(err)))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
        tmp.write_all(text.as_bytes()).map_err(write_error)?;
        tmp.persist(&self.path)
            .map_err(|err| write_error(err.error))?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
