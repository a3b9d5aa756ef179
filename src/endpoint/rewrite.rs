//! `Endpoint = <ip>[:<port>]` substitution.
//!
//! Only the dotted IPv4 run after `=` is replaced; the port suffix and every
//! other byte of the file are kept as they were.
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::OnceLock;

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Number of `Endpoint` lines matched.
    pub replacements: usize,
}

impl Rewrite {
    pub fn changed(&self, original: &str) -> bool {
        self.text != original
    }
}

fn endpoint_line() -> &'static Regex {
    static ENDPOINT: OnceLock<Regex> = OnceLock::new();
    ENDPOINT.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*Endpoint[ \t]*=[ \t]*)[0-9.]+")
            .expect("regex for endpoint lines")
    })
}

/// Replace the address on every `Endpoint` line of `text`.
pub fn rewrite_endpoint(text: &str, address: Ipv4Addr) -> Rewrite {
    let regex = endpoint_line();
    let replacements = regex.find_iter(text).count();
    let text = regex
        .replace_all(text, |caps: &Captures<'_>| format!("{}{address}", &caps[1]))
        .into_owned();
    Rewrite { text, replacements }
}

/// Rewrite a file in place without privilege escalation.
///
/// A file with no `Endpoint` line is left untouched and reported with
/// `replacements == 0`; callers treat that as a warning.
pub fn rewrite_file(path: &Path, address: Ipv4Addr) -> Result<Rewrite> {
    let original =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let rewrite = rewrite_endpoint(&original, address);
    if rewrite.replacements == 0 {
        tracing::warn!(path = %path.display(), "no Endpoint line found; file left unchanged");
        return Ok(rewrite);
    }
    if rewrite.changed(&original) {
        fs::write(path, rewrite.text.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
    }
    tracing::info!(path = %path.display(), %address, "endpoint rewritten");
    Ok(rewrite)
}
