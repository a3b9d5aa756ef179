//! Tabular roster loading.
//!
//! The header row is checked against the locale schema before any row is
//! read, so a roster with a missing column is rejected whole.
use super::{LocaleSchema, SubjectRecord};
use crate::error::{Error, Result};
use std::path::Path;

/// Which schema columns the caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterColumns {
    /// Name, email and registration timestamp.
    Full,
    /// Name only; email and timestamp are read when present.
    NameOnly,
}

/// Load an ordered roster, resolving locale labels to canonical fields.
pub fn load(
    schema: &LocaleSchema,
    path: &Path,
    columns: RosterColumns,
) -> Result<Vec<SubjectRecord>> {
    if !path.is_file() {
        return Err(Error::DataSourceMissing {
            locale: schema.code.to_string(),
            detail: format!("{} is not a readable file", path.display()),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| Error::DataSourceMissing {
            locale: schema.code.to_string(),
            detail: format!("open {}: {err}", path.display()),
        })?;

    let headers = reader
        .headers()
        .map_err(|err| mismatch(path, format!("read header row: {err}")))?
        .clone();
    let position = |label: &str| headers.iter().position(|header| header == label);

    let name_idx = position(schema.name);
    let email_idx = position(schema.email);
    let registered_idx = position(schema.registered);

    let mut missing = Vec::new();
    if name_idx.is_none() {
        missing.push(schema.name);
    }
    if columns == RosterColumns::Full {
        if email_idx.is_none() {
            missing.push(schema.email);
        }
        if registered_idx.is_none() {
            missing.push(schema.registered);
        }
    }
    let Some(name_idx) = name_idx.filter(|_| missing.is_empty()) else {
        return Err(mismatch(
            path,
            format!("missing column(s) {}", quoted_list(&missing)),
        ));
    };

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|err| mismatch(path, format!("row {}: {err}", row + 1)))?;
        let field = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .unwrap_or_default()
                .to_string()
        };
        records.push(SubjectRecord {
            name: field(Some(name_idx)),
            email: field(email_idx),
            registered: field(registered_idx),
        });
    }
    tracing::info!(
        path = %path.display(),
        locale = schema.code,
        records = records.len(),
        "roster loaded"
    );
    Ok(records)
}

fn mismatch(path: &Path, detail: String) -> Error {
    Error::SchemaMismatch {
        path: path.to_path_buf(),
        detail,
    }
}

fn quoted_list(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| format!("{label:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
