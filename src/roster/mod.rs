//! Roster input: locale schemas and ordered subject records.
mod schema;
mod source;

pub use schema::{Locale, LocaleSchema, LOCALE_SCHEMAS};
pub use source::{load, RosterColumns};

/// One roster row in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubjectRecord {
    pub name: String,
    pub email: String,
    /// Registration timestamp, kept verbatim from the roster.
    pub registered: String,
}
