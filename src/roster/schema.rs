//! Locale to column-label table.
//!
//! Adding a locale means adding a variant and a table row; nothing else in
//! the pipeline branches on locale.
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Locale {
    #[value(name = "EN", alias = "en")]
    #[serde(rename = "EN")]
    En = 0,
    #[value(name = "PL", alias = "pl")]
    #[serde(rename = "PL")]
    Pl = 1,
}

/// Column labels a roster must carry for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleSchema {
    pub locale: Locale,
    pub code: &'static str,
    pub name: &'static str,
    pub email: &'static str,
    pub registered: &'static str,
}

/// Indexed by `Locale as usize`.
pub const LOCALE_SCHEMAS: [LocaleSchema; 2] = [
    LocaleSchema {
        locale: Locale::En,
        code: "EN",
        name: "Username:",
        email: "E-Mail Address:",
        registered: "Timestamp:",
    },
    LocaleSchema {
        locale: Locale::Pl,
        code: "PL",
        name: "Nazwa Użytkownika:",
        email: "Adres E-Mail:",
        registered: "Sygnatura czasowa:",
    },
];

impl Locale {
    pub fn schema(self) -> &'static LocaleSchema {
        &LOCALE_SCHEMAS[self as usize]
    }

    /// Uppercase code stored in the document's subject state.
    pub fn code(self) -> &'static str {
        self.schema().code
    }

    /// Key into `user_management.data_sources`.
    pub fn data_source_key(self) -> String {
        self.code().to_ascii_lowercase()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LOCALE_SCHEMAS
            .iter()
            .find(|schema| schema.code.eq_ignore_ascii_case(wanted))
            .map(|schema| schema.locale)
            .ok_or_else(|| format!("unknown locale {wanted:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_line_up_with_variants() {
        for (index, schema) in LOCALE_SCHEMAS.iter().enumerate() {
            assert_eq!(schema.locale as usize, index, "row {index} out of order");
        }
    }

    #[test]
    fn locale_codes_parse_case_insensitively() {
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" PL ".parse::<Locale>(), Ok(Locale::Pl));
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::Pl.data_source_key(), "pl");
    }
}
