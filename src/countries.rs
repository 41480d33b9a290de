//! Country name directory and ISO alpha-2 lookup.

use std::collections::{BTreeSet, HashMap};

use tracing::info;

use crate::constants::country_code_columns;
use crate::constants::lookup::UNKNOWN_ALPHA2;
use crate::data::{CountryName, Event, RawRow};
use crate::errors::PipelineError;
use crate::source::{RowSource, read_rows};

/// Sorted, distinct country names seen in the canonical event set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryDirectory {
    names: Vec<CountryName>,
}

impl CountryDirectory {
    /// Collect every origin and target name.
    pub fn from_events(events: &[Event]) -> Self {
        let names: BTreeSet<&CountryName> = events
            .iter()
            .flat_map(|event| [&event.origin, &event.target])
            .collect();
        Self {
            names: names.into_iter().cloned().collect(),
        }
    }

    /// All names, ascending.
    pub fn names(&self) -> &[CountryName] {
        &self.names
    }

    /// Returns `true` when `name` is a known country.
    pub fn contains(&self, name: &str) -> bool {
        self.names
            .binary_search_by(|candidate| candidate.as_str().cmp(name))
            .is_ok()
    }

    /// Case-insensitive substring search, in directory order. A blank term
    /// matches nothing.
    pub fn search(&self, term: &str) -> Vec<&CountryName> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Country name to ISO 3166-1 alpha-2 code lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryCodes {
    codes: HashMap<String, String>,
}

impl CountryCodes {
    /// Build from `name, alpha-2` rows; names match case-insensitively.
    pub fn from_rows<I: IntoIterator<Item = RawRow>>(rows: I) -> Self {
        let mut codes = HashMap::new();
        for row in rows {
            if let (Some(name), Some(code)) = (
                row.get_trimmed(country_code_columns::NAME),
                row.get_trimmed(country_code_columns::ALPHA2),
            ) {
                codes
                    .entry(name.to_lowercase())
                    .or_insert_with(|| code.to_lowercase());
            }
        }
        Self { codes }
    }

    /// Read every row of `source`.
    pub fn from_source(source: &dyn RowSource) -> Result<Self, PipelineError> {
        let codes = Self::from_rows(read_rows(source)?);
        info!(source = source.id(), countries = codes.len(), "loaded country codes");
        Ok(codes)
    }

    /// Number of known names.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` when no codes are loaded.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Lower-case alpha-2 code for `name`, or `"xx"` when unknown.
    pub fn alpha2(&self, name: &str) -> &str {
        self.codes
            .get(&name.trim().to_lowercase())
            .map_or(UNKNOWN_ALPHA2, String::as_str)
    }
}
