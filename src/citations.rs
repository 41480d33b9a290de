//! Companion citation table and bibliography ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::constants::citation_columns;
use crate::data::{RawRow, Year};
use crate::errors::PipelineError;
use crate::source::{RowSource, read_rows};
use crate::types::SourceId;
use crate::utils::{normalize_inline_whitespace, parse_integral};

/// One bibliography entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// Citation id referenced by event rows.
    pub id: SourceId,
    /// Publication year, when parseable.
    pub year: Option<Year>,
    /// Author line.
    pub author: String,
    /// Title.
    pub title: String,
    /// Link with a scheme, if the table has a usable one.
    pub link: Option<String>,
}

/// Citations resolved for a set of ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Bibliography {
    /// Resolved entries in display order.
    pub entries: Vec<Citation>,
    /// Requested ids missing from the table, in display order.
    pub unresolved: Vec<SourceId>,
}

/// Display order for citation ids: numeric ids ascending first, then the
/// rest case-insensitively.
pub fn compare_source_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// Add `http://` to scheme-less links; drop empty and `n/a` links.
pub fn normalize_link(raw: &str) -> Option<String> {
    let link = raw.trim();
    if link.is_empty() || link.eq_ignore_ascii_case("n/a") || link.eq_ignore_ascii_case("na") {
        return None;
    }
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(link.to_string())
    } else {
        Some(format!("http://{link}"))
    }
}

/// Citation table keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CitationTable {
    entries: BTreeMap<SourceId, Citation>,
}

impl CitationTable {
    /// Build from raw rows. Rows without an id are skipped; the first row
    /// for a repeated id wins.
    pub fn from_rows<I: IntoIterator<Item = RawRow>>(rows: I) -> Self {
        let mut entries = BTreeMap::new();
        for row in rows {
            let Some(id) = row.get_trimmed(citation_columns::ID) else {
                debug!(row = row.index, "citation row without id skipped");
                continue;
            };
            let text = |column: &str| {
                row.get_trimmed(column)
                    .map(normalize_inline_whitespace)
                    .unwrap_or_default()
            };
            let citation = Citation {
                id: id.to_string(),
                year: row
                    .get_trimmed(citation_columns::YEAR)
                    .and_then(parse_integral)
                    .and_then(|year| Year::try_from(year).ok()),
                author: text(citation_columns::AUTHOR),
                title: text(citation_columns::TITLE),
                link: row.get(citation_columns::LINK).and_then(normalize_link),
            };
            entries.entry(citation.id.clone()).or_insert(citation);
        }
        Self { entries }
    }

    /// Read every row of `source`.
    pub fn from_source(source: &dyn RowSource) -> Result<Self, PipelineError> {
        let table = Self::from_rows(read_rows(source)?);
        info!(source = source.id(), citations = table.len(), "loaded citation table");
        Ok(table)
    }

    /// Number of citations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no citations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one citation.
    pub fn get(&self, id: &str) -> Option<&Citation> {
        self.entries.get(id)
    }

    /// Resolve `ids` into display order, reporting ids the table lacks.
    pub fn bibliography<'a, I>(&self, ids: I) -> Bibliography
    where
        I: IntoIterator<Item = &'a SourceId>,
    {
        let mut ids: Vec<&SourceId> = ids.into_iter().collect();
        ids.sort_by(|a, b| compare_source_ids(a, b));
        ids.dedup();
        let mut bibliography = Bibliography::default();
        for id in ids {
            match self.entries.get(id.as_str()) {
                Some(citation) => bibliography.entries.push(citation.clone()),
                None => bibliography.unresolved.push(id.clone()),
            }
        }
        bibliography
    }
}
