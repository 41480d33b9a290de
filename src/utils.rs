//! Cell parsing helpers shared by the normalizer and table loaders.

use std::collections::BTreeSet;

use crate::constants::normalize::{LIST_DELIMITER, PLACEHOLDER_SOURCE_IDS};
use crate::types::SourceId;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Returns `true` when the cell names more than one entity.
pub fn is_multi_entity(text: &str) -> bool {
    text.contains(LIST_DELIMITER)
}

/// Split a `;`-delimited cell into trimmed, non-empty members.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(LIST_DELIMITER)
        .map(normalize_inline_whitespace)
        .filter(|member| !member.is_empty())
        .collect()
}

/// Parse a citation cell, dropping placeholder tokens such as `NA` or `unknown`.
pub fn parse_source_ids(text: &str) -> BTreeSet<SourceId> {
    split_list(text)
        .into_iter()
        .filter(|id| {
            !PLACEHOLDER_SOURCE_IDS
                .iter()
                .any(|placeholder| id.eq_ignore_ascii_case(placeholder))
        })
        .collect()
}

/// Parse an integer cell, accepting integral floats such as `1983.0`.
pub fn parse_integral(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a magnitude cell. Thousands separators are ignored; non-finite values are rejected.
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|ch| *ch != ',').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
