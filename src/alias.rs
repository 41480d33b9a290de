//! Entity-alias resolution applied to origin/target cells during normalization.
//!
//! Source tables sometimes record a single-country event as a country list or
//! under a variant spelling. An [`AliasTable`] rewrites such cells to one
//! canonical name before multi-entity detection runs.

use serde::Serialize;

use crate::data::{CountryName, Year, YearSpan};
use crate::utils::split_list;

/// Which side of an event a rule rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasField {
    /// Rewrite the origin cell.
    Origin,
    /// Rewrite the target cell.
    Target,
}

/// One alias rule.
///
/// A rule fires when its scope holds (counterpart and year range, if set) and
/// either the cell (or any `;`-separated member of it) equals one of `names`,
/// or the row's event text contains one of `text_keywords`. Comparisons are
/// case-insensitive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AliasRule {
    /// Side rewritten by this rule.
    pub field: AliasField,
    /// Replacement value.
    pub canonical: CountryName,
    /// Cell values (or list members) that trigger the rule.
    pub names: Vec<String>,
    /// Event-text fragments that trigger the rule.
    pub text_keywords: Vec<String>,
    /// Required value of the opposite side, if any.
    pub counterpart: Option<CountryName>,
    /// Start-year range the rule is limited to, if any.
    pub years: Option<YearSpan>,
}

impl AliasRule {
    /// Create a rule rewriting `field` to `canonical` with no triggers yet.
    pub fn new(field: AliasField, canonical: impl Into<CountryName>) -> Self {
        Self {
            field,
            canonical: canonical.into(),
            names: Vec::new(),
            text_keywords: Vec::new(),
            counterpart: None,
            years: None,
        }
    }

    /// Add cell values that trigger the rule.
    pub fn matching_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add event-text fragments that trigger the rule.
    pub fn matching_text<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_keywords
            .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    /// Restrict the rule to rows whose opposite side equals `counterpart`.
    pub fn with_counterpart(mut self, counterpart: impl Into<CountryName>) -> Self {
        self.counterpart = Some(counterpart.into());
        self
    }

    /// Restrict the rule to rows whose start year falls in `years`.
    pub fn within_years(mut self, years: YearSpan) -> Self {
        self.years = Some(years);
        self
    }

    fn applies(&self, value: &str, counterpart: &str, input: &AliasInput<'_>) -> bool {
        if let Some(required) = &self.counterpart
            && !required.eq_ignore_ascii_case(counterpart)
        {
            return false;
        }
        if let Some(years) = self.years
            && !years.contains(input.year)
        {
            return false;
        }
        self.matches_name(value) || self.matches_text(input.event_text)
    }

    fn matches_name(&self, value: &str) -> bool {
        let is_alias = |candidate: &str| {
            self.names
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(candidate))
        };
        is_alias(value.trim()) || split_list(value).iter().any(|member| is_alias(member))
    }

    fn matches_text(&self, text: Option<&str>) -> bool {
        let Some(text) = text else {
            return false;
        };
        let text = text.to_lowercase();
        self.text_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
    }
}

/// Raw row fields consulted by alias rules.
#[derive(Clone, Copy, Debug)]
pub struct AliasInput<'a> {
    /// Trimmed origin cell.
    pub origin: &'a str,
    /// Trimmed target cell.
    pub target: &'a str,
    /// Free-text event description, when the table has one.
    pub event_text: Option<&'a str>,
    /// Start year of the row.
    pub year: Year,
}

/// Ordered collection of alias rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
}

impl AliasTable {
    /// Empty table; resolution is the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules are tried in insertion order.
    pub fn with_rule(mut self, rule: AliasRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve origin then target. The first matching rule per side wins, and
    /// target rules see the already-resolved origin as their counterpart.
    pub fn resolve(&self, input: &AliasInput<'_>) -> (CountryName, CountryName) {
        let origin = self
            .first_match(AliasField::Origin, input.origin, input.target, input)
            .unwrap_or(input.origin)
            .to_string();
        let target = self
            .first_match(AliasField::Target, input.target, &origin, input)
            .unwrap_or(input.target)
            .to_string();
        (origin, target)
    }

    fn first_match<'r>(
        &'r self,
        field: AliasField,
        value: &str,
        counterpart: &str,
        input: &AliasInput<'_>,
    ) -> Option<&'r str> {
        self.rules
            .iter()
            .filter(|rule| rule.field == field)
            .find(|rule| rule.applies(value, counterpart, input))
            .map(|rule| rule.canonical.as_str())
    }
}
