/// Default column names for the event table.
pub mod columns {
    /// Origin country column.
    pub const ORIGIN: &str = "origin_name";
    /// Target country column.
    pub const TARGET: &str = "target_name";
    /// Magnitude estimate column.
    pub const MAGNITUDE: &str = "mean_estimate";
    /// Event type code column (1-4).
    pub const EVENT_TYPE: &str = "event_type";
    /// Point-year column.
    pub const YEAR: &str = "year";
    /// First year of a year range.
    pub const START_YEAR: &str = "start_year";
    /// Last year of a year range.
    pub const END_YEAR: &str = "end_year";
    /// `;`-delimited citation id column.
    pub const SOURCE_IDS: &str = "data_source_id";
    /// Expelled group column (part of the duplicate group key).
    pub const EXPELLED_GROUP: &str = "expelled_group";
    /// Free-text event description, consulted by alias rules.
    pub const EVENT_TEXT: &str = "event_text";
}

/// Column names for the companion citation table.
pub mod citation_columns {
    /// Citation id column.
    pub const ID: &str = "data_source_id";
    /// Publication year column.
    pub const YEAR: &str = "year";
    /// Author column.
    pub const AUTHOR: &str = "author";
    /// Title column.
    pub const TITLE: &str = "title";
    /// Link column.
    pub const LINK: &str = "link";
}

/// Column names for the country ISO code table.
pub mod country_code_columns {
    /// Country name column.
    pub const NAME: &str = "name";
    /// ISO 3166-1 alpha-2 code column.
    pub const ALPHA2: &str = "alpha-2";
}

/// Sentinels and placeholder tokens used during normalization.
pub mod normalize {
    /// Separator marking multi-entity origin/target fields and citation lists.
    pub const LIST_DELIMITER: char = ';';
    /// Sentinel substituted for multi-country origin fields.
    pub const MULTIPLE_ORIGINS: &str = "Multiple Origins";
    /// Sentinel substituted for multi-country target fields.
    pub const MULTIPLE_TARGETS: &str = "Multiple Targets";
    /// Expelled group used when the column is blank or absent.
    pub const DEFAULT_EXPELLED_GROUP: &str = "N/A";
    /// Citation tokens dropped during parsing (compared case-insensitively).
    pub const PLACEHOLDER_SOURCE_IDS: [&str; 3] = ["na", "n/a", "unknown"];
}

/// Year window defaults and limits.
pub mod window {
    use crate::types::Year;

    /// First year offered by the dashboard's window control.
    pub const DEFAULT_START_YEAR: Year = 1950;
    /// Last year offered by the dashboard's window control.
    pub const DEFAULT_END_YEAR: Year = 2025;
    /// Widest window accepted by `YearWindow::new`.
    pub const MAX_WINDOW_YEARS: u32 = 2_000;
}

/// Ranges used by deterministic color assignment.
pub mod color {
    /// Minimum saturation of generated colors.
    pub const SATURATION_MIN: f64 = 0.75;
    /// Saturation spread above the minimum.
    pub const SATURATION_SPREAD: f64 = 0.25;
    /// Minimum lightness of generated colors.
    pub const LIGHTNESS_MIN: f64 = 0.55;
    /// Lightness spread above the minimum.
    pub const LIGHTNESS_SPREAD: f64 = 0.10;
    /// Seed mixed into node-name hashes.
    pub const COLOR_SEED: u64 = 0xC0_10_12;
}

/// Lookup defaults.
pub mod lookup {
    /// Alpha-2 code returned for countries missing from the ISO table.
    pub const UNKNOWN_ALPHA2: &str = "xx";
    /// Default number of counterparts returned by `counterpart_breakdown`.
    pub const DEFAULT_COUNTERPART_LIMIT: usize = 10;
}

/// File names written by the export module.
pub mod export {
    /// Chord payload file.
    pub const CHORD_FILE: &str = "view.chord.json";
    /// Trend payload file.
    pub const TREND_FILE: &str = "view.trend.json";
    /// Sankey payload file (only written when a country is selected).
    pub const SANKEY_FILE: &str = "view.sankey.json";
    /// Manifest file listing the written payloads.
    pub const INDEX_FILE: &str = "view.index.json";
    /// Manifest format version.
    pub const INDEX_VERSION: u32 = 1;
}
