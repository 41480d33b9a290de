/// Country (or country-like entity) name after normalization.
/// Examples: `Nigeria`, `Ghana`, `Multiple Targets`
pub type CountryName = String;
/// Citation identifier referencing a row of the companion citation table.
/// Examples: `12`, `45`, `UNHCR-1983`
pub type SourceId = String;
/// Name of the expelled/displaced population recorded on a row.
/// Examples: `Ghanaians`, `N/A`
pub type GroupName = String;
/// Calendar year.
/// Example: `1983`
pub type Year = i32;
/// Column name in a source table.
/// Examples: `origin_name`, `mean_estimate`, `start_year`
pub type ColumnName = String;
/// Identifier of a row source (usually the file name it was read from).
/// Examples: `annualized_data.csv`, `inline`
pub type RowSourceId = String;
/// Color string handed to renderers.
/// Example: `hsl(212.4, 81.0%, 58.2%)`
pub type ColorValue = String;
