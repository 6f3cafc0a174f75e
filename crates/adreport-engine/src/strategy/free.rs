//! Organic traffic: traffic source, then search engine within the source.

pub const MAIN_DIMENSION: &str = "ym:s:lastSignTrafficSource";
pub const DETAIL_DIMENSION: &str = "ym:s:lastSignSourceEngine";
pub const COLUMN_LABEL: &str = "Traffic source";

/// Quote a value for a Metrika filter expression.
pub(crate) fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Ad traffic is excluded unless the report covers all traffic.
pub fn main_filter(include_ad: bool) -> Option<String> {
    (!include_ad).then(|| format!("{MAIN_DIMENSION}!='ad'"))
}

pub fn detail_filter(source: &str) -> String {
    format!("{MAIN_DIMENSION}=='{}'", quote(source))
}
