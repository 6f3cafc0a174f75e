//! Direct advertising: campaign, then ad group within the campaign.
//!
//! Campaign dimensions are only available for queries scoped to advertiser
//! logins, so this strategy cannot run without a client scope.

use super::free::quote;

pub const COLUMN_LABEL: &str = "Campaign";

pub fn main_dimension(attribution: &str) -> String {
    format!("ym:ad:{attribution}DirectOrder")
}

pub fn detail_dimension(attribution: &str) -> String {
    format!("ym:ad:{attribution}DirectBannerGroup")
}

pub fn detail_filter(attribution: &str, order: &str) -> String {
    format!("{}=='{}'", main_dimension(attribution), quote(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_carry_attribution() {
        assert_eq!(main_dimension("LAST"), "ym:ad:LASTDirectOrder");
        assert_eq!(detail_dimension("LAST"), "ym:ad:LASTDirectBannerGroup");
        assert_eq!(detail_filter("LAST", "42"), "ym:ad:LASTDirectOrder=='42'");
    }
}
