//! Union merge of per-provider reports.
//!
//! Headers come from the first report; rows of later reports are appended
//! as they are, without reconciling columns across providers.

use adreport_core::report::{Cell, ProviderSlug, TabularReport};

pub const PROVIDER_HEADER: &str = "Provider";

pub fn union_merge(results: &[(ProviderSlug, TabularReport)]) -> TabularReport {
    let Some((_, first)) = results.first() else {
        return TabularReport::default().with_meta("Empty union");
    };

    let headers = std::iter::once(PROVIDER_HEADER.to_string())
        .chain(first.headers.iter().cloned())
        .collect();
    let rows = results
        .iter()
        .flat_map(|(slug, report)| {
            report.rows.iter().map(move |row| {
                std::iter::once(Cell::from(slug.as_str()))
                    .chain(row.iter().cloned())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut providers: Vec<&str> = Vec::new();
    for (slug, _) in results {
        if !providers.contains(&slug.as_str()) {
            providers.push(slug.as_str());
        }
    }

    TabularReport::new(headers, rows)
        .with_meta("Union of providers")
        .with_meta(format!("Providers: {}", providers.join(", ")))
}
