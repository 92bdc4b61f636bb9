use anyhow::Result;

use crate::workflow::SearchReport;

/// Print a plain-text representation of the search report.
pub(crate) fn print_plain(report: &SearchReport) {
    print!("{}", format_plain(report));
}

pub(crate) fn format_plain(report: &SearchReport) -> String {
    let view = &report.view;
    let mut out = String::new();

    if !report.location.is_empty() {
        out.push_str(&format!("{}\n", report.location));
    }

    if let Some(error) = &view.error {
        out.push_str(&format!("error: {}\n", error.message));
        if let Some(hint) = &error.hint {
            out.push_str(&format!("hint: {hint}\n"));
        }
    } else if view.query.is_empty() {
        out.push_str("Enter a query to search.\n");
    } else if view.results.is_empty() {
        out.push_str(&format!("No results for '{}'\n", view.query));
    } else {
        out.push_str(&format!(
            "{} results for '{}' (page {} of {})\n",
            view.total_results, view.query, view.current_page, view.total_pages
        ));
        for hit in &view.results {
            match &hit.repository {
                Some(repository) => out.push_str(&format!("  {repository}: {}\n", hit.path)),
                None => out.push_str(&format!("  {}\n", hit.path)),
            }
        }
    }

    for (dimension, options) in &report.facets {
        let rendered: Vec<String> = options
            .iter()
            .map(|option| {
                let marker = if option.selected { "*" } else { "" };
                match option.count {
                    Some(count) => format!("{marker}{} ({count})", option.value),
                    None => format!("{marker}{}", option.value),
                }
            })
            .collect();
        out.push_str(&format!("{dimension}: {}\n", rendered.join(", ")));
    }

    let sizes: Vec<String> = report
        .size_presets
        .iter()
        .filter(|preset| preset.selected || preset.count.is_some())
        .map(|preset| {
            let marker = if preset.selected { "*" } else { "" };
            match preset.count {
                Some(count) => format!("{marker}{} ({count})", preset.label),
                None => format!("{marker}{}", preset.label),
            }
        })
        .collect();
    if !sizes.is_empty() {
        out.push_str(&format!("size: {}\n", sizes.join(", ")));
    }

    out
}

/// Format the search report as a JSON string.
pub(crate) fn format_report_json(report: &SearchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Print the JSON representation of the search report.
pub(crate) fn print_json(report: &SearchReport) -> Result<()> {
    println!("{}", format_report_json(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use codesift::facets::FacetOption;
    use codesift::fetch::{LoadingIndicator, SearchHit};
    use codesift::{FilterDimension, ResultsView};
    use serde_json::Value;

    use super::*;

    fn report() -> SearchReport {
        let mut hit = SearchHit::new("src/lib.rs");
        hit.repository = Some("core".into());
        let mut facets = BTreeMap::new();
        facets.insert(
            FilterDimension::Extension,
            vec![FacetOption {
                value: "rs".into(),
                count: Some(4),
                selected: true,
            }],
        );
        SearchReport {
            location: "?q=lib".into(),
            view: ResultsView {
                results: vec![hit],
                query: "lib".into(),
                is_loading: false,
                is_fetching: false,
                indicator: LoadingIndicator::Idle,
                error: None,
                total_results: 1,
                current_page: 1,
                total_pages: 1,
                page_size: 20,
                regex_search: false,
            },
            facets,
            size_presets: Vec::new(),
        }
    }

    #[test]
    fn plain_lists_results_and_facets() {
        let text = format_plain(&report());
        assert!(text.contains("1 results for 'lib' (page 1 of 1)"));
        assert!(text.contains("  core: src/lib.rs"));
        assert!(text.contains("extension: *rs (4)"));
    }

    #[test]
    fn json_format_includes_view_and_facets() {
        let json = format_report_json(&report()).expect("json");
        let value: Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["view"]["results"][0]["path"], "src/lib.rs");
        assert_eq!(value["view"]["indicator"], "idle");
        assert_eq!(value["facets"]["extension"][0]["count"], 4);
    }
}
