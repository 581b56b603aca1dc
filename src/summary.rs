//! First-stage overview charts across every known platform.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::data::{normalize, Table, Value, APP, COUNTRY};
use crate::graph::Figure;
use crate::query::ColumnRef;
use crate::report::Reporter;
use crate::runtime::{axis_data, extract_categorical_data};
use crate::selection::PLATFORMS;

/// A summary chart ready for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryChart {
    /// File-name friendly identifier
    pub name: &'static str,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub figure: Figure,
}

/// Rows whose App is one of the known platforms
pub fn summary_rows(table: &Table) -> Table {
    let Some(app_idx) = table.column_index(APP) else {
        return table.filter(|_| false);
    };
    let known: Vec<String> = PLATFORMS.iter().map(|p| normalize(p)).collect();
    table.filter(|row| known.contains(&normalize(&row[app_idx].as_label())))
}

/// Sum `value` per `key`, keys sorted.
///
/// A missing column gives an empty result.
pub fn group_sum(rows: &Table, key: &str, value: &str) -> Result<Vec<(String, f64)>> {
    let (Some(key_col), Some(value_col)) = (
        ColumnRef::lookup(&rows.headers, key),
        ColumnRef::lookup(&rows.headers, value),
    ) else {
        return Ok(Vec::new());
    };

    let (categories, values) = extract_categorical_data(rows, &key_col, &value_col)?;
    let sorted: BTreeMap<String, f64> = categories.into_iter().zip(values).collect();
    Ok(sorted.into_iter().collect())
}

/// Build the overview charts, warning about each one that has no data
pub fn build_summary(table: &Table, reporter: &dyn Reporter) -> Vec<SummaryChart> {
    let rows = summary_rows(table);
    log::debug!("Summary over {} rows", rows.len());
    let mut charts = Vec::new();

    match group_sum(&rows, APP, "Likes") {
        Ok(likes) if !likes.is_empty() => {
            let (labels, values) = likes.into_iter().unzip();
            charts.push(SummaryChart {
                name: "likes_by_app",
                title: "Proportion of Likes by Social Media App".into(),
                x_desc: String::new(),
                y_desc: String::new(),
                figure: Figure::Pie { labels, values },
            });
        }
        Ok(_) => reporter.warn("No data available for the social media apps."),
        Err(e) => reporter.error(&format!("Likes by App: {e}")),
    }

    match group_sum(&rows, APP, "time_spent") {
        Ok(time_spent) if !time_spent.is_empty() => {
            let (categories, values) = time_spent.into_iter().unzip();
            charts.push(SummaryChart {
                name: "time_spent_by_app",
                title: "Time Spent by Social Media App".into(),
                x_desc: "App".into(),
                y_desc: "Time Spent (minutes)".into(),
                figure: Figure::Bar {
                    categories,
                    values,
                    hue: true,
                },
            });
        }
        Ok(_) => reporter.warn("No data available for Time Spent by App."),
        Err(e) => reporter.error(&format!("Time Spent by App: {e}")),
    }

    match (rows.column_index(COUNTRY), rows.column_index(APP)) {
        (Some(country_idx), Some(app_idx)) if !rows.is_empty() => {
            let countries: Vec<Value> = rows.rows.iter().map(|r| r[country_idx].clone()).collect();
            let apps: Vec<Value> = rows.rows.iter().map(|r| r[app_idx].clone()).collect();
            charts.push(SummaryChart {
                name: "country_vs_app",
                title: "Country vs App Usage".into(),
                x_desc: "Country".into(),
                y_desc: "App".into(),
                figure: Figure::Scatter {
                    x: axis_data(&countries),
                    y: axis_data(&apps),
                },
            });
        }
        _ => reporter.warn("No data available for Country vs App."),
    }

    match group_sum(&rows, APP, "UsageDuration") {
        Ok(duration) if !duration.is_empty() => {
            let (categories, values) = duration.into_iter().unzip();
            charts.push(SummaryChart {
                name: "usage_duration_by_app",
                title: "Usage Duration by App".into(),
                x_desc: "App".into(),
                y_desc: "Usage Duration (minutes)".into(),
                figure: Figure::Line { categories, values },
            });
        }
        Ok(_) => reporter.warn("No data available for Usage Duration vs App."),
        Err(e) => reporter.error(&format!("Usage Duration by App: {e}")),
    }

    charts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;

    fn table() -> Table {
        Table::from_raw(
            vec!["Country".into(), "App".into(), "Likes".into(), "time_spent".into(), "UsageDuration".into()],
            vec![
                vec!["usa".into(), "youtube".into(), "5".into(), "30".into(), "2".into()],
                vec!["uk".into(), "instagram".into(), "10".into(), "15".into(), "1".into()],
                vec!["usa".into(), "instagram".into(), "20".into(), "5".into(), "3".into()],
                vec!["usa".into(), "myspace".into(), "99".into(), "99".into(), "9".into()],
            ],
        )
    }

    #[test]
    fn test_summary_rows_known_platforms_only() {
        assert_eq!(summary_rows(&table()).len(), 3);
    }

    #[test]
    fn test_group_sum_sorted_by_key() {
        let rows = summary_rows(&table());
        let likes = group_sum(&rows, "App", "Likes").unwrap();
        assert_eq!(likes, vec![("instagram".to_string(), 30.0), ("youtube".to_string(), 5.0)]);
    }

    #[test]
    fn test_group_sum_missing_column() {
        assert!(group_sum(&table(), "App", "Nope").unwrap().is_empty());
    }

    #[test]
    fn test_build_summary_all_charts() {
        let reporter = CollectingReporter::new();
        let charts = build_summary(&table(), &reporter);
        let names: Vec<_> = charts.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["likes_by_app", "time_spent_by_app", "country_vs_app", "usage_duration_by_app"]
        );
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_build_summary_empty_table_warns() {
        let reporter = CollectingReporter::new();
        let charts = build_summary(&Table::default(), &reporter);
        assert!(charts.is_empty());
        assert_eq!(reporter.messages().len(), 4);
        assert_eq!(reporter.messages()[0], "No data available for the social media apps.");
    }
}
