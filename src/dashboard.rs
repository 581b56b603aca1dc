//! One evaluation pass per stage.
//!
//! Every failure is reported and the pass continues with whatever is left.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::RenderOptions;
use crate::data::Table;
use crate::error::QueryError;
use crate::graph::Canvas;
use crate::query::build_query;
use crate::report::Reporter;
use crate::runtime::render_chart;
use crate::selection::SelectionState;
use crate::summary::build_summary;

/// An encoded chart image
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub name: String,
    pub title: String,
    pub bytes: Vec<u8>,
}

pub struct Dashboard<'a> {
    table: &'a Table,
    options: RenderOptions,
    reporter: &'a dyn Reporter,
}

impl<'a> Dashboard<'a> {
    pub fn new(table: &'a Table, options: RenderOptions, reporter: &'a dyn Reporter) -> Self {
        Self {
            table,
            options,
            reporter,
        }
    }

    /// First stage: overview charts across all known platforms
    pub fn summary(&self) -> Vec<RenderedChart> {
        build_summary(self.table, self.reporter)
            .into_iter()
            .filter_map(|chart| {
                let canvas = Canvas::new(&self.options, Some(chart.title.clone()))
                    .with_axis_labels(Some(chart.x_desc.clone()), Some(chart.y_desc.clone()));
                match canvas.render(&chart.figure) {
                    Ok(bytes) => Some(RenderedChart {
                        name: chart.name.to_string(),
                        title: chart.title,
                        bytes,
                    }),
                    Err(e) => {
                        self.reporter
                            .error(&format!("Failed to render '{}': {e:#}", chart.title));
                        None
                    }
                }
            })
            .collect()
    }

    /// Second stage: one chart per selected platform that resolves and renders
    pub fn show(&self, state: &SelectionState) -> Vec<RenderedChart> {
        let result = match build_query(self.table, state) {
            Ok(result) => result,
            Err(QueryError::EmptyResult { country }) => {
                log::info!("No rows for '{}'", country);
                self.reporter
                    .warn("No matching data found! Try adjusting filters.");
                return Vec::new();
            }
        };

        let mut rendered = Vec::new();
        for chart in &result.charts {
            let resolved = match &chart.outcome {
                Ok(resolved) => resolved,
                Err(failure) => {
                    self.reporter.error(&format!(
                        "{}. Please select a valid column.",
                        failure
                    ));
                    continue;
                }
            };

            match render_chart(&resolved.spec, &resolved.rows, &self.options) {
                Ok(bytes) => rendered.push(RenderedChart {
                    name: file_stem(&chart.platform, &result.country),
                    title: format!("{} in {}", chart.platform, result.country),
                    bytes,
                }),
                Err(e) => self.reporter.error(&format!(
                    "Failed to render chart for {}: {e:#}",
                    chart.platform
                )),
            }
        }

        log::info!(
            "Rendered {} of {} chart(s) for '{}'",
            rendered.len(),
            result.charts.len(),
            result.country
        );
        rendered
    }
}

fn file_stem(platform: &str, country: &str) -> String {
    format!("{}_{}", platform, country)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Write each chart to `<dir>/<name>.<ext>`
pub fn write_charts(dir: &Path, charts: &[RenderedChart], options: &RenderOptions) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut paths = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = dir.join(format!("{}.{}", chart.name, options.format.extension()));
        std::fs::write(&path, &chart.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}
