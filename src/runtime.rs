// Chart renderer: turns a resolved chart spec and its rows into an image

use crate::config::RenderOptions;
use crate::data::{Table, Value};
use crate::graph::{AxisData, Canvas, Figure};
use crate::query::{ChartSpec, ColumnRef};
use crate::selection::ChartKind;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

/// Equal-width bins used for numeric histograms
pub const HISTOGRAM_BINS: usize = 10;

/// Render a resolved chart to image bytes
///
/// A platform with no rows still gets its titled, labelled axes.
pub fn render_chart(spec: &ChartSpec, rows: &Table, options: &RenderOptions) -> Result<Vec<u8>> {
    let y_desc = match spec.kind {
        ChartKind::Histogram => Some("Frequency".to_string()),
        _ => spec.y.as_ref().map(|y| y.name().to_string()),
    };
    let canvas = Canvas::new(options, Some(spec.title()))
        .with_axis_labels(Some(spec.x.name().to_string()), y_desc);

    if rows.is_empty() {
        log::info!("No rows for {}, drawing empty axes", spec.platform);
        return canvas.render_empty();
    }

    let figure = build_figure(spec, rows)
        .with_context(|| format!("Failed to prepare chart for {}", spec.platform))?;
    canvas.render(&figure)
}

/// Aggregate rows into the figure for this chart kind
pub fn build_figure(spec: &ChartSpec, rows: &Table) -> Result<Figure> {
    match spec.kind {
        ChartKind::Bar => {
            let y = required_y(spec)?;
            let (categories, values) = extract_categorical_data(rows, &spec.x, y)?;
            Ok(Figure::Bar {
                categories,
                values,
                hue: spec.hue().is_some(),
            })
        }
        ChartKind::Pie => {
            let (labels, values) = value_counts(rows, &spec.x);
            Ok(Figure::Pie { labels, values })
        }
        ChartKind::Scatter => {
            let y = required_y(spec)?;
            let (x_values, y_values): (Vec<Value>, Vec<Value>) = rows
                .rows
                .iter()
                .map(|row| (spec.x.get(row).clone(), y.get(row).clone()))
                .filter(|(x, y)| *x != Value::Null && *y != Value::Null)
                .unzip();
            Ok(Figure::Scatter {
                x: axis_data(&x_values),
                y: axis_data(&y_values),
            })
        }
        ChartKind::Histogram => {
            let (categories, values) = histogram(rows, &spec.x, HISTOGRAM_BINS);
            Ok(Figure::Bar {
                categories,
                values,
                hue: false,
            })
        }
    }
}

fn required_y(spec: &ChartSpec) -> Result<&ColumnRef> {
    spec.y
        .as_ref()
        .ok_or_else(|| anyhow!("{} needs a y-axis", spec.kind))
}

/// Sum y per x category, categories in first-appearance order.
///
/// Rows with an empty y are skipped; any other non-numeric y is an error.
pub fn extract_categorical_data(
    rows: &Table,
    x: &ColumnRef,
    y: &ColumnRef,
) -> Result<(Vec<String>, Vec<f64>)> {
    let mut category_values: HashMap<String, f64> = HashMap::new();
    let mut categories_order: Vec<String> = Vec::new();

    for (row_idx, row) in rows.rows.iter().enumerate() {
        let y_val = match y.get(row) {
            Value::Null => continue,
            cell => cell.as_f64().ok_or_else(|| {
                anyhow!(
                    "Failed to parse '{}' as number in column '{}' at row {}",
                    cell,
                    y.name(),
                    row_idx + 1
                )
            })?,
        };
        let category = x.get(row).as_label();

        if !category_values.contains_key(&category) {
            categories_order.push(category.clone());
        }

        *category_values.entry(category).or_insert(0.0) += y_val;
    }

    let values = categories_order
        .iter()
        .map(|cat| category_values.get(cat).copied().unwrap_or(0.0))
        .collect();

    Ok((categories_order, values))
}

/// Count rows per label, most frequent first (ties keep first appearance)
pub fn value_counts(rows: &Table, column: &ColumnRef) -> (Vec<String>, Vec<f64>) {
    let (labels, counts) = count_in_order(rows, column);
    let mut pairs: Vec<(String, f64)> = labels.into_iter().zip(counts).collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.into_iter().unzip()
}

fn count_in_order(rows: &Table, column: &ColumnRef) -> (Vec<String>, Vec<f64>) {
    let mut counts: HashMap<String, f64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in &rows.rows {
        let cell = column.get(row);
        if *cell == Value::Null {
            continue;
        }
        let label = cell.as_label();
        if !counts.contains_key(&label) {
            order.push(label.clone());
        }
        *counts.entry(label).or_insert(0.0) += 1.0;
    }
    let values = order.iter().map(|l| counts[l]).collect();
    (order, values)
}

/// Frequency table of a column.
///
/// Numeric columns are cut into `bins` equal-width bins over their range;
/// other columns are counted per category.
pub fn histogram(rows: &Table, column: &ColumnRef, bins: usize) -> (Vec<String>, Vec<f64>) {
    let cells: Vec<&Value> = rows
        .rows
        .iter()
        .map(|row| column.get(row))
        .filter(|v| **v != Value::Null)
        .collect();

    if cells.is_empty() || !cells.iter().all(|v| v.is_numeric()) || bins == 0 {
        return count_in_order(rows, column);
    }

    let numbers: Vec<f64> = cells.iter().filter_map(|v| v.as_f64()).collect();
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return (vec![format_edge(min)], vec![numbers.len() as f64]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0.0; bins];
    for n in &numbers {
        // The maximum lands in the last bin
        let idx = (((n - min) / width) as usize).min(bins - 1);
        counts[idx] += 1.0;
    }

    let labels = (0..bins)
        .map(|i| {
            let lo = min + width * i as f64;
            format!("{}-{}", format_edge(lo), format_edge(lo + width))
        })
        .collect();

    (labels, counts)
}

fn format_edge(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Numbers stay numbers; anything else maps to category indices
pub fn axis_data(cells: &[Value]) -> AxisData {
    if cells.iter().all(Value::is_numeric) {
        return AxisData {
            values: cells.iter().filter_map(Value::as_f64).collect(),
            categories: None,
        };
    }

    let mut categories: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let values = cells
        .iter()
        .map(|cell| {
            let label = cell.as_label();
            let idx = *index.entry(label.clone()).or_insert_with(|| {
                categories.push(label);
                categories.len() - 1
            });
            idx as f64
        })
        .collect();

    AxisData {
        values,
        categories: Some(categories),
    }
}
