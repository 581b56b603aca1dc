//! Selection-to-query mapping.
//!
//! Turns a [`SelectionState`] into the rows to chart and, per platform, a
//! chart spec whose columns have been checked against the table once. Nothing
//! here panics on bad input: a bad column becomes a [`ValidationFailure`] for
//! that platform only, and a filter that matches nothing becomes
//! [`QueryError::EmptyResult`].

use crate::data::{normalize, Table, Value, APP, COUNTRY};
use crate::error::{Axis, QueryError, ValidationFailure};
use crate::selection::{country_options, ChartKind, GraphConfig, PlatformSelection, PresetGraph, SelectionState};

const PRESET_SEPARATOR: &str = " vs ";

/// A column name that was found in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    index: usize,
    name: String,
}

impl ColumnRef {
    pub fn lookup(headers: &[String], name: &str) -> Option<Self> {
        headers.iter().position(|h| h == name).map(|index| Self {
            index,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cell of this column in `row`
    pub fn get<'a>(&self, row: &'a [Value]) -> &'a Value {
        &row[self.index]
    }
}

/// Chart kind plus validated axes for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub platform: String,
    pub kind: ChartKind,
    pub x: ColumnRef,
    pub y: Option<ColumnRef>,
    /// Set for preset graphs; their bars are colored per x category
    pub preset: Option<PresetGraph>,
}

impl ChartSpec {
    pub fn title(&self) -> String {
        if let Some(preset) = self.preset {
            return preset.label().to_string();
        }
        match (&self.kind, &self.y) {
            (ChartKind::Bar | ChartKind::Scatter, Some(y)) => {
                format!("{} vs {} for {}", self.x.name(), y.name(), self.platform)
            }
            _ => format!("Distribution of {} for {}", self.x.name(), self.platform),
        }
    }

    /// Column used to color marks, if any
    pub fn hue(&self) -> Option<&ColumnRef> {
        self.preset.map(|_| &self.x)
    }
}

/// Rows whose country matches `country` and whose app is in `selection`.
///
/// Both sides of each comparison are normalized. A table without the key
/// columns yields no rows.
pub fn filter_rows(table: &Table, country: &str, selection: &PlatformSelection) -> Table {
    let (Some(country_idx), Some(app_idx)) = (table.column_index(COUNTRY), table.column_index(APP))
    else {
        return table.filter(|_| false);
    };
    let wanted = normalize(country);

    table.filter(|row| {
        normalize(&row[country_idx].as_label()) == wanted
            && selection.contains(&row[app_idx].as_label())
    })
}

/// Narrow already filtered rows down to a single platform
pub fn platform_rows(filtered: &Table, platform: &str) -> Table {
    let Some(app_idx) = filtered.column_index(APP) else {
        return filtered.filter(|_| false);
    };
    let wanted = normalize(platform);
    filtered.filter(|row| normalize(&row[app_idx].as_label()) == wanted)
}

/// Resolve one platform's graph config against the table's columns.
///
/// Presets split their label on " vs " and always chart as bars. The x-axis is
/// checked first; the y-axis only when the kind needs one.
pub fn resolve_chart(
    platform: &str,
    config: &GraphConfig,
    headers: &[String],
) -> Result<ChartSpec, ValidationFailure> {
    let (kind, x_name, y_name, preset) = match config {
        GraphConfig::Preset(preset) => {
            let label = preset.label();
            let (x, y) = label
                .split_once(PRESET_SEPARATOR)
                .unwrap_or((label, ""));
            (ChartKind::Bar, x.to_string(), Some(y.to_string()), Some(*preset))
        }
        GraphConfig::Custom { kind, x, y } => (*kind, x.clone(), y.clone(), None),
    };

    let fail = |axis: Axis, column: &str| ValidationFailure {
        platform: platform.to_string(),
        axis,
        column: column.to_string(),
    };

    let x = ColumnRef::lookup(headers, &x_name).ok_or_else(|| fail(Axis::X, &x_name))?;

    let y = if kind.requires_y() {
        let name = y_name.unwrap_or_default();
        Some(ColumnRef::lookup(headers, &name).ok_or_else(|| fail(Axis::Y, &name))?)
    } else {
        None
    };

    Ok(ChartSpec {
        platform: platform.to_string(),
        kind,
        x,
        y,
        preset,
    })
}

/// A resolved chart and the rows it should draw
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChart {
    pub spec: ChartSpec,
    pub rows: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformChart {
    pub platform: String,
    pub outcome: Result<ResolvedChart, ValidationFailure>,
}

/// Output of one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub country: String,
    /// Rows matching the country and any selected platform
    pub rows: Table,
    /// One entry per selected platform, in selection order
    pub charts: Vec<PlatformChart>,
}

impl QueryResult {
    pub fn resolved(&self) -> impl Iterator<Item = &ResolvedChart> {
        self.charts.iter().filter_map(|c| c.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.charts.iter().filter_map(|c| c.outcome.as_ref().err())
    }
}

/// Run the filter and resolve every selected platform's chart.
///
/// With no country chosen the first country option is used, as a select box
/// would preselect it.
pub fn build_query(table: &Table, state: &SelectionState) -> Result<QueryResult, QueryError> {
    let country = match state.country() {
        Some(c) => c.to_string(),
        None => country_options(table).into_iter().next().unwrap_or_default(),
    };

    let rows = filter_rows(table, &country, state.platforms());
    if rows.is_empty() {
        log::debug!("No rows for country '{}'", country);
        return Err(QueryError::EmptyResult { country });
    }
    log::debug!("{} rows match country '{}'", rows.len(), country);

    let charts = state
        .platforms()
        .iter()
        .map(|platform| {
            let outcome = resolve_chart(platform, &state.graph_for(platform), &table.headers)
                .map(|spec| ResolvedChart {
                    rows: platform_rows(&rows, platform),
                    spec,
                });
            PlatformChart {
                platform: platform.to_string(),
                outcome,
            }
        })
        .collect();

    Ok(QueryResult {
        country,
        rows,
        charts,
    })
}
