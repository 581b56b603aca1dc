use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use crate::data::{normalize, Table, COUNTRY};
use crate::error::SessionError;

/// Platform display names offered in the first stage
pub const PLATFORMS: [&str; 5] = ["Instagram", "Twitter", "Facebook", "Snapchat", "YouTube"];

/// Label of the graph-type choice that opens the custom pickers
pub const CUSTOM_GRAPH_LABEL: &str = "Search for You";

/// Every graph-type choice, in display order
pub const GRAPH_TYPE_OPTIONS: [&str; 3] = ["User vs Likes", "Year vs Likes", CUSTOM_GRAPH_LABEL];

/// Normalized platform names chosen in the first stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSelection(BTreeSet<String>);

impl PlatformSelection {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| normalize(n.as_ref())).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&normalize(name))
    }

    /// Sorted iteration, so renders come out in a stable order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Whether `name` is one of [`PLATFORMS`], compared after normalization
pub fn is_known_platform(name: &str) -> bool {
    let name = normalize(name);
    PLATFORMS.iter().any(|p| normalize(p) == name)
}

/// Collect the normalized names of every active toggle.
///
/// Toggles outside [`PLATFORMS`] are dropped. An empty result is legal here;
/// gating on it is the session's job.
pub fn select_platforms<'a, I>(toggles: I) -> PlatformSelection
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    PlatformSelection::from_names(
        toggles
            .into_iter()
            .filter(|(name, active)| {
                if *active && !is_known_platform(name) {
                    log::warn!("Ignoring unknown platform '{}'", name);
                }
                *active && is_known_platform(name)
            })
            .map(|(name, _)| name),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
    Scatter,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Histogram,
    ];

    /// Bar and Scatter plot one column against another
    pub fn requires_y(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Scatter)
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Plot",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ChartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match normalize(s).as_str() {
            "bar" | "bar plot" => Ok(ChartKind::Bar),
            "pie" | "pie chart" => Ok(ChartKind::Pie),
            "scatter" | "scatter plot" => Ok(ChartKind::Scatter),
            "histogram" => Ok(ChartKind::Histogram),
            _ => Err(anyhow!("Unknown chart kind '{}'", s)),
        }
    }
}

/// Graph types with a fixed axis pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetGraph {
    UserVsLikes,
    YearVsLikes,
}

impl PresetGraph {
    pub const ALL: [PresetGraph; 2] = [PresetGraph::UserVsLikes, PresetGraph::YearVsLikes];

    pub fn label(self) -> &'static str {
        match self {
            PresetGraph::UserVsLikes => "User vs Likes",
            PresetGraph::YearVsLikes => "Year vs Likes",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label.trim())
    }
}

/// How one platform should be charted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphConfig {
    Preset(PresetGraph),
    Custom {
        kind: ChartKind,
        x: String,
        y: Option<String>,
    },
}

impl GraphConfig {
    /// Custom config; the y-axis is dropped for kinds that take none
    pub fn custom(kind: ChartKind, x: impl Into<String>, y: Option<String>) -> Self {
        GraphConfig::Custom {
            kind,
            x: x.into(),
            y: if kind.requires_y() { y } else { None },
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig::Preset(PresetGraph::UserVsLikes)
    }
}

/// Every column can go on the x-axis
pub fn x_axis_candidates(table: &Table) -> Vec<String> {
    table.headers.clone()
}

/// Columns offered for the y-axis, or `None` when the kind takes no y
pub fn y_axis_candidates(kind: ChartKind, table: &Table) -> Option<Vec<String>> {
    match kind {
        ChartKind::Bar => Some(table.numeric_columns()),
        ChartKind::Scatter => Some(table.headers.clone()),
        ChartKind::Pie | ChartKind::Histogram => None,
    }
}

/// Sorted distinct countries for the country picker
pub fn country_options(table: &Table) -> Vec<String> {
    table.unique_labels(COUNTRY)
}

/// Everything chosen by the time the second stage is shown
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    platforms: PlatformSelection,
    country: Option<String>,
    graphs: BTreeMap<String, GraphConfig>,
}

impl SelectionState {
    pub fn platforms(&self) -> &PlatformSelection {
        &self.platforms
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn with_country(self, country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..self
        }
    }

    /// Set one platform's graph; the platform must be part of the selection
    pub fn with_graph(mut self, platform: &str, config: GraphConfig) -> Result<Self, SessionError> {
        if !self.platforms.contains(platform) {
            return Err(SessionError::UnknownPlatform(platform.to_string()));
        }
        self.graphs.insert(normalize(platform), config);
        Ok(self)
    }

    /// Platforms without an explicit choice show the first preset
    pub fn graph_for(&self, platform: &str) -> GraphConfig {
        self.graphs
            .get(&normalize(platform))
            .cloned()
            .unwrap_or_default()
    }
}

/// Two-stage session flow. There is no way back to the first stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    ChoosingPlatforms,
    Configuring(SelectionState),
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the second stage; refused while nothing is selected
    pub fn advance(self, platforms: PlatformSelection) -> Result<Session, SessionError> {
        match self {
            Session::ChoosingPlatforms => {
                if platforms.is_empty() {
                    return Err(SessionError::NoPlatformsSelected);
                }
                if let Some(unknown) = platforms.iter().find(|p| !is_known_platform(p)) {
                    return Err(SessionError::UnsupportedPlatform(unknown.to_string()));
                }
                log::debug!("Advancing with {} platform(s)", platforms.len());
                Ok(Session::Configuring(SelectionState {
                    platforms,
                    country: None,
                    graphs: BTreeMap::new(),
                }))
            }
            // Platform selection is fixed once made
            configuring @ Session::Configuring(_) => Ok(configuring),
        }
    }

    pub fn selection(&self) -> Option<&SelectionState> {
        match self {
            Session::ChoosingPlatforms => None,
            Session::Configuring(state) => Some(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_raw(
            vec!["Country".into(), "App".into(), "Likes".into(), "User".into()],
            vec![
                vec!["usa".into(), "instagram".into(), "10".into(), "amy".into()],
                vec!["india".into(), "twitter".into(), "3".into(), "raj".into()],
                vec!["usa".into(), "twitter".into(), "4".into(), "amy".into()],
            ],
        )
    }

    #[test]
    fn test_select_platforms_normalizes() {
        let selection = select_platforms([("Instagram", true), ("Twitter", false), ("YouTube", true)]);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["instagram", "youtube"]);
    }

    #[test]
    fn test_select_platforms_drops_unknown_toggles() {
        let selection = select_platforms([("TikTok", true), ("Instagram", true), ("MySpace", false)]);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["instagram"]);
        assert!(select_platforms([("tiktok", true)]).is_empty());
    }

    #[test]
    fn test_session_rejects_unknown_platform() {
        let result = Session::new().advance(PlatformSelection::from_names(["Instagram", "myspace"]));
        assert_eq!(result, Err(SessionError::UnsupportedPlatform("myspace".into())));
        assert!(is_known_platform(" YouTube "));
    }

    #[test]
    fn test_select_platforms_none_active() {
        let selection = select_platforms(PLATFORMS.iter().map(|p| (*p, false)));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_session_refuses_empty_selection() {
        let result = Session::new().advance(PlatformSelection::default());
        assert_eq!(result, Err(SessionError::NoPlatformsSelected));
    }

    #[test]
    fn test_session_advance_is_one_way() {
        let first = PlatformSelection::from_names(["Instagram"]);
        let second = PlatformSelection::from_names(["Twitter"]);
        let session = Session::new().advance(first.clone()).unwrap();
        let session = session.advance(second).unwrap();
        assert_eq!(session.selection().unwrap().platforms(), &first);
    }

    #[test]
    fn test_with_graph_rejects_unselected_platform() {
        let state = match Session::new().advance(PlatformSelection::from_names(["instagram"])) {
            Ok(Session::Configuring(state)) => state,
            other => panic!("unexpected {:?}", other),
        };
        let err = state
            .with_graph("snapchat", GraphConfig::default())
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownPlatform("snapchat".into()));
    }

    #[test]
    fn test_graph_for_defaults_to_first_preset() {
        let state = match Session::new().advance(PlatformSelection::from_names(["Instagram"])) {
            Ok(Session::Configuring(state)) => state,
            other => panic!("unexpected {:?}", other),
        };
        let state = state
            .with_graph(" INSTAGRAM", GraphConfig::Preset(PresetGraph::YearVsLikes))
            .unwrap();
        assert_eq!(state.graph_for("instagram"), GraphConfig::Preset(PresetGraph::YearVsLikes));
        assert_eq!(state.graph_for("twitter"), GraphConfig::default());
    }

    #[test]
    fn test_custom_drops_y_for_pie() {
        let config = GraphConfig::custom(ChartKind::Pie, "Country", Some("Likes".into()));
        assert_eq!(
            config,
            GraphConfig::Custom {
                kind: ChartKind::Pie,
                x: "Country".into(),
                y: None
            }
        );
    }

    #[test]
    fn test_y_axis_candidates() {
        let t = table();
        assert_eq!(y_axis_candidates(ChartKind::Bar, &t), Some(vec!["Likes".to_string()]));
        assert_eq!(y_axis_candidates(ChartKind::Scatter, &t).unwrap().len(), 4);
        assert_eq!(y_axis_candidates(ChartKind::Histogram, &t), None);
    }

    #[test]
    fn test_country_options_sorted_unique() {
        assert_eq!(country_options(&table()), vec!["india", "usa"]);
    }

    #[test]
    fn test_chart_kind_from_str() {
        assert_eq!("Bar Plot".parse::<ChartKind>().unwrap(), ChartKind::Bar);
        assert_eq!("histogram".parse::<ChartKind>().unwrap(), ChartKind::Histogram);
        assert!("donut".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_preset_from_label() {
        assert_eq!(PresetGraph::from_label("Year vs Likes"), Some(PresetGraph::YearVsLikes));
        assert_eq!(PresetGraph::from_label(CUSTOM_GRAPH_LABEL), None);
    }
}
