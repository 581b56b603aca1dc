use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::parser::parse_graph;
use crate::selection::{PlatformSelection, SelectionState, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
        }
    }
}

/// Second-stage choices stored as JSON:
///
/// ```json
/// {
///   "apps": ["Instagram", "Twitter"],
///   "country": "usa",
///   "graphs": { "instagram": "Year vs Likes", "twitter": "pie(x: User)" },
///   "render": { "width": 1200, "type": "svg" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SessionFile {
    pub apps: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub graphs: BTreeMap<String, String>,
    #[serde(default)]
    pub render: RenderOptions,
}

impl SessionFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse session file")
    }

    /// Run the session flow: select the apps, advance, then apply country and graphs
    pub fn into_state(self) -> Result<(SelectionState, RenderOptions)> {
        let platforms = PlatformSelection::from_names(&self.apps);
        let mut state = match Session::new().advance(platforms)? {
            Session::Configuring(state) => state,
            Session::ChoosingPlatforms => anyhow::bail!("Session did not leave platform selection"),
        };

        if let Some(country) = self.country {
            state = state.with_country(country);
        }
        for (app, spec) in &self.graphs {
            let config = parse_graph(spec).with_context(|| format!("Graph for '{}'", app))?;
            state = state.with_graph(app, config)?;
        }

        Ok((state, self.render))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{ChartKind, GraphConfig, PresetGraph};

    #[test]
    fn test_render_options_defaults() {
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.width, 800);
        assert_eq!(options.height, 600);
        assert_eq!(options.format, OutputFormat::Png);
    }

    #[test]
    fn test_render_options_svg() {
        let options: RenderOptions = serde_json::from_str(r#"{"width": 400, "type": "svg"}"#).unwrap();
        assert_eq!(options.width, 400);
        assert_eq!(options.format, OutputFormat::Svg);
        assert_eq!(options.format.extension(), "svg");
    }

    #[test]
    fn test_session_file_into_state() {
        let file = SessionFile::from_json(
            r#"{
                "apps": ["Instagram", " Twitter "],
                "country": "USA",
                "graphs": {"instagram": "Year vs Likes", "Twitter": "pie(x: User)"}
            }"#,
        )
        .unwrap();
        let (state, render) = file.into_state().unwrap();
        assert_eq!(state.platforms().len(), 2);
        assert_eq!(state.country(), Some("USA"));
        assert_eq!(state.graph_for("instagram"), GraphConfig::Preset(PresetGraph::YearVsLikes));
        assert_eq!(state.graph_for("twitter"), GraphConfig::custom(ChartKind::Pie, "User", None));
        assert_eq!(render.width, 800);
    }

    #[test]
    fn test_session_file_without_apps() {
        let file = SessionFile::from_json(r#"{"apps": []}"#).unwrap();
        let err = file.into_state().unwrap_err();
        assert!(err.to_string().contains("at least one platform"));
    }

    #[test]
    fn test_session_file_unknown_app() {
        let file = SessionFile::from_json(r#"{"apps": ["Instagram", "TikTok"]}"#).unwrap();
        let err = file.into_state().unwrap_err();
        assert!(err.to_string().contains("'tiktok' is not a supported platform"));
    }

    #[test]
    fn test_session_file_graph_for_unselected_app() {
        let file = SessionFile::from_json(r#"{"apps": ["instagram"], "graphs": {"snapchat": "User vs Likes"}}"#).unwrap();
        assert!(file.into_state().is_err());
    }

    #[test]
    fn test_session_file_bad_graph_spec() {
        let file = SessionFile::from_json(r#"{"apps": ["instagram"], "graphs": {"instagram": "donut(x: App)"}}"#).unwrap();
        let err = file.into_state().unwrap_err();
        assert!(err.to_string().contains("instagram"));
    }
}
