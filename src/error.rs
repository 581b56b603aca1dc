use std::fmt;
use thiserror::Error;

/// Which chart axis a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X-axis"),
            Axis::Y => write!(f, "Y-axis"),
        }
    }
}

/// A chart configuration that names a column the table does not have.
///
/// Scoped to one platform; the other platforms keep rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {axis} selection for {platform}: '{column}' is not a column")]
pub struct ValidationFailure {
    pub platform: String,
    pub axis: Axis,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("No matching data found for country '{country}'")]
    EmptyResult { country: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Select at least one platform before continuing")]
    NoPlatformsSelected,
    #[error("'{0}' is not a supported platform (choose from Instagram, Twitter, Facebook, Snapchat, YouTube)")]
    UnsupportedPlatform(String),
    #[error("'{0}' is not one of the selected platforms")]
    UnknownPlatform(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(String),
    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
}
