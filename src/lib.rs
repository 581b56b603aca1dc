// Library exports for socialdash

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod graph;
pub mod loader;
pub mod parser;
pub mod query;
pub mod report;
pub mod runtime;
pub mod selection;
pub mod summary;

pub use config::{OutputFormat, RenderOptions};
pub use data::{normalize, Table, Value};
pub use error::{Axis, QueryError, ValidationFailure};
