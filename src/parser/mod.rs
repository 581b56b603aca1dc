// Graph spec parser: presets ("User vs Likes") and custom charts ("bar(x: App, y: Likes)")

pub mod graph;
pub mod lexer;

// Public API re-exports
pub use graph::{parse_graph, parse_graph_config};
