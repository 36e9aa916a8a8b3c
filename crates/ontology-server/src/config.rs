//! Server configuration.

use std::path::PathBuf;

use ontology_graph::GraphSelector;

/// Focus term shown when a client asks for the default subgraph.
pub const DEFAULT_TERM: &str = "GO:0045010";

/// Configuration for the ontology server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Path to the OBO Graph JSON document.
    pub ontology_path: PathBuf,
    /// Which graph of the document to index.
    pub graph: GraphSelector,
    /// Focus term for `GET /subgraph`.
    pub default_term: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            ontology_path: PathBuf::from("go-basic.json"),
            graph: GraphSelector::First,
            default_term: DEFAULT_TERM.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            ontology_path: lookup("ONTOLOGY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ontology_path),
            graph: lookup("ONTOLOGY_GRAPH")
                .map(|g| GraphSelector::parse(&g))
                .unwrap_or(defaults.graph),
            default_term: lookup("DEFAULT_TERM")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.default_term),
        }
    }
}
