//! Ontology Server - subgraph explorer over HTTP.
//!
//! This crate provides:
//! - Background loading of an OBO Graph JSON document
//! - Loading/loaded/failed status reporting
//! - Ancestor/descendant subgraphs for a focus term, plain or as Cytoscape elements
//! - Parallel batch extraction and a per-term subgraph memo

pub mod config;
pub mod routes;
pub mod handlers;

pub use config::ServerConfig;
pub use handlers::{load_ontology, AppState, SharedState};
pub use routes::{create_router, create_router_with_middleware};
