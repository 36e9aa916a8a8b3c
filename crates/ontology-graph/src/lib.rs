//! Ontology Graph - is-a hierarchy indexing and subgraph extraction.
//!
//! This crate provides:
//! - OBO Graph JSON document types and identifier canonicalization
//! - A read-only parent/child index over one ontology graph
//! - Ancestor/descendant subgraph extraction for a focus term
//! - Cytoscape element output for rendering
//!
//! ```rust,ignore
//! use ontology_graph::{GraphSelector, OntologyIndex};
//!
//! let index = OntologyIndex::load("go-basic.json", &GraphSelector::First)?;
//! if let Some(subgraph) = index.subgraph("GO:0045010") {
//!     println!("{} terms, {} edges", subgraph.nodes.len(), subgraph.edges.len());
//! }
//! ```

pub mod ontology;
pub mod graph;
pub mod traversal;

pub use ontology::{obo_id, GraphSelector, OboGraphDocument, RawEdge, RawGraph, RawNode, OBO_PREFIX};
pub use graph::{build_index, GraphError, IndexedNode, OntologyIndex, Result};
pub use traversal::{
    extract_subgraph, subgraph_of, CytoscapeElement, Direction, Hierarchy, SubgraphEdge,
    SubgraphNode, SubgraphResult, Traversal,
};
