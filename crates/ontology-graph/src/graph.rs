//! Ontology index: canonical term id -> parents/children.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ontology::{obo_id, GraphSelector, OboGraphDocument, RawGraph};
use crate::traversal::{subgraph_of, Hierarchy, SubgraphResult};

/// Error types for ontology loading.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid ontology document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph not found in document: {0}")]
    GraphNotFound(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// A term in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedNode {
    /// Canonical identifier.
    pub id: String,
    /// Human-readable label.
    pub lbl: String,
    /// Canonical ids of direct parents, in edge-list order.
    pub parents: Vec<String>,
    /// Canonical ids of direct children, in edge-list order.
    pub children: Vec<String>,
}

impl IndexedNode {
    fn new(id: String, lbl: String) -> Self {
        Self {
            id,
            lbl,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Read-only parent/child index over one ontology graph.
///
/// Built once per loaded document. Extraction never mutates it, so a single
/// index can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyIndex {
    nodes: HashMap<String, IndexedNode>,
}

impl OntologyIndex {
    /// Build an index from a raw graph.
    ///
    /// Every node id and both ends of every edge go through `canonicalize`.
    /// Two nodes that canonicalize to the same id collapse into one entry and
    /// the later node wins. Edges are appended with their multiplicity kept;
    /// an edge whose `sub` or `obj` does not resolve to a node is skipped.
    pub fn build<F>(graph: &RawGraph, canonicalize: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let mut nodes: HashMap<String, IndexedNode> = HashMap::with_capacity(graph.nodes.len());

        for raw in &graph.nodes {
            let id = canonicalize(&raw.id);
            nodes.insert(id.clone(), IndexedNode::new(id, raw.lbl.clone()));
        }

        for edge in &graph.edges {
            let sub = canonicalize(&edge.sub);
            let obj = canonicalize(&edge.obj);

            if !nodes.contains_key(&sub) || !nodes.contains_key(&obj) {
                trace!(sub = %edge.sub, obj = %edge.obj, "skipping edge with unknown term");
                continue;
            }

            if let Some(child) = nodes.get_mut(&sub) {
                child.parents.push(obj.clone());
            }
            if let Some(parent) = nodes.get_mut(&obj) {
                parent.children.push(sub);
            }
        }

        debug!(terms = nodes.len(), "built ontology index");
        Self { nodes }
    }

    /// Build an index using OBO identifier canonicalization.
    pub fn from_obo(graph: &RawGraph) -> Self {
        Self::build(graph, obo_id)
    }

    /// Build an index from the selected graph of a document.
    pub fn from_document(doc: &OboGraphDocument, selector: &GraphSelector) -> Result<Self> {
        Ok(Self::from_obo(doc.select(selector)?))
    }

    /// Read a document from disk and index the selected graph.
    pub fn load(path: impl AsRef<Path>, selector: &GraphSelector) -> Result<Self> {
        let doc = OboGraphDocument::from_path(path)?;
        Self::from_document(&doc, selector)
    }

    /// Get a term by canonical id.
    pub fn get(&self, id: &str) -> Option<&IndexedNode> {
        self.nodes.get(id)
    }

    /// Whether a canonical id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all terms in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedNode> {
        self.nodes.values()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of accepted parent links, counted with multiplicity.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.parents.len()).sum()
    }

    /// Ancestors and descendants of `focus`, or `None` if it is not indexed.
    pub fn subgraph(&self, focus: &str) -> Option<SubgraphResult> {
        subgraph_of(self, focus)
    }

    /// Extract subgraphs for many focus terms in parallel.
    ///
    /// Results are in the same order as `focus_ids`.
    pub fn subgraphs<S>(&self, focus_ids: &[S]) -> Vec<Option<SubgraphResult>>
    where
        S: AsRef<str> + Sync,
    {
        focus_ids
            .par_iter()
            .map(|id| self.subgraph(id.as_ref()))
            .collect()
    }
}

impl Hierarchy for OntologyIndex {
    fn label(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|n| n.lbl.as_str())
    }

    fn parents(&self, id: &str) -> &[String] {
        self.nodes.get(id).map(|n| n.parents.as_slice()).unwrap_or_default()
    }

    fn children(&self, id: &str) -> &[String] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }
}

/// Build an index, passing through an absent graph.
///
/// `None` means "not loaded yet" and stays distinct from a loaded graph
/// with no terms.
pub fn build_index<F>(graph: Option<&RawGraph>, canonicalize: F) -> Option<OntologyIndex>
where
    F: Fn(&str) -> String,
{
    graph.map(|g| OntologyIndex::build(g, canonicalize))
}
