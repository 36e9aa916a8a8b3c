//! OBO Graph JSON document types and identifier canonicalization.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, Result};

/// IRI prefix stripped from OBO term identifiers.
pub const OBO_PREFIX: &str = "http://purl.obolibrary.org/obo/";

/// Canonicalize an OBO identifier.
///
/// Removes the first occurrence of [`OBO_PREFIX`] and replaces the first
/// underscore with a colon, so `http://purl.obolibrary.org/obo/GO_0008150`
/// becomes `GO:0008150`. Only the first match of each is replaced; the
/// renderer expects exactly this form.
pub fn obo_id(raw: &str) -> String {
    raw.replacen(OBO_PREFIX, "", 1).replacen('_', ":", 1)
}

/// A term as it appears in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    /// Non-canonical identifier, usually an IRI.
    pub id: String,
    /// Human-readable label. Missing labels read as empty.
    #[serde(default)]
    pub lbl: String,
}

impl RawNode {
    pub fn new(id: impl Into<String>, lbl: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lbl: lbl.into(),
        }
    }
}

/// A directed "sub is-a obj" relation. `sub` is the child, `obj` the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub sub: String,
    pub obj: String,
}

impl RawEdge {
    pub fn new(sub: impl Into<String>, obj: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            obj: obj.into(),
        }
    }
}

/// One graph of an OBO Graph JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGraph {
    /// Graph IRI, when the document provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    pub fn new(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Self {
        Self {
            id: None,
            nodes,
            edges,
        }
    }
}

/// Which graph of a multi-graph document to use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GraphSelector {
    /// `graphs[0]`.
    #[default]
    First,
    /// `graphs[n]`.
    Index(usize),
    /// The graph whose `id` matches exactly.
    Id(String),
}

impl GraphSelector {
    /// Parse a selector from a config value: a number selects by position,
    /// anything else by graph id. Empty input selects the first graph.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return GraphSelector::First;
        }
        match value.parse::<usize>() {
            Ok(n) => GraphSelector::Index(n),
            Err(_) => GraphSelector::Id(value.to_string()),
        }
    }
}

impl fmt::Display for GraphSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphSelector::First => write!(f, "first graph"),
            GraphSelector::Index(n) => write!(f, "graph #{}", n),
            GraphSelector::Id(id) => write!(f, "graph {}", id),
        }
    }
}

/// A parsed OBO Graph JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboGraphDocument {
    #[serde(default)]
    pub graphs: Vec<RawGraph>,
}

impl OboGraphDocument {
    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a document from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read and parse a document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Get the graph picked by `selector`, if present.
    pub fn graph(&self, selector: &GraphSelector) -> Option<&RawGraph> {
        match selector {
            GraphSelector::First => self.graphs.first(),
            GraphSelector::Index(n) => self.graphs.get(*n),
            GraphSelector::Id(id) => self
                .graphs
                .iter()
                .find(|g| g.id.as_deref() == Some(id.as_str())),
        }
    }

    /// Like [`graph`](Self::graph), but a missing graph is an error.
    pub fn select(&self, selector: &GraphSelector) -> Result<&RawGraph> {
        self.graph(selector)
            .ok_or_else(|| GraphError::GraphNotFound(selector.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obo_id_strips_prefix() {
        assert_eq!(obo_id("http://purl.obolibrary.org/obo/GO_0008150"), "GO:0008150");
        assert_eq!(obo_id("GO_1"), "GO:1");
        assert_eq!(obo_id("GO:1"), "GO:1");
    }

    #[test]
    fn test_obo_id_replaces_first_underscore_only() {
        assert_eq!(
            obo_id("http://purl.obolibrary.org/obo/RO_0002_211"),
            "RO:0002_211"
        );
        assert_eq!(obo_id("a_b_c"), "a:b_c");
    }

    #[test]
    fn test_obo_id_foreign_iri_untouched_apart_from_underscore() {
        assert_eq!(
            obo_id("http://www.geneontology.org/formats/oboInOwl#hasDbXref"),
            "http://www.geneontology.org/formats/oboInOwl#hasDbXref"
        );
        assert_eq!(obo_id("http://example.org/x_y"), "http://example.org/x:y");
    }

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "graphs": [{
                "id": "http://purl.obolibrary.org/obo/go.owl",
                "nodes": [
                    {"id": "http://purl.obolibrary.org/obo/GO_1", "lbl": "A", "type": "CLASS"},
                    {"id": "http://purl.obolibrary.org/obo/GO_2"}
                ],
                "edges": [
                    {"sub": "http://purl.obolibrary.org/obo/GO_1", "pred": "is_a", "obj": "http://purl.obolibrary.org/obo/GO_2"}
                ]
            }]
        }"#;

        let doc = OboGraphDocument::from_json_str(json).unwrap();
        let graph = doc.select(&GraphSelector::First).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].lbl, "A");
        assert_eq!(graph.nodes[1].lbl, "");
        assert_eq!(graph.edges[0], RawEdge::new(
            "http://purl.obolibrary.org/obo/GO_1",
            "http://purl.obolibrary.org/obo/GO_2",
        ));
    }

    #[test]
    fn test_select_graph() {
        let mut second = RawGraph::new(vec![RawNode::new("GO_9", "Z")], vec![]);
        second.id = Some("extra".to_string());
        let doc = OboGraphDocument {
            graphs: vec![RawGraph::default(), second],
        };

        assert!(doc.graph(&GraphSelector::First).unwrap().nodes.is_empty());
        assert_eq!(doc.graph(&GraphSelector::Index(1)).unwrap().nodes.len(), 1);
        assert_eq!(
            doc.graph(&GraphSelector::Id("extra".into())).unwrap().nodes[0].lbl,
            "Z"
        );
        assert!(matches!(
            doc.select(&GraphSelector::Index(5)),
            Err(GraphError::GraphNotFound(_))
        ));
    }

    #[test]
    fn test_empty_document_has_no_graph() {
        let doc = OboGraphDocument::from_json_str("{}").unwrap();
        assert!(doc.graph(&GraphSelector::First).is_none());
    }

    #[test]
    fn test_invalid_json() {
        let result = OboGraphDocument::from_json_str("{\"graphs\": [");
        assert!(matches!(result, Err(GraphError::Json(_))));
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(GraphSelector::parse(""), GraphSelector::First);
        assert_eq!(GraphSelector::parse("2"), GraphSelector::Index(2));
        assert_eq!(
            GraphSelector::parse("http://purl.obolibrary.org/obo/go.owl"),
            GraphSelector::Id("http://purl.obolibrary.org/obo/go.owl".into())
        );
    }
}
