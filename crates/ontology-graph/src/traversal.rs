//! Ancestor/descendant subgraph extraction.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::OntologyIndex;

/// Parent/child lookups the traversal runs over.
///
/// Ids passed in and returned are canonical. Unknown ids have no label and
/// no neighbors.
pub trait Hierarchy {
    fn label(&self, id: &str) -> Option<&str>;
    fn parents(&self, id: &str) -> &[String];
    fn children(&self, id: &str) -> &[String];

    fn contains(&self, id: &str) -> bool {
        self.label(id).is_some()
    }
}

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow `parents` (ancestors).
    Up,
    /// Follow `children` (descendants).
    Down,
}

impl Direction {
    fn neighbors<'h, H: Hierarchy + ?Sized>(self, hierarchy: &'h H, id: &str) -> &'h [String] {
        match self {
            Direction::Up => hierarchy.parents(id),
            Direction::Down => hierarchy.children(id),
        }
    }

    // Edges always point child -> parent.
    fn edge(self, current: &str, next: &str) -> SubgraphEdge {
        match self {
            Direction::Up => SubgraphEdge::new(current, next),
            Direction::Down => SubgraphEdge::new(next, current),
        }
    }
}

/// A node in an extracted subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphNode {
    pub id: String,
    pub label: String,
}

/// A child -> parent edge in an extracted subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphEdge {
    pub source: String,
    pub target: String,
    /// Always empty; relation types are not rendered.
    pub label: String,
}

impl SubgraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: String::new(),
        }
    }
}

/// An element in the list handed to a Cytoscape renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CytoscapeElement {
    Node { data: SubgraphNode },
    Edge { data: SubgraphEdge },
}

/// Ancestors and descendants of a focus term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphResult {
    /// Ancestor-pass nodes then descendant-pass nodes, in discovery order.
    pub nodes: Vec<SubgraphNode>,
    /// Ancestor-pass edges then descendant-pass edges, in recording order.
    pub edges: Vec<SubgraphEdge>,
}

impl SubgraphResult {
    /// Combine an ancestor and a descendant pass.
    ///
    /// Nodes found by both passes (at least the focus term) are kept at
    /// their first position. Edges are concatenated as recorded.
    pub fn from_passes(up: Traversal, down: Traversal) -> Self {
        let (up_nodes, up_edges) = up.into_parts();
        let (down_nodes, down_edges) = down.into_parts();

        let mut seen = HashSet::with_capacity(up_nodes.len() + down_nodes.len());
        let nodes = up_nodes
            .into_iter()
            .chain(down_nodes)
            .filter(|n| seen.insert(n.id.clone()))
            .collect();

        let mut edges = up_edges;
        edges.extend(down_edges);

        Self { nodes, edges }
    }

    /// Flatten into Cytoscape elements, nodes first.
    pub fn to_elements(&self) -> Vec<CytoscapeElement> {
        self.nodes
            .iter()
            .cloned()
            .map(|data| CytoscapeElement::Node { data })
            .chain(
                self.edges
                    .iter()
                    .cloned()
                    .map(|data| CytoscapeElement::Edge { data }),
            )
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// State of one depth-first pass: visited set plus what it has recorded.
///
/// A node is recorded the first time it is entered. An edge is recorded for
/// every parent (or child) entry of an entered node, even when the other end
/// was already visited, so cycles and diamonds show all their edges while
/// each node is entered once.
#[derive(Debug, Clone)]
pub struct Traversal {
    direction: Direction,
    visited: HashSet<String>,
    nodes: Vec<SubgraphNode>,
    edges: Vec<SubgraphEdge>,
}

impl Traversal {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            visited: HashSet::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Walk from `start`, skipping anything this pass already entered.
    ///
    /// Uses an explicit stack of (node, next neighbor) frames, so the visit
    /// order equals a recursive pre-order walk without growing the call stack.
    pub fn visit<H: Hierarchy + ?Sized>(&mut self, hierarchy: &H, start: &str) {
        if !self.enter(hierarchy, start) {
            return;
        }

        let mut stack: Vec<(String, usize)> = vec![(start.to_string(), 0)];

        while let Some((current, cursor)) = stack.last_mut() {
            let neighbors = self.direction.neighbors(hierarchy, current);
            let Some(next) = neighbors.get(*cursor) else {
                stack.pop();
                continue;
            };
            *cursor += 1;

            let edge = self.direction.edge(current, next);
            self.edges.push(edge);

            if self.enter(hierarchy, next) {
                stack.push((next.clone(), 0));
            }
        }
    }

    fn enter<H: Hierarchy + ?Sized>(&mut self, hierarchy: &H, id: &str) -> bool {
        if self.visited.contains(id) {
            return false;
        }
        self.visited.insert(id.to_string());
        self.nodes.push(SubgraphNode {
            id: id.to_string(),
            label: hierarchy.label(id).unwrap_or_default().to_string(),
        });
        true
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn nodes(&self) -> &[SubgraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SubgraphEdge] {
        &self.edges
    }

    pub fn into_parts(self) -> (Vec<SubgraphNode>, Vec<SubgraphEdge>) {
        (self.nodes, self.edges)
    }
}

/// Run both passes from `focus` over any hierarchy.
pub fn subgraph_of<H: Hierarchy + ?Sized>(hierarchy: &H, focus: &str) -> Option<SubgraphResult> {
    if !hierarchy.contains(focus) {
        return None;
    }

    let mut up = Traversal::new(Direction::Up);
    up.visit(hierarchy, focus);

    let mut down = Traversal::new(Direction::Down);
    down.visit(hierarchy, focus);

    Some(SubgraphResult::from_passes(up, down))
}

/// Extract the ancestor/descendant subgraph of `focus`.
///
/// Returns `None` when the index is not loaded yet or `focus` is not in it;
/// callers render that as "nothing to show".
pub fn extract_subgraph(index: Option<&OntologyIndex>, focus: &str) -> Option<SubgraphResult> {
    index.and_then(|index| subgraph_of(index, focus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::ontology::{RawEdge, RawGraph, RawNode};

    /// Hand-built hierarchy, independent of index construction.
    #[derive(Default)]
    struct TestHierarchy {
        labels: HashMap<String, String>,
        parents: HashMap<String, Vec<String>>,
        children: HashMap<String, Vec<String>>,
    }

    impl TestHierarchy {
        fn node(mut self, id: &str) -> Self {
            self.labels.insert(id.to_string(), id.to_lowercase());
            self
        }

        fn is_a(mut self, child: &str, parent: &str) -> Self {
            self.parents.entry(child.into()).or_default().push(parent.into());
            self.children.entry(parent.into()).or_default().push(child.into());
            self
        }
    }

    impl Hierarchy for TestHierarchy {
        fn label(&self, id: &str) -> Option<&str> {
            self.labels.get(id).map(String::as_str)
        }

        fn parents(&self, id: &str) -> &[String] {
            self.parents.get(id).map(Vec::as_slice).unwrap_or_default()
        }

        fn children(&self, id: &str) -> &[String] {
            self.children.get(id).map(Vec::as_slice).unwrap_or_default()
        }
    }

    fn ids(nodes: &[SubgraphNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn pairs(edges: &[SubgraphEdge]) -> Vec<(&str, &str)> {
        edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }

    fn go_chain() -> OntologyIndex {
        OntologyIndex::from_obo(&RawGraph::new(
            vec![
                RawNode::new("GO_1", "A"),
                RawNode::new("GO_2", "B"),
                RawNode::new("GO_3", "C"),
            ],
            vec![RawEdge::new("GO_1", "GO_2"), RawEdge::new("GO_2", "GO_3")],
        ))
    }

    #[test]
    fn test_extract_middle_of_chain() {
        let index = go_chain();
        let result = extract_subgraph(Some(&index), "GO:2").unwrap();

        assert_eq!(ids(&result.nodes), vec!["GO:2", "GO:3", "GO:1"]);
        assert_eq!(pairs(&result.edges), vec![("GO:2", "GO:3"), ("GO:1", "GO:2")]);
        assert_eq!(result.nodes[1].label, "C");
        assert!(result.edges.iter().all(|e| e.label.is_empty()));
    }

    #[test]
    fn test_passes_record_focus_once_each() {
        let index = go_chain();

        let mut up = Traversal::new(Direction::Up);
        up.visit(&index, "GO:2");
        let mut down = Traversal::new(Direction::Down);
        down.visit(&index, "GO:2");

        assert_eq!(ids(up.nodes()), vec!["GO:2", "GO:3"]);
        assert_eq!(ids(down.nodes()), vec!["GO:2", "GO:1"]);
        assert_eq!(pairs(up.edges()), vec![("GO:2", "GO:3")]);
        assert_eq!(pairs(down.edges()), vec![("GO:1", "GO:2")]);
    }

    #[test]
    fn test_absent_propagation() {
        let index = go_chain();
        assert!(extract_subgraph(None, "GO:1").is_none());
        assert!(extract_subgraph(Some(&index), "GO:404").is_none());
        assert!(extract_subgraph(Some(&index), "GO_1").is_none());
    }

    #[test]
    fn test_self_loop_terminates() {
        let index = OntologyIndex::from_obo(&RawGraph::new(
            vec![RawNode::new("GO_1", "A")],
            vec![RawEdge::new("GO_1", "GO_1")],
        ));

        let mut up = Traversal::new(Direction::Up);
        up.visit(&index, "GO:1");
        assert_eq!(ids(up.nodes()), vec!["GO:1"]);

        let result = index.subgraph("GO:1").unwrap();
        assert_eq!(ids(&result.nodes), vec!["GO:1"]);
        assert_eq!(pairs(&result.edges), vec![("GO:1", "GO:1"), ("GO:1", "GO:1")]);
    }

    #[test]
    fn test_cycle_terminates() {
        let h = TestHierarchy::default()
            .node("A")
            .node("B")
            .node("C")
            .is_a("A", "B")
            .is_a("B", "C")
            .is_a("C", "A");

        let mut up = Traversal::new(Direction::Up);
        up.visit(&h, "A");

        assert_eq!(ids(up.nodes()), vec!["A", "B", "C"]);
        assert_eq!(pairs(up.edges()), vec![("A", "B"), ("B", "C"), ("C", "A")]);
    }

    #[test]
    fn test_depth_first_preorder() {
        // D has parents B and C; both have parent A. B also has parent E.
        let h = TestHierarchy::default()
            .node("A")
            .node("B")
            .node("C")
            .node("D")
            .node("E")
            .is_a("D", "B")
            .is_a("D", "C")
            .is_a("B", "A")
            .is_a("B", "E")
            .is_a("C", "A");

        let mut up = Traversal::new(Direction::Up);
        up.visit(&h, "D");

        assert_eq!(ids(up.nodes()), vec!["D", "B", "A", "E", "C"]);
        // The diamond edge C -> A is recorded although A was already entered.
        assert_eq!(
            pairs(up.edges()),
            vec![("D", "B"), ("B", "A"), ("B", "E"), ("D", "C"), ("C", "A")]
        );
    }

    #[test]
    fn test_descendant_edges_point_to_parent() {
        let h = TestHierarchy::default()
            .node("root")
            .node("x")
            .node("y")
            .node("z")
            .is_a("x", "root")
            .is_a("y", "root")
            .is_a("z", "x");

        let result = subgraph_of(&h, "root").unwrap();

        assert_eq!(ids(&result.nodes), vec!["root", "x", "z", "y"]);
        assert_eq!(
            pairs(&result.edges),
            vec![("x", "root"), ("z", "x"), ("y", "root")]
        );
        assert_eq!(result.nodes[0].label, "root");
    }

    #[test]
    fn test_reachability_completeness() {
        let h = TestHierarchy::default()
            .node("a")
            .node("b")
            .node("c")
            .node("d")
            .node("e")
            .node("unrelated")
            .is_a("b", "a")
            .is_a("c", "a")
            .is_a("d", "b")
            .is_a("d", "c")
            .is_a("e", "d");

        let mut down = Traversal::new(Direction::Down);
        down.visit(&h, "a");

        let mut found = ids(down.nodes());
        found.sort();
        assert_eq!(found, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(down.visited().len(), 5);
        assert!(!down.visited().contains("unrelated"));
    }

    #[test]
    fn test_visit_twice_is_noop() {
        let index = go_chain();
        let mut up = Traversal::new(Direction::Up);
        up.visit(&index, "GO:1");
        let before = (up.nodes().len(), up.edges().len());

        up.visit(&index, "GO:1");
        assert_eq!((up.nodes().len(), up.edges().len()), before);
        assert_eq!(up.direction(), Direction::Up);
    }

    #[test]
    fn test_repeated_extraction_is_stable() {
        let index = go_chain();
        let first = index.subgraph("GO:2");
        let _ = index.subgraph("GO:1");
        assert_eq!(index.subgraph("GO:2"), first);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let n = 50_000;
        let nodes = (0..n).map(|i| RawNode::new(format!("GO_{}", i), "")).collect();
        let edges = (1..n)
            .map(|i| RawEdge::new(format!("GO_{}", i), format!("GO_{}", i - 1)))
            .collect();
        let index = OntologyIndex::from_obo(&RawGraph::new(nodes, edges));

        let result = index.subgraph(&format!("GO:{}", n - 1)).unwrap();
        assert_eq!(result.nodes.len(), n);
        assert_eq!(result.edges.len(), n - 1);
    }

    #[test]
    fn test_to_elements() {
        let index = go_chain();
        let elements = index.subgraph("GO:2").unwrap().to_elements();

        assert_eq!(elements.len(), 5);
        assert!(matches!(elements[0], CytoscapeElement::Node { .. }));
        assert!(matches!(elements[3], CytoscapeElement::Edge { .. }));

        let json = serde_json::to_value(&elements).unwrap();
        assert_eq!(json[0], serde_json::json!({"data": {"id": "GO:2", "label": "B"}}));
        assert_eq!(
            json[3],
            serde_json::json!({"data": {"source": "GO:2", "target": "GO:3", "label": ""}})
        );
    }
}
