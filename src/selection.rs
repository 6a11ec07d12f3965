// src/selection.rs - bone edges and the two-edge joint selection
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// A bone segment between two landmark indices. Equality ignores order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }

    /// Both ends on the same landmark; not a bone.
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    fn sorted(&self) -> (usize, usize) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl From<[usize; 2]> for Edge {
    fn from([a, b]: [usize; 2]) -> Self {
        Self::new(a, b)
    }
}

impl From<Edge> for [usize; 2] {
    fn from(edge: Edge) -> Self {
        [edge.a, edge.b]
    }
}

impl From<(usize, usize)> for Edge {
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

impl FromStr for Edge {
    type Err = Error;

    /// Parses `"11,13"` (whitespace and surrounding parentheses allowed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(Error::InvalidEdge(format!(
                "expected two comma-separated landmark indices, got {:?}",
                s
            )));
        }
        let a = parts[0]
            .parse()
            .map_err(|_| Error::InvalidEdge(format!("bad landmark index {:?}", parts[0])))?;
        let b = parts[1]
            .parse()
            .map_err(|_| Error::InvalidEdge(format!("bad landmark index {:?}", parts[1])))?;
        Ok(Self::new(a, b))
    }
}

/// The single landmark two edges have in common, or `None` when they share
/// zero or two indices. Self-edges never yield a joint.
pub fn shared_joint(edge_a: Edge, edge_b: Edge) -> Option<usize> {
    if edge_a.is_degenerate() || edge_b.is_degenerate() {
        return None;
    }
    match (edge_a.contains(edge_b.a), edge_a.contains(edge_b.b)) {
        (true, false) => Some(edge_b.a),
        (false, true) => Some(edge_b.b),
        _ => None,
    }
}

/// The far end of each edge from `joint`. Only meaningful once
/// [`shared_joint`] has returned `joint` for this pair.
pub fn outer_endpoints(edge_a: Edge, edge_b: Edge, joint: usize) -> (usize, usize) {
    let outer_a = if edge_a.a == joint { edge_a.b } else { edge_a.a };
    let outer_b = if edge_b.a == joint { edge_b.b } else { edge_b.a };
    (outer_a, outer_b)
}

/// What happened to the selection after an edge was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Selection now holds this single edge
    Started(Edge),
    /// Two edges meeting at this joint
    Joint(usize),
    /// The pair shared no single joint; only this edge was kept
    Reset(Edge),
}

/// Up to two user-picked edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSelection {
    edges: Vec<Edge>,
}

impl EdgeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection pre-filled with a pair, validated the same way as two
    /// consecutive [`add`](Self::add) calls.
    pub fn with_pair(edge_a: Edge, edge_b: Edge) -> Self {
        let mut selection = Self::new();
        selection.add(edge_a);
        selection.add(edge_b);
        selection
    }

    pub fn add(&mut self, edge: Edge) -> SelectionEvent {
        if self.edges.len() >= 2 {
            self.edges.clear();
        }
        self.edges.push(edge);

        if self.edges.len() == 1 {
            return SelectionEvent::Started(edge);
        }

        let first = self.edges[0];
        match shared_joint(first, edge) {
            Some(joint) => SelectionEvent::Joint(joint),
            None => {
                debug!("Edges {} and {} share no single joint, keeping {}", first, edge, edge);
                self.edges = vec![edge];
                SelectionEvent::Reset(edge)
            }
        }
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Both edges, once the selection is complete.
    pub fn pair(&self) -> Option<(Edge, Edge)> {
        match self.edges.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }

    pub fn joint(&self) -> Option<usize> {
        self.pair().and_then(|(a, b)| shared_joint(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_equality_ignores_order() {
        assert_eq!(Edge::new(11, 13), Edge::new(13, 11));
        assert_ne!(Edge::new(11, 13), Edge::new(11, 15));
    }

    #[test]
    fn test_edge_parse() {
        assert_eq!("11,13".parse::<Edge>().unwrap(), Edge::new(11, 13));
        assert_eq!(" (23, 25) ".parse::<Edge>().unwrap(), Edge::new(23, 25));
        assert!(matches!("11".parse::<Edge>(), Err(Error::InvalidEdge(_))));
        assert!("a,b".parse::<Edge>().is_err());
        assert!("1,2,3".parse::<Edge>().is_err());
    }

    #[test]
    fn test_edge_serializes_as_pair() {
        let json = serde_json::to_string(&Edge::new(11, 13)).unwrap();
        assert_eq!(json, "[11,13]");
        let edge: Edge = serde_json::from_str("[13,15]").unwrap();
        assert_eq!(edge, Edge::new(15, 13));
    }

    #[test]
    fn test_third_edge_starts_over() {
        let mut selection = EdgeSelection::new();
        selection.add(Edge::new(11, 13));
        assert_eq!(selection.add(Edge::new(13, 15)), SelectionEvent::Joint(13));
        assert_eq!(selection.add(Edge::new(23, 25)), SelectionEvent::Started(Edge::new(23, 25)));
        assert_eq!(selection.edges(), &[Edge::new(23, 25)]);
    }

    #[test]
    fn test_invalid_pair_keeps_second_edge() {
        let mut selection = EdgeSelection::new();
        selection.add(Edge::new(11, 13));
        let event = selection.add(Edge::new(23, 25));
        assert_eq!(event, SelectionEvent::Reset(Edge::new(23, 25)));
        assert_eq!(selection.edges(), &[Edge::new(23, 25)]);
        assert!(selection.pair().is_none());

        // The kept edge can still pair with a following one
        assert_eq!(selection.add(Edge::new(25, 27)), SelectionEvent::Joint(25));
        assert_eq!(selection.joint(), Some(25));
    }
}
