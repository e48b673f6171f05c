use ahash::{AHashMap, AHashSet};

use crate::hyperedge::Hyperedge;
use crate::{EdgeId, Node};

/// Read-only hypergraph view: nodes, edges (id → member tuple), node
/// memberships (node → set of edge ids), unique edge sizes.
///
/// # Design Overview
/// Mirrors the teacher hypergraph library's double-table design: an
/// `edge_list` keyed by `EdgeId` and an `incidence_list` keyed by `Node`,
/// storing only ids on the node side. Neither table owns the other; both
/// are built once at construction and treated as read-only for the rest of
/// a simulation run (Design Notes §9, "cyclic graphs and back-references").
///
/// Unlike the teacher's hypergraph (which deduplicates hyperedges by
/// content hash), this view assigns ids by insertion order: two
/// hyperedges with identical member sets are legitimate distinct
/// multi-edges here, matching the original `xgi.Hypergraph` model this
/// simulator drives.
pub struct Hypergraph {
    edge_list: AHashMap<EdgeId, Hyperedge>,
    incidence_list: AHashMap<Node, AHashSet<EdgeId>>,
    unique_edge_sizes: AHashSet<usize>,
    next_edge_id: EdgeId,
}

/// One hyperedge as supplied to a constructor: members plus an optional
/// weight (`None` means "unweighted", recorded internally as `1.0`).
pub struct EdgeSpec {
    pub members: Vec<Node>,
    pub weight: Option<f64>,
}

impl EdgeSpec {
    pub fn new(members: Vec<Node>) -> Self {
        Self {
            members,
            weight: None,
        }
    }

    pub fn weighted(members: Vec<Node>, weight: f64) -> Self {
        Self {
            members,
            weight: Some(weight),
        }
    }
}

impl From<Vec<Node>> for EdgeSpec {
    fn from(members: Vec<Node>) -> Self {
        EdgeSpec::new(members)
    }
}

impl Hypergraph {
    /// Creates an empty hypergraph.
    pub fn new() -> Self {
        Self {
            edge_list: AHashMap::new(),
            incidence_list: AHashMap::new(),
            unique_edge_sizes: AHashSet::new(),
            next_edge_id: 0,
        }
    }

    /// Builds a hypergraph from a list of hyperedge specs.
    ///
    /// Every edge with fewer than 2 members is dropped with a
    /// `log::warn!` (spec.md §7, "Malformed input... Discard or abort as
    /// documented; do not silently corrupt"). The node set is the union of
    /// all retained members.
    pub fn from_edges<I, E>(edges: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EdgeSpec>,
    {
        let mut hg = Self::new();
        for spec in edges {
            hg.add_edge(spec.into());
        }
        hg
    }

    /// Inserts one hyperedge, assigning it the next sequential `EdgeId`.
    /// Returns `None` if the edge was dropped for having fewer than 2
    /// members.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Option<EdgeId> {
        if spec.members.len() < 2 {
            log::warn!(
                "dropping degenerate hyperedge with {} member(s): {:?}",
                spec.members.len(),
                spec.members
            );
            return None;
        }

        let edge_id = self.next_edge_id;
        self.next_edge_id += 1;

        let size = spec.members.len();
        for &node in &spec.members {
            self.incidence_list.entry(node).or_default().insert(edge_id);
        }
        self.edge_list.insert(
            edge_id,
            Hyperedge::new(spec.members, spec.weight.unwrap_or(1.0)),
        );
        self.unique_edge_sizes.insert(size);

        Some(edge_id)
    }

    /// Registers a node with no incident edges, if not already present.
    /// Returns `true` if the node was newly added.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.incidence_list.contains_key(&node) {
            false
        } else {
            self.incidence_list.insert(node, AHashSet::new());
            true
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.incidence_list.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_list.len()
    }

    /// The finite set of node labels in the hypergraph.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.incidence_list.keys().copied()
    }

    pub fn contains_node(&self, node: Node) -> bool {
        self.incidence_list.contains_key(&node)
    }

    /// Ordered tuple of member nodes for a hyperedge.
    pub fn members(&self, edge_id: EdgeId) -> Option<&[Node]> {
        self.edge_list.get(&edge_id).map(|e| e.members.as_slice())
    }

    pub fn edge_weight(&self, edge_id: EdgeId) -> Option<f64> {
        self.edge_list.get(&edge_id).map(|e| e.weight)
    }

    pub fn edge_size(&self, edge_id: EdgeId) -> Option<usize> {
        self.edge_list.get(&edge_id).map(|e| e.size())
    }

    /// The set of hyperedge ids incident to `node`.
    pub fn memberships(&self, node: Node) -> &AHashSet<EdgeId> {
        static EMPTY: std::sync::OnceLock<AHashSet<EdgeId>> = std::sync::OnceLock::new();
        self.incidence_list
            .get(&node)
            .unwrap_or_else(|| EMPTY.get_or_init(AHashSet::new))
    }

    /// Every distinct hyperedge size present in the hypergraph.
    pub fn unique_edge_sizes(&self) -> &AHashSet<usize> {
        &self.unique_edge_sizes
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (&EdgeId, &Hyperedge)> {
        self.edge_list.iter()
    }
}

impl Default for Hypergraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Hypergraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hypergraph with {} nodes and {} edges",
            self.num_nodes(),
            self.num_edges()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_degenerate_edges() {
        let hg = Hypergraph::from_edges(vec![vec![1], vec![1, 2, 3]]);
        assert_eq!(hg.num_edges(), 1);
        assert_eq!(hg.num_nodes(), 3);
    }

    #[test]
    fn incidence_consistency() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2, 3], vec![3, 4]]);
        for (edge_id, edge) in hg.iter_edges() {
            for &node in &edge.members {
                assert!(hg.memberships(node).contains(edge_id));
            }
        }
    }

    #[test]
    fn unique_edge_sizes_tracked() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2], vec![3, 4, 5], vec![1, 6]]);
        let sizes: Vec<usize> = {
            let mut v: Vec<_> = hg.unique_edge_sizes().iter().copied().collect();
            v.sort_unstable();
            v
        };
        assert_eq!(sizes, vec![2, 3]);
    }

    #[test]
    fn duplicate_member_sets_are_distinct_edges() {
        let hg = Hypergraph::from_edges(vec![vec![1, 2, 3], vec![1, 2, 3]]);
        assert_eq!(hg.num_edges(), 2);
    }
}
