//! Depth-first traversal and path finding within one version
//!
//! A [`GraphTraversal`] indexes a version's nodes and edges once (one node
//! query plus one edge query against the [`GraphStore`]) and then answers
//! walks from memory. Both algorithms are iterative with an explicit stack
//! and a visited set, so cycles terminate and deep graphs do not overflow the
//! call stack. Edge direction is `incoming_node_id -> outgoing_node_id`.

use crate::error::{KastleError, Result};
use crate::store::{GraphStore, TreeEdge, TreeNode, VersionSnapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Outcome of [`GraphTraversal::find_path`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundPath {
    /// Node ids from start to end; empty when not found
    pub nodes: Vec<i32>,
    pub found: bool,
}

/// Read-only adjacency index over a single version
#[derive(Debug, Clone)]
pub struct GraphTraversal {
    version_id: i32,
    order: Vec<i32>,
    nodes: HashMap<i32, TreeNode>,
    outgoing: HashMap<i32, Vec<TreeEdge>>,
    incoming: HashMap<i32, Vec<TreeEdge>>,
    edge_count: usize,
}

impl GraphTraversal {
    /// Load and index every node and edge of `version_id`
    pub fn load<S: GraphStore + ?Sized>(store: &mut S, version_id: i32) -> Result<Self> {
        let nodes = store.nodes_by_version(version_id)?;
        let edges = store.edges_by_version(version_id)?;
        Ok(Self::from_parts(version_id, nodes, edges))
    }

    pub fn from_snapshot(snapshot: &VersionSnapshot) -> Self {
        Self::from_parts(
            snapshot.version.id,
            snapshot.nodes.clone(),
            snapshot.edges.clone(),
        )
    }

    /// Build the index. Edges with an endpoint outside `nodes` are dropped:
    /// traversal never leaves the version.
    pub fn from_parts(version_id: i32, nodes: Vec<TreeNode>, edges: Vec<TreeEdge>) -> Self {
        let order: Vec<i32> = nodes.iter().map(|n| n.id).collect();
        let nodes: HashMap<i32, TreeNode> = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut outgoing: HashMap<i32, Vec<TreeEdge>> = HashMap::new();
        let mut incoming: HashMap<i32, Vec<TreeEdge>> = HashMap::new();
        let mut edge_count = 0;
        for edge in edges {
            if !nodes.contains_key(&edge.incoming_node_id) || !nodes.contains_key(&edge.outgoing_node_id) {
                continue;
            }
            edge_count += 1;
            incoming
                .entry(edge.outgoing_node_id)
                .or_default()
                .push(edge.clone());
            outgoing.entry(edge.incoming_node_id).or_default().push(edge);
        }

        Self {
            version_id,
            order,
            nodes,
            outgoing,
            incoming,
            edge_count,
        }
    }

    pub fn version_id(&self) -> i32 {
        self.version_id
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, id: i32) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Nodes in enumeration order
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Edges leaving `id`, in enumeration order
    pub fn out_edges(&self, id: i32) -> &[TreeEdge] {
        self.outgoing.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges arriving at `id`
    pub fn in_edges(&self, id: i32) -> &[TreeEdge] {
        self.incoming.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: i32) -> Vec<&TreeNode> {
        self.out_edges(id)
            .iter()
            .filter_map(|e| self.nodes.get(&e.outgoing_node_id))
            .collect()
    }

    pub fn parents(&self, id: i32) -> Vec<&TreeNode> {
        self.in_edges(id)
            .iter()
            .filter_map(|e| self.nodes.get(&e.incoming_node_id))
            .collect()
    }

    fn require(&self, id: i32) -> Result<&TreeNode> {
        self.nodes.get(&id).ok_or(KastleError::NodeNotFound(id))
    }

    /// Visit `start`, then every node reachable through outgoing edges,
    /// depth first in edge order. Each node is visited once.
    /// Returns the number of nodes visited.
    pub fn depth_first_walk<F>(&self, start: i32, mut visit: F) -> Result<usize>
    where
        F: FnMut(&TreeNode),
    {
        self.require(start)?;

        let mut visited: HashSet<i32> = HashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                visit(node);
            }
            // Reversed so the first edge is explored first
            for edge in self.out_edges(id).iter().rev() {
                if !visited.contains(&edge.outgoing_node_id) {
                    stack.push(edge.outgoing_node_id);
                }
            }
        }

        Ok(visited.len())
    }

    /// Node ids in the order [`depth_first_walk`](Self::depth_first_walk) visits them
    pub fn walk_order(&self, start: i32) -> Result<Vec<i32>> {
        let mut ids = Vec::new();
        self.depth_first_walk(start, |node| ids.push(node.id))?;
        Ok(ids)
    }

    /// First path from `start` to `end` found by depth-first search.
    ///
    /// Not necessarily the shortest. Dead-end branches are popped off the
    /// path on backtrack.
    pub fn find_path(&self, start: i32, end: i32) -> Result<FoundPath> {
        self.require(start)?;
        self.require(end)?;

        let mut path = vec![start];
        if start == end {
            return Ok(FoundPath { nodes: path, found: true });
        }

        let mut visited: HashSet<i32> = HashSet::from([start]);
        // (node, index of the next out-edge to try)
        let mut frames: Vec<(i32, usize)> = vec![(start, 0)];

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;
            match self.out_edges(node).get(cursor) {
                Some(edge) => {
                    frame.1 += 1;
                    let next = edge.outgoing_node_id;
                    if visited.insert(next) {
                        path.push(next);
                        if next == end {
                            return Ok(FoundPath { nodes: path, found: true });
                        }
                        frames.push((next, 0));
                    }
                }
                None => {
                    frames.pop();
                    path.pop();
                }
            }
        }

        Ok(FoundPath {
            nodes: path,
            found: false,
        })
    }

    /// Ids of every node reachable from `roots` (roots included).
    /// Roots outside the version are ignored.
    pub fn reachable_from(&self, roots: &[i32]) -> HashSet<i32> {
        let mut reachable: HashSet<i32> = HashSet::new();
        let mut to_visit: Vec<i32> = roots
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id))
            .collect();

        while let Some(id) = to_visit.pop() {
            if reachable.insert(id) {
                to_visit.extend(self.out_edges(id).iter().map(|e| e.outgoing_node_id));
            }
        }
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attributes;
    use proptest::prelude::*;

    fn node(id: i32) -> TreeNode {
        TreeNode {
            id,
            version_id: 1,
            data: Attributes::new().with("setting", format!("value{}", id)),
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn graph(node_ids: &[i32], edges: &[(i32, i32)]) -> GraphTraversal {
        let nodes = node_ids.iter().map(|&id| node(id)).collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(i, &(from, to))| TreeEdge {
                id: i as i32 + 1,
                version_id: 1,
                incoming_node_id: from,
                outgoing_node_id: to,
                data: Attributes::new(),
                created_at: "2025-01-01T00:00:00.000000Z".to_string(),
            })
            .collect();
        GraphTraversal::from_parts(1, nodes, edges)
    }

    #[test]
    fn test_walk_follows_edge_order() {
        // 1 -> 2 -> 4, 1 -> 3 -> 4
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        assert_eq!(g.walk_order(1).unwrap(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_walk_terminates_on_cycles() {
        let g = graph(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1), (3, 3)]);
        let mut seen = Vec::new();
        let count = g.depth_first_walk(2, |n| seen.push(n.id)).unwrap();
        assert_eq!(seen, vec![2, 3, 1]);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_walk_unknown_start() {
        let g = graph(&[1], &[]);
        assert!(matches!(g.walk_order(7), Err(KastleError::NodeNotFound(7))));
    }

    #[test]
    fn test_find_path_linear_chain() {
        let g = graph(&[1, 2, 3], &[(1, 2), (2, 3)]);

        let forward = g.find_path(1, 3).unwrap();
        assert!(forward.found);
        assert_eq!(forward.nodes, vec![1, 2, 3]);

        let backward = g.find_path(3, 1).unwrap();
        assert!(!backward.found);
        assert!(backward.nodes.is_empty());
    }

    #[test]
    fn test_find_path_drops_dead_ends() {
        // 1 -> 2 (dead end), 1 -> 3 -> 4
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (1, 3), (3, 4)]);
        assert_eq!(g.find_path(1, 4).unwrap().nodes, vec![1, 3, 4]);
    }

    #[test]
    fn test_find_path_is_first_not_shortest() {
        // 1 -> 2 -> 3 -> 4 explored before the direct 1 -> 4
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (1, 4)]);
        assert_eq!(g.find_path(1, 4).unwrap().nodes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_find_path_to_self() {
        let g = graph(&[5], &[]);
        let path = g.find_path(5, 5).unwrap();
        assert!(path.found);
        assert_eq!(path.nodes, vec![5]);
    }

    #[test]
    fn test_edges_leaving_the_version_are_ignored() {
        // Node 9 is not part of this version
        let g = graph(&[1, 2], &[(1, 9), (1, 2)]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.walk_order(1).unwrap(), vec![1, 2]);
        assert!(matches!(g.find_path(1, 9), Err(KastleError::NodeNotFound(9))));
    }

    #[test]
    fn test_children_parents_and_reachability() {
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (1, 3), (3, 2)]);
        let children: Vec<i32> = g.children(1).iter().map(|n| n.id).collect();
        assert_eq!(children, vec![2, 3]);
        let parents: Vec<i32> = g.parents(2).iter().map(|n| n.id).collect();
        assert_eq!(parents, vec![1, 3]);

        let reachable = g.reachable_from(&[3, 42]);
        assert_eq!(reachable, HashSet::from([3, 2]));
        assert!(!reachable.contains(&4));
    }

    fn reachable_naive(g: &GraphTraversal, start: i32) -> HashSet<i32> {
        g.reachable_from(&[start])
    }

    proptest! {
        #[test]
        fn prop_walk_visits_each_reachable_node_once(
            n in 1i32..15,
            raw in proptest::collection::vec((0i32..15, 0i32..15), 0..40),
            start in 0i32..15,
        ) {
            let ids: Vec<i32> = (1..=n).collect();
            let edges: Vec<(i32, i32)> = raw.iter().map(|(a, b)| (a % n + 1, b % n + 1)).collect();
            let g = graph(&ids, &edges);
            let start = start % n + 1;

            let order = g.walk_order(start).unwrap();
            let unique: HashSet<i32> = order.iter().copied().collect();
            prop_assert_eq!(unique.len(), order.len());
            prop_assert_eq!(unique, reachable_naive(&g, start));
            prop_assert_eq!(order[0], start);
        }

        #[test]
        fn prop_find_path_is_valid_iff_reachable(
            n in 1i32..12,
            raw in proptest::collection::vec((0i32..12, 0i32..12), 0..30),
            start in 0i32..12,
            end in 0i32..12,
        ) {
            let ids: Vec<i32> = (1..=n).collect();
            let edges: Vec<(i32, i32)> = raw.iter().map(|(a, b)| (a % n + 1, b % n + 1)).collect();
            let g = graph(&ids, &edges);
            let (start, end) = (start % n + 1, end % n + 1);

            let result = g.find_path(start, end).unwrap();
            prop_assert_eq!(result.found, reachable_naive(&g, start).contains(&end));

            if result.found {
                prop_assert_eq!(result.nodes.first(), Some(&start));
                prop_assert_eq!(result.nodes.last(), Some(&end));
                for pair in result.nodes.windows(2) {
                    prop_assert!(edges.contains(&(pair[0], pair[1])));
                }
            } else {
                prop_assert!(result.nodes.is_empty());
            }
        }
    }
}
