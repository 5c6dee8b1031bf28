//! Spanning-tree construction over the visible graph.
//!
//! The concept graph is arbitrary (cycles, several components). Tree layouts
//! need a rooted tree, so the hierarchy is a breadth-first spanning tree:
//!
//! 1. Degree of every node over the undirected edge set.
//! 2. Root = highest degree, ties broken by node input order.
//! 3. BFS from the root. Neighbors are visited in edge order; back-edges are
//!    dropped.
//! 4. Nodes the BFS never reached hang directly off the root at depth 1.

use std::collections::{HashMap, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::graph::{GraphEdge, GraphNode};

/// Id of the placeholder root returned for an empty graph.
pub const STUB_ROOT_ID: &str = "root";

/// A node of the spanning tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    #[serde(flatten)]
    pub node: GraphNode,
    pub children: Vec<HierarchyNode>,
    pub depth: u32,
}

// Long chains nest deeply; unlink children onto a heap stack so dropping
// never recurses.
impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl HierarchyNode {
    fn leaf(node: GraphNode, depth: u32) -> Self {
        Self {
            node,
            children: Vec::new(),
            depth,
        }
    }

    /// The placeholder root used when there is nothing to arrange.
    pub fn stub() -> Self {
        Self::leaf(GraphNode::new(STUB_ROOT_ID, "Root"), 0)
    }

    /// Id of this node.
    #[inline]
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Whether this is the placeholder root of an empty graph.
    pub fn is_stub(&self) -> bool {
        self.node.id == STUB_ROOT_ID && self.children.is_empty() && self.node.label == "Root"
    }

    /// Number of nodes in this subtree, including itself.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a subtree contains at least its own root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pre-order traversal of the subtree.
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    /// Find a node by id.
    pub fn find(&self, id: &str) -> Option<&HierarchyNode> {
        self.iter().find(|node| node.id() == id)
    }

    /// Parent→child id pairs of the tree, in pre-order.
    pub fn tree_edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::new();
        for parent in self.iter() {
            for child in &parent.children {
                edges.push((parent.node.id.clone(), child.node.id.clone()));
            }
        }
        edges
    }
}

/// Build the BFS spanning tree of `nodes` and `edges`.
///
/// Edges whose endpoints are not both in `nodes` are ignored, as are
/// self-loops. Repeated node ids keep their first occurrence. An empty node
/// list yields [`HierarchyNode::stub`].
pub fn build_hierarchy(nodes: &[GraphNode], edges: &[GraphEdge]) -> HierarchyNode {
    let mut graph: StableUnGraph<usize, ()> =
        StableUnGraph::with_capacity(nodes.len(), edges.len());
    let mut index_by_id: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

    for (slot, node) in nodes.iter().enumerate() {
        if !index_by_id.contains_key(node.id.as_str()) {
            let index = graph.add_node(slot);
            index_by_id.insert(node.id.as_str(), index);
        }
    }

    for edge in edges {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(edge.source.as_str()),
            index_by_id.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if source != target {
            graph.add_edge(source, target, ());
        }
    }

    // Node indices follow insertion order, so the strict comparison keeps the
    // first node among equal degrees.
    let Some(root) = graph.node_indices().fold(None, |best: Option<(NodeIndex, usize)>, index| {
        let degree = graph.edges(index).count();
        match best {
            Some((_, best_degree)) if best_degree >= degree => best,
            _ => Some((index, degree)),
        }
    }) else {
        return HierarchyNode::stub();
    };
    let root = root.0;

    let node_bound = graph.node_count();
    let mut visited = vec![false; node_bound];
    let mut depth = vec![0u32; node_bound];
    let mut children: Vec<Vec<NodeIndex>> = vec![Vec::new(); node_bound];
    let mut queue = VecDeque::from([root]);
    let mut order = Vec::with_capacity(node_bound);
    visited[root.index()] = true;

    while let Some(current) = queue.pop_front() {
        order.push(current);
        let mut incident: Vec<(usize, NodeIndex)> = graph
            .edges(current)
            .map(|edge| {
                let other = if edge.source() == current {
                    edge.target()
                } else {
                    edge.source()
                };
                (edge.id().index(), other)
            })
            .collect();
        incident.sort_unstable_by_key(|&(edge_index, _)| edge_index);

        for (_, neighbor) in incident {
            if visited[neighbor.index()] {
                continue;
            }
            visited[neighbor.index()] = true;
            depth[neighbor.index()] = depth[current.index()] + 1;
            children[current.index()].push(neighbor);
            queue.push_back(neighbor);
        }
    }

    let mut tree = assemble(&graph, nodes, &children, &depth, &order);

    for index in graph.node_indices() {
        if !visited[index.index()] {
            tree.children
                .push(HierarchyNode::leaf(nodes[graph[index]].clone(), 1));
        }
    }

    log::debug!(
        "hierarchy built: root={} nodes={} edges={}",
        tree.id(),
        graph.node_count(),
        graph.edge_count()
    );
    tree
}

/// Build the nested tree bottom-up from the BFS visiting order.
///
/// Every child comes after its parent in `order`, so walking it backwards
/// finds each subtree complete before its parent needs it. `order` must be
/// non-empty and start at the root.
fn assemble(
    graph: &StableUnGraph<usize, ()>,
    nodes: &[GraphNode],
    children: &[Vec<NodeIndex>],
    depth: &[u32],
    order: &[NodeIndex],
) -> HierarchyNode {
    let mut built: Vec<Option<HierarchyNode>> = vec![None; children.len()];
    for &index in order.iter().rev() {
        let subtrees = children[index.index()]
            .iter()
            .filter_map(|child| built[child.index()].take())
            .collect();
        built[index.index()] = Some(HierarchyNode {
            node: nodes[graph[index]].clone(),
            children: subtrees,
            depth: depth[index.index()],
        });
    }
    order
        .first()
        .and_then(|root| built[root.index()].take())
        .unwrap_or_else(HierarchyNode::stub)
}
