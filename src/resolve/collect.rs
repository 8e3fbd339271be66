//! Deepest-concrete-leaf collection.
//!
//! For one (root, context) pair, walk the context-restricted subtree and
//! find its frontier: nodes with no child left in the context. Concrete
//! frontier nodes are leaf candidates; abstract ones are recorded as
//! abstract tails. The caller decides what the candidate count means:
//! exactly one is a mapping, two or more is a class ambiguity.

use crate::registry::SpecializationForest;
use crate::types::{ContextId, NodeIndex};

/// Frontier survey of one root's context-restricted subtree.
#[derive(Debug, Default)]
pub(crate) struct RootCollection {
    /// Concrete frontier nodes, in arena order.
    pub leaves: Vec<NodeIndex>,
    /// Abstract frontier nodes, in arena order.
    pub abstract_tails: Vec<NodeIndex>,
}

/// One accepted root→leaf chain within a single context.
///
/// Every node on the chain maps to the same leaf. After propagation a
/// qualifying leaf's whole ancestry is in the context, so the chain is the
/// full path up to the forest root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcretePath {
    pub context: ContextId,
    /// Chain from root to leaf, inclusive.
    pub nodes: Vec<NodeIndex>,
    pub leaf: NodeIndex,
}

impl ConcretePath {
    pub(crate) fn to_leaf(
        forest: &SpecializationForest,
        context: ContextId,
        leaf: NodeIndex,
    ) -> Self {
        let mut nodes = forest.ancestry(leaf);
        nodes.reverse();
        ConcretePath {
            context,
            nodes,
            leaf,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Survey the frontier of `root`'s subtree restricted to `context`.
///
/// The caller must have checked that `root` itself is in the context.
/// Sibling traversal order does not matter: every frontier node is visited
/// exactly once, and the outputs are returned sorted by arena index.
pub(crate) fn collect_root(
    forest: &SpecializationForest,
    root: NodeIndex,
    context: &ContextId,
) -> RootCollection {
    let mut collection = RootCollection::default();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        let node = forest.node(index);
        let qualifying: Vec<NodeIndex> = node
            .children
            .iter()
            .copied()
            .filter(|&child| forest.node(child).in_context(context))
            .collect();
        if qualifying.is_empty() {
            if node.is_abstract {
                collection.abstract_tails.push(index);
            } else {
                collection.leaves.push(index);
            }
        } else {
            stack.extend(qualifying);
        }
    }
    collection.leaves.sort_unstable();
    collection.abstract_tails.sort_unstable();
    collection
}
