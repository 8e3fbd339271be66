//! Context closure over the specialization forest.

use crate::registry::SpecializationForest;
use crate::types::ContextId;
use tracing::trace;

/// Union every node's context set into all of its ancestors, so a general
/// type stays relevant in any context one of its specializations needs.
///
/// The arena appends parents before children, so one reverse index scan is a
/// post-order traversal: by the time a node is visited, every descendant has
/// already folded its contexts into its own parent. Idempotent; a second run
/// changes nothing.
pub(crate) fn propagate_contexts(forest: &mut SpecializationForest) {
    for index in (0..forest.len()).rev() {
        let node = forest.node(index);
        let Some(parent) = node.parent else {
            continue;
        };
        let contexts: Vec<ContextId> = node.contexts.iter().cloned().collect();
        trace!(
            node = %node.name,
            contexts = contexts.len(),
            "folding contexts into generalization"
        );
        forest.node_mut(parent).contexts.extend(contexts);
    }
}
