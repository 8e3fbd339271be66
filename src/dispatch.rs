//! Host-environment dispatch hooks.
//!
//! Registration consults a dispatcher at two points: once to classify a type
//! that carries no inherited or marker evidence of contract participation,
//! and once per newly created node, with the context set still mutable, so
//! the host can add or remove contexts programmatically. The default hooks
//! do nothing, which keeps the resolver self-contained in tests and simple
//! embeddings.

use crate::catalog::CandidateType;
use crate::types::ContextId;
use std::collections::{BTreeMap, BTreeSet};

/// Decides contract participation for unmarked roots and adjusts freshly
/// computed context sets.
pub trait ContextDispatcher {
    /// Whether an otherwise-unmarked candidate participates in contract
    /// resolution. Called only when neither an ancestor node nor the
    /// contract marker already settles the question.
    fn classify(&self, _candidate: &CandidateType) -> bool {
        false
    }

    /// Invoked once per newly created node, after directives have been
    /// applied and before the context set freezes.
    fn dispatch(&self, _type_name: &str, _contexts: &mut BTreeSet<ContextId>) {}
}

/// A dispatcher that never classifies anything and leaves contexts alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatcher;

impl ContextDispatcher for NullDispatcher {}

/// Dispatcher backed by explicit per-type assignments, typically loaded from
/// workspace configuration.
///
/// An assigned type is classified as a contract participant, and its
/// assigned contexts are added during dispatch. Dispatch runs after the
/// type's own directives, so an assignment survives a declared removal.
#[derive(Debug, Clone, Default)]
pub struct AssignmentDispatcher {
    assignments: BTreeMap<String, Vec<ContextId>>,
}

impl AssignmentDispatcher {
    pub fn new(assignments: BTreeMap<String, Vec<ContextId>>) -> Self {
        AssignmentDispatcher { assignments }
    }

    pub fn assignment(&self, type_name: &str) -> Option<&[ContextId]> {
        self.assignments.get(type_name).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl ContextDispatcher for AssignmentDispatcher {
    fn classify(&self, candidate: &CandidateType) -> bool {
        self.assignments.contains_key(&candidate.name)
    }

    fn dispatch(&self, type_name: &str, contexts: &mut BTreeSet<ContextId>) {
        if let Some(assigned) = self.assignments.get(type_name) {
            contexts.extend(assigned.iter().cloned());
        }
    }
}
