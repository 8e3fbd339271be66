//! Type registration and the specialization forest.
//!
//! Intake turns the discovery catalog into an arena-backed forest of
//! contract types. Nodes are appended parent-before-child, so every parent
//! index is smaller than all of its children's indices; downstream passes
//! lean on that order for single-scan traversals.

use crate::catalog::{CandidateKind, CandidateType, ContextDirective, Discovery, TypeCatalog};
use crate::diagnostics::ResolutionWarning;
use crate::dispatch::{ContextDispatcher, NullDispatcher};
use crate::error::IntakeError;
use crate::resolve::{self, Resolution};
use crate::types::{ContextId, NodeIndex, TypeName};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

/// One class in the specialization forest.
#[derive(Debug, Clone)]
pub struct SpecializationNode {
    pub name: TypeName,
    pub is_abstract: bool,
    /// Index of the generalization node, `None` for forest roots.
    pub parent: Option<NodeIndex>,
    /// Direct specializations, in registration order.
    pub children: Vec<NodeIndex>,
    /// Contract interfaces declared directly on this type.
    pub declared_interfaces: BTreeSet<TypeName>,
    /// Effective context set. Registration seeds it from inheritance and
    /// directives; propagation later unions descendant sets into it.
    pub contexts: BTreeSet<ContextId>,
}

impl SpecializationNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn in_context(&self, context: &ContextId) -> bool {
        self.contexts.contains(context)
    }
}

/// Arena of specialization nodes plus the root list and a name index.
#[derive(Debug, Clone, Default)]
pub struct SpecializationForest {
    nodes: Vec<SpecializationNode>,
    roots: Vec<NodeIndex>,
    node_of: HashMap<TypeName, NodeIndex>,
}

impl SpecializationForest {
    pub fn node(&self, index: NodeIndex) -> &SpecializationNode {
        &self.nodes[index]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut SpecializationNode {
        &mut self.nodes[index]
    }

    /// Forest roots in registration order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.node_of.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&SpecializationNode> {
        self.index_of(name).map(|at| self.node(at))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_of.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes paired with their arena indices, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &SpecializationNode)> {
        self.nodes.iter().enumerate()
    }

    /// Walks parent links from `start` up to its root, inclusive.
    pub fn ancestry(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn push(&mut self, node: SpecializationNode) -> NodeIndex {
        let index = self.nodes.len();
        self.node_of.insert(node.name.clone(), index);
        match node.parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }
        self.nodes.push(node);
        index
    }
}

/// Collects candidate classes into a [`SpecializationForest`].
///
/// The registry is consumed by [`Registry::resolve`], which makes the
/// finalize step a compile-time one-shot: once resolved, no further
/// registration is possible.
pub struct Registry {
    catalog: TypeCatalog,
    forest: SpecializationForest,
    seen: HashSet<TypeName>,
    dispatcher: Box<dyn ContextDispatcher>,
    warnings: Vec<ResolutionWarning>,
}

impl Registry {
    pub fn new(catalog: TypeCatalog) -> Self {
        Registry {
            catalog,
            forest: SpecializationForest::default(),
            seen: HashSet::new(),
            dispatcher: Box::new(NullDispatcher),
            warnings: Vec::new(),
        }
    }

    /// Build a registry by pulling the catalog from a discovery source.
    pub fn from_discovery(source: &impl Discovery) -> Self {
        Registry::new(source.discover())
    }

    pub fn with_dispatcher(mut self, dispatcher: impl ContextDispatcher + 'static) -> Self {
        self.dispatcher = Box::new(dispatcher);
        self
    }

    pub fn forest(&self) -> &SpecializationForest {
        &self.forest
    }

    /// Register every class candidate in the catalog, in catalog order.
    #[instrument(skip(self), fields(candidates = self.catalog.len()))]
    pub fn register(&mut self) -> Result<(), IntakeError> {
        let classes: Vec<CandidateType> = self
            .catalog
            .iter()
            .filter(|candidate| candidate.kind == CandidateKind::Class)
            .cloned()
            .collect();
        for candidate in &classes {
            self.register_internal(candidate)?;
        }
        debug!(
            nodes = self.forest.len(),
            roots = self.forest.roots().len(),
            "registration complete"
        );
        Ok(())
    }

    /// Register a single candidate class. Interfaces are rejected; bulk
    /// intake filters them out instead of calling this.
    pub fn register_one(&mut self, candidate: &CandidateType) -> Result<(), IntakeError> {
        if candidate.kind == CandidateKind::Interface {
            return Err(IntakeError::NotAClass(candidate.name.clone()));
        }
        self.register_internal(candidate)
    }

    /// Run the resolution passes over the registered forest.
    ///
    /// Consumes the registry, so resolution happens exactly once.
    pub fn resolve(self) -> Resolution {
        resolve::run(self.forest, self.warnings)
    }

    /// Idempotent intake core. Empty names are rejected up front, before
    /// any node is created, so the boundary also holds for names reached
    /// through a generalization link.
    fn register_internal(&mut self, candidate: &CandidateType) -> Result<(), IntakeError> {
        if candidate.name.is_empty() {
            return Err(IntakeError::EmptyTypeName);
        }
        if self.seen.contains(&candidate.name) {
            return Ok(());
        }
        // Mark before recursing so a malformed generalization cycle
        // terminates instead of overflowing.
        self.seen.insert(candidate.name.clone());

        let parent = self.resolve_parent(candidate)?;
        if !self.classify(candidate, parent) {
            return Ok(());
        }

        let mut contexts = self.effective_contexts(candidate, parent);
        self.dispatcher.dispatch(&candidate.name, &mut contexts);
        debug!(
            type_name = %candidate.name,
            parent = parent.map(|at| self.forest.node(at).name.as_str()),
            contexts = contexts.len(),
            "registered specialization node"
        );

        self.forest.push(SpecializationNode {
            name: candidate.name.clone(),
            is_abstract: candidate.is_abstract,
            parent,
            children: Vec::new(),
            declared_interfaces: candidate.interfaces.clone(),
            contexts,
        });
        Ok(())
    }

    /// Register the generalization first and return its node index.
    ///
    /// `None` means the candidate starts a new tree: it has no
    /// generalization, the generalization is not a known class, or the
    /// generalization turned out not to be a contract type.
    fn resolve_parent(
        &mut self,
        candidate: &CandidateType,
    ) -> Result<Option<NodeIndex>, IntakeError> {
        let Some(parent_name) = candidate.generalization.as_deref() else {
            return Ok(None);
        };
        match self.catalog.get(parent_name).cloned() {
            Some(parent) if parent.kind == CandidateKind::Class => {
                self.register_internal(&parent)?;
                Ok(self.forest.index_of(parent_name))
            }
            _ => {
                self.warnings.push(ResolutionWarning::UnknownGeneralization {
                    type_name: candidate.name.clone(),
                    generalization: parent_name.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// A type joins the forest when it specializes a contract type, carries
    /// the contract marker itself, or the dispatcher claims it.
    fn classify(&self, candidate: &CandidateType, parent: Option<NodeIndex>) -> bool {
        parent.is_some() || candidate.contract_marker || self.dispatcher.classify(candidate)
    }

    /// Seed the context set: inherit from the parent (roots get the default
    /// context), apply every addition, then every removal. Removal beats
    /// addition regardless of declaration order. The dispatcher gets the
    /// final say afterwards, in `register_internal`.
    fn effective_contexts(
        &self,
        candidate: &CandidateType,
        parent: Option<NodeIndex>,
    ) -> BTreeSet<ContextId> {
        let mut contexts = match parent {
            Some(at) => self.forest.node(at).contexts.clone(),
            None => BTreeSet::from([ContextId::Default]),
        };
        for directive in &candidate.directives {
            if let ContextDirective::Add(name) = directive {
                contexts.insert(ContextId::named(name));
            }
        }
        for directive in &candidate.directives {
            if let ContextDirective::Remove(name) = directive {
                contexts.remove(&ContextId::named(name));
            }
        }
        contexts
    }

    #[cfg(test)]
    pub(crate) fn into_parts(self) -> (SpecializationForest, Vec<ResolutionWarning>) {
        (self.forest, self.warnings)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("catalog", &self.catalog.len())
            .field("forest", &self.forest.len())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}
