//! Per-context lookup maps and their multi-context owner.
//!
//! A [`ContextTypeMap`] answers the three downstream questions for one
//! context: which leaf implements a type, which node is the highest
//! implementor, and whether a type is mapped at all. The
//! [`MultiContextMap`] owns one map per discovered context and always
//! carries the default context, even for an empty forest.

use crate::diagnostics::{AbstractTail, ClassAmbiguity, InterfaceAmbiguity};
use crate::registry::{SpecializationForest, SpecializationNode};
use crate::resolve::collect::ConcretePath;
use crate::resolve::interfaces::{InterfaceBindings, OwnInterfaces};
use crate::types::{ContextId, NodeIndex, TypeName};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Immutable per-context resolution result.
#[derive(Debug)]
pub struct ContextTypeMap {
    context: ContextId,
    forest: Arc<SpecializationForest>,
    members: BTreeSet<NodeIndex>,
    class_to_leaf: BTreeMap<TypeName, TypeName>,
    iface_to_leaf: BTreeMap<TypeName, TypeName>,
    iface_to_introducer: BTreeMap<TypeName, TypeName>,
    /// Accepted paths, keyed by root type name.
    paths: BTreeMap<TypeName, ConcretePath>,
}

impl ContextTypeMap {
    pub(crate) fn empty(context: ContextId, forest: Arc<SpecializationForest>) -> Self {
        ContextTypeMap {
            context,
            forest,
            members: BTreeSet::new(),
            class_to_leaf: BTreeMap::new(),
            iface_to_leaf: BTreeMap::new(),
            iface_to_introducer: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// The leaf implementation for a class or interface, if one was chosen.
    pub fn to_leaf(&self, type_name: &str) -> Option<&str> {
        self.class_to_leaf
            .get(type_name)
            .or_else(|| self.iface_to_leaf.get(type_name))
            .map(String::as_str)
    }

    /// The highest implementor node for a query.
    ///
    /// For a mapped class, walks generalizations up from its leaf until the
    /// node carrying the queried name; for an interface, returns the node
    /// that introduced it.
    pub fn to_highest_impl(&self, type_name: &str) -> Option<&SpecializationNode> {
        if let Some(leaf_name) = self.class_to_leaf.get(type_name) {
            let mut current = self.forest.index_of(leaf_name)?;
            loop {
                let node = self.forest.node(current);
                if node.name == type_name {
                    return Some(node);
                }
                current = node.parent?;
            }
        }
        let introducer = self.iface_to_introducer.get(type_name)?;
        self.forest.get(introducer)
    }

    pub fn is_mapped(&self, type_name: &str) -> bool {
        self.class_to_leaf.contains_key(type_name) || self.iface_to_leaf.contains_key(type_name)
    }

    pub fn is_member(&self, type_name: &str) -> bool {
        self.forest
            .index_of(type_name)
            .is_some_and(|at| self.members.contains(&at))
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Mapped classes plus mapped interfaces.
    pub fn mapping_count(&self) -> usize {
        self.class_to_leaf.len() + self.iface_to_leaf.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn path_for(&self, root: &str) -> Option<&ConcretePath> {
        self.paths.get(root)
    }

    /// Mapped classes as (class, leaf) pairs, in name order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.class_to_leaf
            .iter()
            .map(|(class, leaf)| (class.as_str(), leaf.as_str()))
    }

    /// Mapped interfaces as (interface, leaf) pairs, in name order.
    pub fn interfaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iface_to_leaf
            .iter()
            .map(|(iface, leaf)| (iface.as_str(), leaf.as_str()))
    }
}

/// Owns every per-context map produced by a run.
#[derive(Debug)]
pub struct MultiContextMap {
    forest: Arc<SpecializationForest>,
    default: ContextTypeMap,
    named: BTreeMap<ContextId, ContextTypeMap>,
}

impl MultiContextMap {
    pub(crate) fn new(
        forest: Arc<SpecializationForest>,
        default: ContextTypeMap,
        named: BTreeMap<ContextId, ContextTypeMap>,
    ) -> Self {
        MultiContextMap {
            forest,
            default,
            named,
        }
    }

    /// The default context. Always present, possibly empty.
    pub fn default_context(&self) -> &ContextTypeMap {
        &self.default
    }

    /// Look up a context by name. Never creates one; the canonical default
    /// spelling resolves to the default context.
    pub fn find_context(&self, name: &str) -> Option<&ContextTypeMap> {
        let id = ContextId::named(name);
        if id.is_default() {
            Some(&self.default)
        } else {
            self.named.get(&id)
        }
    }

    /// Every context map, default first, named contexts in name order.
    pub fn contexts(&self) -> impl Iterator<Item = &ContextTypeMap> {
        std::iter::once(&self.default).chain(self.named.values())
    }

    pub fn context_count(&self) -> usize {
        1 + self.named.len()
    }

    pub fn forest(&self) -> &SpecializationForest {
        &self.forest
    }
}

/// Non-fatal and fatal findings collected while building one context map.
#[derive(Debug, Default)]
pub(crate) struct ContextFindings {
    pub class_ambiguities: Vec<ClassAmbiguity>,
    pub interface_ambiguities: Vec<InterfaceAmbiguity>,
    pub abstract_tails: Vec<AbstractTail>,
}

/// Accumulates one context's memberships, paths, and bindings.
pub(crate) struct ContextMapBuilder {
    context: ContextId,
    forest: Arc<SpecializationForest>,
    members: BTreeSet<NodeIndex>,
    class_to_leaf: BTreeMap<TypeName, TypeName>,
    paths: BTreeMap<TypeName, ConcretePath>,
    bindings: InterfaceBindings,
    class_ambiguities: Vec<ClassAmbiguity>,
    abstract_tails: Vec<AbstractTail>,
}

impl ContextMapBuilder {
    pub(crate) fn new(context: ContextId, forest: Arc<SpecializationForest>) -> Self {
        ContextMapBuilder {
            context,
            forest,
            members: BTreeSet::new(),
            class_to_leaf: BTreeMap::new(),
            paths: BTreeMap::new(),
            bindings: InterfaceBindings::default(),
            class_ambiguities: Vec::new(),
            abstract_tails: Vec::new(),
        }
    }

    pub(crate) fn register_member(&mut self, index: NodeIndex) {
        self.members.insert(index);
    }

    /// Accept a winning path: map every node on it to the leaf and bind the
    /// interfaces introduced along it.
    pub(crate) fn accept_path(&mut self, own: &OwnInterfaces, path: ConcretePath) {
        let leaf_name = self.forest.node(path.leaf).name.clone();
        for &index in &path.nodes {
            self.class_to_leaf
                .insert(self.forest.node(index).name.clone(), leaf_name.clone());
        }
        self.bindings.bind(&self.forest, own, &path);
        let root_name = self.forest.node(path.root()).name.clone();
        self.paths.insert(root_name, path);
    }

    pub(crate) fn record_tail(&mut self, root: NodeIndex, tail: NodeIndex) {
        self.abstract_tails.push(AbstractTail {
            context: self.context.clone(),
            root: self.forest.node(root).name.clone(),
            tail: self.forest.node(tail).name.clone(),
        });
    }

    pub(crate) fn record_class_ambiguity(&mut self, root: NodeIndex, leaves: &[NodeIndex]) {
        self.class_ambiguities.push(ClassAmbiguity {
            context: self.context.clone(),
            root: self.forest.node(root).name.clone(),
            leaves: leaves
                .iter()
                .map(|&at| self.forest.node(at).name.clone())
                .collect(),
        });
    }

    pub(crate) fn finish(self) -> (ContextTypeMap, ContextFindings) {
        let interface_ambiguities = self
            .bindings
            .conflicts
            .into_iter()
            .map(|(interface, leaves)| InterfaceAmbiguity {
                context: self.context.clone(),
                interface,
                leaves,
            })
            .collect();
        let map = ContextTypeMap {
            context: self.context,
            forest: self.forest,
            members: self.members,
            class_to_leaf: self.class_to_leaf,
            iface_to_leaf: self.bindings.to_leaf,
            iface_to_introducer: self.bindings.introducer,
            paths: self.paths,
        };
        let findings = ContextFindings {
            class_ambiguities: self.class_ambiguities,
            interface_ambiguities,
            abstract_tails: self.abstract_tails,
        };
        (map, findings)
    }
}
