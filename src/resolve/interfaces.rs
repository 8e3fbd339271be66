//! Interface introduction and per-context binding.

use crate::registry::SpecializationForest;
use crate::resolve::collect::ConcretePath;
use crate::types::{NodeIndex, TypeName};
use std::collections::{BTreeMap, BTreeSet};

/// Side table of introduced-interface sets, keyed by arena index.
///
/// A node owns the interfaces declared on it that its generalization does
/// not already expose. Computed in one forward scan over the arena; the
/// parent-before-child ordering guarantees a parent's exposure is complete
/// when its children are visited.
#[derive(Debug)]
pub(crate) struct OwnInterfaces {
    own: Vec<BTreeSet<TypeName>>,
}

impl OwnInterfaces {
    pub(crate) fn compute(forest: &SpecializationForest) -> Self {
        let mut own = Vec::with_capacity(forest.len());
        // Running union of everything visible per node, scan-local.
        let mut exposed: Vec<BTreeSet<TypeName>> = Vec::with_capacity(forest.len());
        for (_, node) in forest.iter() {
            let inherited = match node.parent {
                Some(parent) => exposed[parent].clone(),
                None => BTreeSet::new(),
            };
            let introduced: BTreeSet<TypeName> = node
                .declared_interfaces
                .difference(&inherited)
                .cloned()
                .collect();
            let mut all = inherited;
            all.extend(introduced.iter().cloned());
            own.push(introduced);
            exposed.push(all);
        }
        OwnInterfaces { own }
    }

    /// Interfaces first introduced at this node.
    pub(crate) fn own(&self, index: NodeIndex) -> &BTreeSet<TypeName> {
        &self.own[index]
    }
}

/// Interface bindings accumulated for one context.
///
/// The first binding for an interface is kept; a later path binding the
/// same interface to a different leaf turns into an ambiguity that keeps
/// accumulating offenders, but never replaces the original binding.
#[derive(Debug, Default)]
pub(crate) struct InterfaceBindings {
    pub to_leaf: BTreeMap<TypeName, TypeName>,
    pub introducer: BTreeMap<TypeName, TypeName>,
    pub conflicts: BTreeMap<TypeName, BTreeSet<TypeName>>,
}

impl InterfaceBindings {
    /// Bind every interface introduced along `path` to the path's leaf.
    pub(crate) fn bind(
        &mut self,
        forest: &SpecializationForest,
        own: &OwnInterfaces,
        path: &ConcretePath,
    ) {
        let leaf_name = forest.node(path.leaf).name.clone();
        for &index in &path.nodes {
            let node = forest.node(index);
            for interface in own.own(index) {
                match self.to_leaf.get(interface) {
                    None => {
                        self.to_leaf.insert(interface.clone(), leaf_name.clone());
                        self.introducer.insert(interface.clone(), node.name.clone());
                    }
                    Some(bound) if bound == &leaf_name => {}
                    Some(bound) => {
                        let offenders = self.conflicts.entry(interface.clone()).or_default();
                        offenders.insert(bound.clone());
                        offenders.insert(leaf_name.clone());
                    }
                }
            }
        }
    }
}
