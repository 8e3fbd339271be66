//! Candidate-type intake model.
//!
//! The discovery collaborator produces a finite, ordered stream of candidate
//! types; the catalog holds that stream and answers by-name lookups so the
//! registry can register generalizations before their specializations.
//! Discovery itself (scanning component archives, reading manifests) is a
//! strictly prior step and lives outside this crate.

use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Whether a candidate is a class or an interface.
///
/// Only classes participate in the specialization forest; handing an
/// interface to single-type registration is a caller error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    #[default]
    Class,
    Interface,
}

/// An add/remove context directive declared on a candidate type.
///
/// Directives apply only to the node that declares them; they are never
/// re-applied from ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextDirective {
    Add(String),
    Remove(String),
}

/// One candidate type produced by discovery.
///
/// Identity is the fully-qualified `name`; everything else is payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateType {
    pub name: TypeName,

    #[serde(default)]
    pub kind: CandidateKind,

    /// Fully-qualified name of the generalization (single inheritance), if
    /// the type has one below the universal base.
    #[serde(default)]
    pub generalization: Option<TypeName>,

    #[serde(default)]
    pub is_abstract: bool,

    /// Declared context directives, in declaration order.
    #[serde(default)]
    pub directives: Vec<ContextDirective>,

    /// Contract-marker interfaces implemented directly on this type.
    #[serde(default)]
    pub interfaces: BTreeSet<TypeName>,

    /// True when the type statically exposes the contract marker itself.
    #[serde(default)]
    pub contract_marker: bool,
}

impl CandidateType {
    /// A concrete class candidate with no generalization and no payload.
    pub fn class(name: impl Into<TypeName>) -> Self {
        CandidateType {
            name: name.into(),
            kind: CandidateKind::Class,
            generalization: None,
            is_abstract: false,
            directives: Vec::new(),
            interfaces: BTreeSet::new(),
            contract_marker: false,
        }
    }

    /// An abstract class candidate.
    pub fn abstract_class(name: impl Into<TypeName>) -> Self {
        let mut candidate = Self::class(name);
        candidate.is_abstract = true;
        candidate
    }

    /// An interface candidate (never registered; carried for completeness of
    /// the discovery stream).
    pub fn interface(name: impl Into<TypeName>) -> Self {
        let mut candidate = Self::class(name);
        candidate.kind = CandidateKind::Interface;
        candidate
    }

    pub fn with_generalization(mut self, parent: impl Into<TypeName>) -> Self {
        self.generalization = Some(parent.into());
        self
    }

    pub fn with_contract_marker(mut self) -> Self {
        self.contract_marker = true;
        self
    }

    pub fn with_interface(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    pub fn with_directive(mut self, directive: ContextDirective) -> Self {
        self.directives.push(directive);
        self
    }
}

/// The discovery output: an ordered, name-deduplicated set of candidates.
///
/// Insertion order is preserved; it determines registration order and with it
/// the arena layout, so equal catalogs always produce equal resolutions.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    order: Vec<CandidateType>,
    index: HashMap<TypeName, usize>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        TypeCatalog::default()
    }

    /// Insert a candidate. The first candidate wins for a repeated name;
    /// later duplicates are ignored and `false` is returned.
    pub fn insert(&mut self, candidate: CandidateType) -> bool {
        if self.index.contains_key(&candidate.name) {
            return false;
        }
        self.index.insert(candidate.name.clone(), self.order.len());
        self.order.push(candidate);
        true
    }

    pub fn get(&self, name: &str) -> Option<&CandidateType> {
        self.index.get(name).map(|&at| &self.order[at])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateType> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<CandidateType> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = CandidateType>>(candidates: I) -> Self {
        let mut catalog = TypeCatalog::new();
        for candidate in candidates {
            catalog.insert(candidate);
        }
        catalog
    }
}

/// Upstream discovery collaborator.
///
/// Implementations enumerate candidate types from wherever they live; the
/// resolver only ever sees the resulting catalog.
pub trait Discovery {
    fn discover(&self) -> TypeCatalog;
}

impl Discovery for TypeCatalog {
    fn discover(&self) -> TypeCatalog {
        self.clone()
    }
}

impl Discovery for Vec<CandidateType> {
    fn discover(&self) -> TypeCatalog {
        self.iter().cloned().collect()
    }
}
