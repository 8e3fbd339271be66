//! Record-type merger.
//!
//! Pure-data marker interfaces travel the pipeline separately from the
//! class forest. Every interface resolves its base markers transitively to
//! a single ancestor root; all interfaces sharing one root are merged into a
//! single synthesized implementation whose property set is the union of
//! theirs. Same-named properties must agree exactly on their declared type.
//!
//! Unlike the resolver, the merger fails hard: a diverging root or a
//! property conflict returns an error instead of accumulating, because the
//! merged records feed type synthesis where a partial answer is useless.

use crate::error::MergeError;
use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// A pure-data marker interface: base markers plus typed properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInterface {
    pub name: TypeName,

    /// Base marker interfaces, resolved transitively during merging.
    #[serde(default)]
    pub bases: BTreeSet<TypeName>,

    /// Property name to declared type.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl RecordInterface {
    pub fn new(name: impl Into<TypeName>) -> Self {
        RecordInterface {
            name: name.into(),
            bases: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<TypeName>) -> Self {
        self.bases.insert(base.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.properties.insert(name.into(), ty.into());
        self
    }
}

/// One synthesized concrete type implementing every interface in its set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// The shared ancestor root interface.
    pub root: TypeName,
    /// Name of the synthesized implementation type.
    pub implementation: TypeName,
    /// Every interface merged into this record, the root included.
    pub interfaces: BTreeSet<TypeName>,
    /// Unified property set.
    pub properties: BTreeMap<String, String>,
}

/// Lookup surface over the merged records: one accessor per interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFactory {
    records: Vec<MergedRecord>,
    by_interface: BTreeMap<TypeName, usize>,
}

impl RecordFactory {
    /// The merged record implementing `interface`, if the interface was part
    /// of the merged set.
    pub fn implementor_of(&self, interface: &str) -> Option<&MergedRecord> {
        self.by_interface
            .get(interface)
            .map(|&at| &self.records[at])
    }

    /// Merged records in root-name order.
    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merge record interfaces into one synthesized implementation per root.
///
/// Duplicate interface names keep the first definition, matching catalog
/// intake. Groups are merged in root-name order and properties unified in
/// interface-name order, so equal inputs give equal factories.
#[instrument(skip(interfaces), fields(interfaces = interfaces.len()))]
pub fn merge(interfaces: &[RecordInterface]) -> Result<RecordFactory, MergeError> {
    let mut index: BTreeMap<&str, &RecordInterface> = BTreeMap::new();
    for iface in interfaces {
        index.entry(iface.name.as_str()).or_insert(iface);
    }

    // Step 1: Resolve every interface to its single ancestor root
    let mut memo: BTreeMap<TypeName, TypeName> = BTreeMap::new();
    let mut groups: BTreeMap<TypeName, BTreeSet<TypeName>> = BTreeMap::new();
    for iface in index.values() {
        let mut visiting = BTreeSet::new();
        let root = resolve_root(iface, &index, &mut memo, &mut visiting)?;
        groups.entry(root).or_default().insert(iface.name.clone());
    }

    // Step 2: Unify properties per group, in interface-name order
    let mut records = Vec::new();
    let mut by_interface = BTreeMap::new();
    for (root, members) in groups {
        let mut properties: BTreeMap<String, String> = BTreeMap::new();
        let mut declared_in: BTreeMap<String, TypeName> = BTreeMap::new();
        for member in &members {
            let Some(iface) = index.get(member.as_str()) else {
                continue;
            };
            for (property, ty) in &iface.properties {
                match properties.get(property) {
                    None => {
                        properties.insert(property.clone(), ty.clone());
                        declared_in.insert(property.clone(), member.clone());
                    }
                    Some(existing) if existing == ty => {}
                    Some(existing) => {
                        return Err(MergeError::PropertyTypeConflict {
                            property: property.clone(),
                            first: declared_in
                                .get(property)
                                .cloned()
                                .unwrap_or_else(|| root.clone()),
                            first_type: existing.clone(),
                            second: member.clone(),
                            second_type: ty.clone(),
                        });
                    }
                }
            }
        }
        debug!(
            root = %root,
            interfaces = members.len(),
            properties = properties.len(),
            "merged record group"
        );
        let record_at = records.len();
        for member in &members {
            by_interface.insert(member.clone(), record_at);
        }
        records.push(MergedRecord {
            implementation: format!("{root}Impl"),
            root,
            interfaces: members,
            properties,
        });
    }

    Ok(RecordFactory {
        records,
        by_interface,
    })
}

/// Follow base markers up to the root, memoized. An interface with no bases
/// is its own root; reaching two distinct roots is fatal.
fn resolve_root(
    iface: &RecordInterface,
    index: &BTreeMap<&str, &RecordInterface>,
    memo: &mut BTreeMap<TypeName, TypeName>,
    visiting: &mut BTreeSet<TypeName>,
) -> Result<TypeName, MergeError> {
    if let Some(root) = memo.get(&iface.name) {
        return Ok(root.clone());
    }
    if !visiting.insert(iface.name.clone()) {
        return Err(MergeError::CyclicBases {
            interface: iface.name.clone(),
        });
    }

    let mut root: Option<TypeName> = None;
    for base in &iface.bases {
        let base_iface = index.get(base.as_str()).ok_or_else(|| MergeError::UnknownBase {
            interface: iface.name.clone(),
            base: base.clone(),
        })?;
        let base_root = resolve_root(base_iface, index, memo, visiting)?;
        match &root {
            None => root = Some(base_root),
            Some(existing) if *existing == base_root => {}
            Some(existing) => {
                return Err(MergeError::DivergingRoots {
                    interface: iface.name.clone(),
                    first: existing.clone(),
                    second: base_root,
                });
            }
        }
    }

    visiting.remove(&iface.name);
    let root = root.unwrap_or_else(|| iface.name.clone());
    memo.insert(iface.name.clone(), root.clone());
    Ok(root)
}
