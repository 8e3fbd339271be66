//! The resolution pipeline.
//!
//! Runs once over a finished registry: close contexts over descendants,
//! survey every (root, context) subtree for its deepest concrete leaf, bind
//! interfaces along accepted paths, then assemble the per-context maps and
//! the diagnostics report. Ambiguities are accumulated, never resolved by
//! priority, so one run reports every conflict it can find.

pub(crate) mod collect;
pub(crate) mod interfaces;
pub(crate) mod propagate;

pub use collect::ConcretePath;

use crate::diagnostics::{self, ContextSummary, ResolutionReport, ResolutionWarning};
use crate::map::{ContextMapBuilder, ContextTypeMap, MultiContextMap};
use crate::merger::RecordFactory;
use crate::registry::SpecializationForest;
use crate::types::ContextId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Output of one resolution run: the queryable map plus the full report.
///
/// The report travels with the map so no caller can consume mappings while
/// ignoring a fatal ambiguity.
#[derive(Debug)]
pub struct Resolution {
    pub map: MultiContextMap,
    pub report: ResolutionReport,
    /// Merged record-type factory, present when the host ran the merger.
    pub records: Option<RecordFactory>,
}

impl Resolution {
    pub fn with_records(mut self, records: RecordFactory) -> Self {
        self.records = Some(records);
        self
    }
}

#[instrument(skip(forest, warnings), fields(nodes = forest.len(), roots = forest.roots().len()))]
pub(crate) fn run(
    mut forest: SpecializationForest,
    mut warnings: Vec<ResolutionWarning>,
) -> Resolution {
    let start = Instant::now();
    info!("Starting contract resolution");

    // Step 1: Close every node's context set over its descendants
    propagate::propagate_contexts(&mut forest);

    let forest = Arc::new(forest);
    let own = interfaces::OwnInterfaces::compute(&forest);

    // Step 2: One accumulator per discovered context; Default always exists
    let mut builders: BTreeMap<ContextId, ContextMapBuilder> = BTreeMap::new();
    builders.insert(
        ContextId::Default,
        ContextMapBuilder::new(ContextId::Default, Arc::clone(&forest)),
    );
    for (_, node) in forest.iter() {
        for context in &node.contexts {
            builders.entry(context.clone()).or_insert_with(|| {
                ContextMapBuilder::new(context.clone(), Arc::clone(&forest))
            });
        }
    }

    // Step 3: Register every node in each of its contexts
    for (index, node) in forest.iter() {
        for context in &node.contexts {
            if let Some(builder) = builders.get_mut(context) {
                builder.register_member(index);
            }
        }
    }

    // Step 4: Survey every (root, context) subtree
    let contexts: Vec<ContextId> = builders.keys().cloned().collect();
    for &root in forest.roots() {
        for context in &contexts {
            if !forest.node(root).in_context(context) {
                continue;
            }
            let Some(builder) = builders.get_mut(context) else {
                continue;
            };
            let collection = collect::collect_root(&forest, root, context);
            debug!(
                root = %forest.node(root).name,
                context = %context,
                leaves = collection.leaves.len(),
                abstract_tails = collection.abstract_tails.len(),
                "collected subtree frontier"
            );
            for &tail in &collection.abstract_tails {
                builder.record_tail(root, tail);
            }
            match collection.leaves.as_slice() {
                [] => {}
                [leaf] => {
                    let path = ConcretePath::to_leaf(&forest, context.clone(), *leaf);
                    builder.accept_path(&own, path);
                }
                leaves => builder.record_class_ambiguity(root, leaves),
            }
        }
    }

    // Step 5: Finish the per-context maps and pool their findings
    let mut default_map = ContextTypeMap::empty(ContextId::Default, Arc::clone(&forest));
    let mut named = BTreeMap::new();
    let mut summaries = Vec::new();
    let mut class_ambiguities = Vec::new();
    let mut interface_ambiguities = Vec::new();
    let mut abstract_tails = Vec::new();
    for (context, builder) in builders {
        let (map, findings) = builder.finish();
        summaries.push(ContextSummary {
            context: map.context().clone(),
            members: map.member_count(),
            mappings: map.mapping_count(),
            paths: map.path_count(),
        });
        class_ambiguities.extend(findings.class_ambiguities);
        interface_ambiguities.extend(findings.interface_ambiguities);
        abstract_tails.extend(findings.abstract_tails);
        if context.is_default() {
            default_map = map;
        } else {
            named.insert(context, map);
        }
    }

    // Step 6: Sort finding lists so shuffled intake yields identical reports
    class_ambiguities.sort();
    interface_ambiguities.sort();
    abstract_tails.sort();
    warnings.sort();

    if !class_ambiguities.is_empty() || !interface_ambiguities.is_empty() {
        warn!(
            class_ambiguities = class_ambiguities.len(),
            interface_ambiguities = interface_ambiguities.len(),
            "resolution produced fatal ambiguities"
        );
    }

    let report = ResolutionReport {
        generated_at: diagnostics::timestamp_now(),
        summaries,
        class_ambiguities,
        interface_ambiguities,
        abstract_tails,
        warnings,
    };
    let map = MultiContextMap::new(Arc::clone(&forest), default_map, named);

    let duration = start.elapsed();
    info!(
        contexts = map.context_count(),
        fatal = report.has_fatal_error(),
        duration_ms = duration.as_millis(),
        "Contract resolution completed"
    );

    Resolution {
        map,
        report,
        records: None,
    }
}
