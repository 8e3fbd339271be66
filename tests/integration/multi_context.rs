//! Multi-context resolution behavior

use canopy::catalog::{CandidateType, ContextDirective, TypeCatalog};
use canopy::registry::Registry;
use canopy::resolve::Resolution;
use canopy::types::ContextId;

fn resolve(candidates: Vec<CandidateType>) -> Resolution {
    let catalog: TypeCatalog = candidates.into_iter().collect();
    let mut registry = Registry::new(catalog);
    registry.register().unwrap();
    registry.resolve()
}

fn add(context: &str) -> ContextDirective {
    ContextDirective::Add(context.to_string())
}

fn remove(context: &str) -> ContextDirective {
    ContextDirective::Remove(context.to_string())
}

/// Test that each context resolves its own leaf for the same root
#[test]
fn test_contexts_resolve_independently() {
    let resolution = resolve(vec![
        CandidateType::abstract_class("Report").with_contract_marker(),
        CandidateType::class("ScreenReport").with_generalization("Report"),
        CandidateType::class("PrintReport")
            .with_generalization("ScreenReport")
            .with_directive(add("Print"))
            .with_directive(remove("Default")),
    ]);

    assert!(!resolution.report.has_fatal_error());
    let default = resolution.map.default_context();
    assert_eq!(default.to_leaf("Report"), Some("ScreenReport"));

    let print = resolution.map.find_context("Print").unwrap();
    assert_eq!(print.to_leaf("Report"), Some("PrintReport"));
    assert_eq!(print.to_leaf("ScreenReport"), Some("PrintReport"));
}

/// Test that a leaf's context keeps its whole ancestry queryable there
#[test]
fn test_ancestors_follow_descendants_into_contexts() {
    let resolution = resolve(vec![
        CandidateType::abstract_class("Exporter").with_contract_marker(),
        CandidateType::class("CsvExporter")
            .with_generalization("Exporter")
            .with_directive(add("Batch")),
    ]);

    let batch = resolution.map.find_context("Batch").unwrap();
    assert!(batch.is_member("Exporter"));
    assert_eq!(batch.to_leaf("Exporter"), Some("CsvExporter"));
}

/// Test that context lookup is case-sensitive and never creates a context
#[test]
fn test_context_names_are_case_sensitive() {
    let resolution = resolve(vec![CandidateType::class("Widget")
        .with_contract_marker()
        .with_directive(add("Print"))]);

    assert!(resolution.map.find_context("Print").is_some());
    assert!(resolution.map.find_context("print").is_none());
    assert_eq!(resolution.map.context_count(), 2);
    // The failed lookup must not have created anything
    assert_eq!(resolution.map.context_count(), 2);
}

/// Test that enumeration yields the default context first, named contexts
/// in name order
#[test]
fn test_context_enumeration_order() {
    let resolution = resolve(vec![CandidateType::class("Widget")
        .with_contract_marker()
        .with_directive(add("Zeta"))
        .with_directive(add("Alpha"))]);

    let order: Vec<String> = resolution
        .map
        .contexts()
        .map(|map| map.context().to_string())
        .collect();
    assert_eq!(order, vec!["Default", "Alpha", "Zeta"]);
}

/// Test that adding the default context by its canonical name is a no-op
/// rather than a second context
#[test]
fn test_default_spelling_folds_into_the_default_context() {
    let resolution = resolve(vec![CandidateType::class("Widget")
        .with_contract_marker()
        .with_directive(add("Default"))]);

    assert_eq!(resolution.map.context_count(), 1);
    assert_eq!(
        resolution.map.default_context().to_leaf("Widget"),
        Some("Widget")
    );
}

/// Test that a type removed from every context stays in the forest but
/// matches nowhere
#[test]
fn test_type_with_empty_context_set_maps_nowhere() {
    let resolution = resolve(vec![
        CandidateType::class("Ghost")
            .with_contract_marker()
            .with_directive(remove("Default")),
        CandidateType::class("Widget").with_contract_marker(),
    ]);

    assert!(!resolution.report.has_fatal_error());
    let default = resolution.map.default_context();
    assert!(default.to_leaf("Ghost").is_none());
    assert!(!default.is_member("Ghost"));
    assert_eq!(default.to_leaf("Widget"), Some("Widget"));
}

/// Test that a removal low in the chain moves that context's frontier up
#[test]
fn test_removal_moves_the_frontier_up() {
    let resolution = resolve(vec![
        CandidateType::abstract_class("Codec").with_contract_marker(),
        CandidateType::class("FastCodec").with_generalization("Codec"),
        CandidateType::class("DebugCodec")
            .with_generalization("FastCodec")
            .with_directive(add("Debug"))
            .with_directive(remove("Default")),
    ]);

    let default = resolution.map.default_context();
    assert_eq!(default.to_leaf("Codec"), Some("FastCodec"));

    let debug = resolution.map.find_context("Debug").unwrap();
    assert_eq!(debug.to_leaf("Codec"), Some("DebugCodec"));
}

/// Test that per-context summaries count members, mappings and paths
#[test]
fn test_summaries_count_per_context() {
    let resolution = resolve(vec![
        CandidateType::abstract_class("Shape").with_contract_marker(),
        CandidateType::class("Circle").with_generalization("Shape"),
    ]);

    let summary = resolution
        .report
        .summaries
        .iter()
        .find(|s| s.context == ContextId::Default)
        .unwrap();
    assert_eq!(summary.members, 2);
    // Shape and Circle both map to Circle
    assert_eq!(summary.mappings, 2);
    assert_eq!(summary.paths, 1);
}

/// Test that a context introduced in the middle of a chain restricts the
/// walk to nodes actually present in it
#[test]
fn test_context_restricted_walk_skips_absent_branches() {
    let resolution = resolve(vec![
        CandidateType::abstract_class("Store").with_contract_marker(),
        CandidateType::class("DiskStore").with_generalization("Store"),
        CandidateType::class("CloudStore")
            .with_generalization("Store")
            .with_directive(add("Hosted"))
            .with_directive(remove("Default")),
    ]);

    // Default sees only DiskStore, Hosted only CloudStore: no ambiguity
    assert!(!resolution.report.has_fatal_error());
    assert_eq!(
        resolution.map.default_context().to_leaf("Store"),
        Some("DiskStore")
    );
    assert_eq!(
        resolution.map.find_context("Hosted").unwrap().to_leaf("Store"),
        Some("CloudStore")
    );
}
