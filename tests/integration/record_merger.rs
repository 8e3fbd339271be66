//! Record-type merger behavior over the public API

use canopy::catalog::{CandidateType, TypeCatalog};
use canopy::error::MergeError;
use canopy::merger::{merge, RecordInterface};
use canopy::registry::Registry;

/// Test that a marker hierarchy under one root merges into a single record
/// with the union of all properties
#[test]
fn test_hierarchy_merges_into_one_record() {
    let factory = merge(&[
        RecordInterface::new("IEntity").with_property("Id", "int"),
        RecordInterface::new("ICustomer")
            .with_base("IEntity")
            .with_property("Name", "string"),
        RecordInterface::new("IOrder")
            .with_base("IEntity")
            .with_property("Total", "decimal"),
    ])
    .unwrap();

    assert_eq!(factory.len(), 1);
    let record = factory.implementor_of("IOrder").unwrap();
    assert_eq!(record.root, "IEntity");
    assert_eq!(record.implementation, "IEntityImpl");
    let properties: Vec<&str> = record.properties.keys().map(String::as_str).collect();
    assert_eq!(properties, vec!["Id", "Name", "Total"]);
}

/// Test that every interface in a merged set resolves to the same record
#[test]
fn test_factory_exposes_one_accessor_per_interface() {
    let factory = merge(&[
        RecordInterface::new("IEntity"),
        RecordInterface::new("ICustomer").with_base("IEntity"),
    ])
    .unwrap();

    let via_root = factory.implementor_of("IEntity").unwrap();
    let via_leaf = factory.implementor_of("ICustomer").unwrap();
    assert_eq!(via_root, via_leaf);
    assert!(factory.implementor_of("IUnknown").is_none());
}

/// Test that reaching two unrelated roots is fatal
#[test]
fn test_diverging_roots_abort_the_merge() {
    let err = merge(&[
        RecordInterface::new("ICustomer"),
        RecordInterface::new("IOrder"),
        RecordInterface::new("IBridge")
            .with_base("ICustomer")
            .with_base("IOrder"),
    ])
    .unwrap_err();

    match err {
        MergeError::DivergingRoots {
            interface,
            first,
            second,
        } => {
            assert_eq!(interface, "IBridge");
            assert_ne!(first, second);
        }
        other => panic!("expected diverging roots, got {other:?}"),
    }
}

/// Test that a property declared with two different types is fatal
#[test]
fn test_property_type_conflicts_abort_the_merge() {
    let err = merge(&[
        RecordInterface::new("IEntity").with_property("Created", "DateTime"),
        RecordInterface::new("IAudited")
            .with_base("IEntity")
            .with_property("Created", "string"),
    ])
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Created"));
    assert!(message.contains("DateTime"));
    assert!(message.contains("string"));
}

/// Test that merged records ride along with a resolution
#[test]
fn test_records_attach_to_a_resolution() {
    let catalog: TypeCatalog =
        vec![CandidateType::class("Widget").with_contract_marker()]
            .into_iter()
            .collect();
    let mut registry = Registry::new(catalog);
    registry.register().unwrap();

    let factory = merge(&[RecordInterface::new("IWidgetData").with_property("Label", "string")])
        .unwrap();
    let resolution = registry.resolve().with_records(factory);

    assert_eq!(resolution.map.default_context().to_leaf("Widget"), Some("Widget"));
    let records = resolution.records.unwrap();
    assert_eq!(
        records.implementor_of("IWidgetData").unwrap().implementation,
        "IWidgetDataImpl"
    );
}
