//! Error types for the canopy resolver.
//!
//! The resolution pass itself never fails for data-shape problems found while
//! the algorithm runs; those accumulate in the resolution report and the
//! caller checks `has_fatal_error`. The types here cover the call boundaries:
//! intake contract violations, configuration problems, and the record merger.

use thiserror::Error;

/// Call-boundary violations during intake.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Candidate type name is empty")]
    EmptyTypeName,

    #[error("Not a class type: {0}")]
    NotAClass(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The same type was explicitly assigned different context lists by two
    /// configuration sources. Malformed directives fail intake outright
    /// instead of accumulating in the report.
    #[error(
        "Conflicting context assignment for {type_name}: \
         {first_source} assigns {first:?}, {second_source} assigns {second:?}"
    )]
    ConflictingAssignment {
        type_name: String,
        first_source: String,
        first: Vec<String>,
        second_source: String,
        second: Vec<String>,
    },
}

/// Fatal conditions raised by the record-type merger.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Record interface {interface} reaches unrelated roots {first} and {second}")]
    DivergingRoots {
        interface: String,
        first: String,
        second: String,
    },

    #[error(
        "Property {property} is declared as {first_type} by {first} \
         but as {second_type} by {second}"
    )]
    PropertyTypeConflict {
        property: String,
        first: String,
        first_type: String,
        second: String,
        second_type: String,
    },

    #[error("Record interface {interface} lists unknown base {base}")]
    UnknownBase { interface: String, base: String },

    #[error("Record interface {interface} participates in a base-interface cycle")]
    CyclicBases { interface: String },
}
