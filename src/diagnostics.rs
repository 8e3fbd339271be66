//! Diagnostic shapes produced by a resolution run.
//!
//! The resolver never throws for data-shape problems found during the
//! algorithm; everything lands in a [`ResolutionReport`] so one run can
//! surface every ambiguity at once. Callers gate downstream phases on
//! [`ResolutionReport::has_fatal_error`].

use crate::types::ContextId;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Two or more concrete leaves claimed the same root within one context.
/// Fatal: the root stays unmapped in that context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassAmbiguity {
    pub context: ContextId,
    pub root: String,
    /// The conflicting leaf types, all of them.
    pub leaves: BTreeSet<String>,
}

/// The same interface was introduced on paths that end in different leaves.
/// Fatal: the first binding is kept structurally but must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceAmbiguity {
    pub context: ContextId,
    pub interface: String,
    pub leaves: BTreeSet<String>,
}

/// A branch that ends abstract within a context, leaving nothing to choose.
/// A warning only; the root may still map through another branch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbstractTail {
    pub context: ContextId,
    pub root: String,
    pub tail: String,
}

/// Non-fatal observations from intake.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// A declared generalization was not in the catalog; the declaring type
    /// was registered as a root instead.
    UnknownGeneralization {
        type_name: String,
        generalization: String,
    },
}

/// Per-context counters for the report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub context: ContextId,
    /// Nodes registered in the context.
    pub members: usize,
    /// Types with a leaf mapping (classes and interfaces).
    pub mappings: usize,
    /// Accepted root→leaf paths.
    pub paths: usize,
}

/// Everything one resolution run wants to tell the caller.
///
/// Lists are sorted before the report is handed out, so equal inputs give
/// byte-equal reports regardless of traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// RFC 3339 timestamp of report assembly.
    pub generated_at: String,
    pub summaries: Vec<ContextSummary>,
    pub class_ambiguities: Vec<ClassAmbiguity>,
    pub interface_ambiguities: Vec<InterfaceAmbiguity>,
    pub abstract_tails: Vec<AbstractTail>,
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolutionReport {
    /// Any class or interface ambiguity makes the run fatal. Downstream
    /// phases must not start while this is true.
    pub fn has_fatal_error(&self) -> bool {
        !self.class_ambiguities.is_empty() || !self.interface_ambiguities.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_fatal_error() && self.abstract_tails.is_empty() && self.warnings.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution report ({})", self.generated_at)?;
        for summary in &self.summaries {
            writeln!(
                f,
                "  context {}: {} mappings, {} paths, {} members",
                summary.context, summary.mappings, summary.paths, summary.members
            )?;
        }
        for ambiguity in &self.class_ambiguities {
            writeln!(
                f,
                "  class ambiguity in {}: {} -> {{{}}}",
                ambiguity.context,
                ambiguity.root,
                join(&ambiguity.leaves)
            )?;
        }
        for ambiguity in &self.interface_ambiguities {
            writeln!(
                f,
                "  interface ambiguity in {}: {} -> {{{}}}",
                ambiguity.context,
                ambiguity.interface,
                join(&ambiguity.leaves)
            )?;
        }
        for tail in &self.abstract_tails {
            writeln!(
                f,
                "  abstract tail in {}: {} ends abstract at {}",
                tail.context, tail.root, tail.tail
            )?;
        }
        for warning in &self.warnings {
            match warning {
                ResolutionWarning::UnknownGeneralization {
                    type_name,
                    generalization,
                } => writeln!(
                    f,
                    "  warning: {} names unknown generalization {}",
                    type_name, generalization
                )?,
            }
        }
        Ok(())
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// RFC 3339 with millisecond precision, for report stamps.
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
