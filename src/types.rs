//! Core identifiers shared across intake, resolution, and the result maps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified type name. Identity for candidate types and the dedup key
/// at intake; treated as an opaque, case-sensitive string everywhere.
pub type TypeName = String;

/// Index of a specialization node in the registry arena.
pub type NodeIndex = usize;

/// Canonical spelling of the default context.
pub const DEFAULT_CONTEXT_NAME: &str = "Default";

/// A deployment context identifier.
///
/// Context names are opaque and case-sensitive. The distinguished default
/// context is its own variant; the canonical spelling `"Default"` normalizes
/// to that variant, so exactly one representation exists and the two can
/// never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContextId {
    /// The implicit context every root belongs to unless explicitly removed.
    Default,
    /// An explicitly named context.
    Named(String),
}

impl ContextId {
    /// Build a context identifier from a name, folding the canonical default
    /// spelling into the `Default` variant.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == DEFAULT_CONTEXT_NAME {
            ContextId::Default
        } else {
            ContextId::Named(name)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContextId::Default => DEFAULT_CONTEXT_NAME,
            ContextId::Named(name) => name,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ContextId::Default)
    }
}

impl From<String> for ContextId {
    fn from(name: String) -> Self {
        ContextId::named(name)
    }
}

impl From<&str> for ContextId {
    fn from(name: &str) -> Self {
        ContextId::named(name)
    }
}

impl From<ContextId> for String {
    fn from(context: ContextId) -> Self {
        context.as_str().to_string()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
