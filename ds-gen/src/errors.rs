//! Error kinds raised while compiling a dictionary and synthesizing records.
use thiserror::Error;

/// Failures produced by the generator library.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// The entity definition is malformed or incomplete.
    #[error("schema error in entity type `{entity}`: {reason}")]
    Schema {
        /// Entity type that owns the defect.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A relationship (or a caller) names an entity type the dictionary does not define.
    #[error(
        "unknown entity type `{target}`{}",
        .referrer.as_ref().map(|r| format!(" linked from `{r}`")).unwrap_or_default()
    )]
    UnknownEntityType {
        /// The missing entity type.
        target: String,
        /// Entity type whose relationship points at it, when the lookup came from a link.
        referrer: Option<String>,
    },

    /// Required relationships form a cycle, so no generation order exists.
    #[error("required relationships form a cycle among: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    /// The failure policy string is neither `log` nor `raise`.
    #[error("`{0}` is not a supported policy (expected `log` or `raise`)")]
    UnsupportedPolicy(String),

    /// A required relationship has no parent records to point at.
    #[error("cannot link `{entity}` records to `{target}`: no `{target}` records have been synthesized")]
    UnlinkableRecord {
        /// Entity type being synthesized.
        entity: String,
        /// Parent entity type with an empty dataset.
        target: String,
    },
}

impl SimError {
    pub(crate) fn schema(entity: &str, reason: impl Into<String>) -> Self {
        Self::Schema { entity: entity.into(), reason: reason.into() }
    }

    pub(crate) fn unknown(target: &str) -> Self {
        Self::UnknownEntityType { target: target.into(), referrer: None }
    }
}

/// Result alias used throughout the library.
pub type SimResult<T> = Result<T, SimError>;
