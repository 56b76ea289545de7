//! Error types for qforge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    /// An application could not be resolved to a concrete lambda during
    /// beta-reduction.
    #[error("Unreducible application: {0}")]
    UnreducibleApplication(String),

    /// A rewrite rule encountered a structurally invalid tree.
    #[error("Normalization error: {reason} in {tree}")]
    Normalization { reason: String, tree: String },

    /// A computed element type disagrees with the type carried on the node.
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },

    /// The renderer was asked to emit a construct the target dialect cannot
    /// express.
    #[error("Unsupported feature for dialect {dialect}: {feature}")]
    UnsupportedFeature { feature: String, dialect: String },

    /// An engine defect, distinct from user errors: callers hitting this
    /// should report a bug, not change their query.
    #[error("Internal invariant violation: {0}")]
    InvariantViolation(String),
}

impl ForgeError {
    /// Create a normalization error for an offending subtree.
    pub fn normalization(reason: impl Into<String>, tree: impl Into<String>) -> Self {
        Self::Normalization {
            reason: reason.into(),
            tree: tree.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(feature: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            dialect: dialect.into(),
        }
    }
}

/// Result type alias for qforge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForgeError::unsupported("RETURNING", "MySql");
        assert_eq!(
            err.to_string(),
            "Unsupported feature for dialect MySql: RETURNING"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = ForgeError::type_mismatch("bool", "int", "Filter predicate");
        assert_eq!(
            err.to_string(),
            "Type mismatch in Filter predicate: expected bool, found int"
        );
    }
}
