//! Core error types for grapl-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of the comparator algebra and the schema registry.

use thiserror::Error;

/// Core errors produced by the grapl-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A comparator was constructed with an operand of the wrong primitive.
    #[error("invalid operand for '{predicate}': expected {expected}, got {got}")]
    InvalidOperand {
        predicate: String,
        expected: String,
        got: String,
    },

    /// A raw store value could not be coerced to its declared property type.
    #[error("invalid value for {property_type} property: {value}")]
    InvalidValue {
        property_type: String,
        value: String,
    },

    /// A property name is not declared on the schema.
    #[error("unknown property '{name}' on node type '{node_type}'")]
    UnknownProperty { node_type: String, name: String },

    /// An edge name is not declared on the schema.
    #[error("unknown edge '{name}' on node type '{node_type}'")]
    UnknownEdge { node_type: String, name: String },

    /// A node type has no registered schema.
    #[error("no schema registered for node type '{node_type}'")]
    SchemaNotRegistered { node_type: String },

    /// Two views with the same uid disagree on their node type.
    ///
    /// Indicates store corruption or a mis-keyed upsert; fatal.
    #[error("inconsistent merge for uid {uid}: '{existing}' vs '{incoming}'")]
    InconsistentMerge {
        uid: String,
        existing: String,
        incoming: String,
    },
}
