// This module defines the error types for graph lowering using the thiserror crate.
// LowerError covers every way translating a node onto the backend can fail: a shape
// that cannot be resolved, an input element type the device cannot consume, an attribute
// combination the device cannot honor, an operand that was never produced or that would
// be produced twice, an opcode with no builder, and malformed upstream IR. The driver adds
// NodeRejected for nodes whose support check failed, and the textual graph format adds
// Parse and Io. Support checks never return these errors directly; they build one to
// describe the rejection, log it, and answer false. LowerResult<T> is the convenience
// alias used by emission and the driver.

//! Error types for graph lowering.

use thiserror::Error;

/// Errors raised while lowering a graph onto a backend.
#[derive(Error, Debug)]
pub enum LowerError {
    #[error("Cannot resolve shape of tensor '{tensor}'")]
    UnresolvableShape { tensor: String },

    #[error("[{op_type}] Input type: [{data_type}] is not supported for now")]
    UnsupportedInputType { op_type: String, data_type: String },

    #[error("[{op_type}] {reason}")]
    UnsupportedAttributeCombination { op_type: String, reason: String },

    #[error("Operand '{name}' has not been added to the model builder")]
    MissingOperand { name: String },

    #[error("Operand '{name}' already exists in the model builder")]
    DuplicateOperand { name: String },

    #[error("Unsupported operator: {op_type}")]
    UnsupportedOperator { op_type: String },

    #[error("Invalid graph: {reason}")]
    InvalidGraph { reason: String },

    #[error("Node '{node}' ({op_type}) is not supported on the {device} device")]
    NodeRejected {
        node: String,
        op_type: String,
        device: String,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LowerError {
    /// Shorthand for [`LowerError::InvalidGraph`].
    pub fn invalid_graph(reason: impl Into<String>) -> Self {
        Self::InvalidGraph {
            reason: reason.into(),
        }
    }
}

/// Result type alias for lowering operations.
pub type LowerResult<T> = Result<T, LowerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_message() {
        let err = LowerError::UnsupportedInputType {
            op_type: "ArgMax".to_string(),
            data_type: "uint64".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "[ArgMax] Input type: [uint64] is not supported for now"
        );
    }

    #[test]
    fn test_invalid_graph_shorthand() {
        let err = LowerError::invalid_graph("axis out of range");
        assert!(matches!(err, LowerError::InvalidGraph { .. }));
        assert_eq!(err.to_string(), "Invalid graph: axis out of range");
    }
}
