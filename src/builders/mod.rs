// This module defines the op builder protocol: one flat OpBuilder trait with a support-check
// phase and an emission phase, the shared checks every builder gets through default
// methods (input and output element types, opset range), and the registry that maps
// opcodes to builder instances. Builders are stateless and Send + Sync so a single
// registry can serve concurrent passes over different graphs. Support checks answer a
// boolean and log the reason for a rejection; emission returns a typed LowerResult.

//! Op builders.
//!
//! The driver uses a builder in two phases:
//!
//! ```text
//! let op_builder = registry.lookup(&node.op_type)?;   // unknown opcode -> fail
//! if op_builder.supports(node, device) {             // read-only, may reject
//!     op_builder.emit(&mut model_builder, node)?;     // adds one operand
//! }
//! ```

use crate::core::{DeviceType, LowerError, LowerResult, ModelBuilder};
use crate::graph::Node;
use log::debug;

pub mod argmax_min;
pub mod helper;
pub mod registry;

pub use argmax_min::ArgMaxMinOpBuilder;
pub use registry::{create_op_builder_registry, OpBuilderRegistrations, OpBuilderRegistry};

/// Translator for one or more opcodes.
pub trait OpBuilder: Send + Sync {
    /// Whether the element types of the node's inputs are usable on `device_type`.
    ///
    /// The default accepts a first input whose type is in the backend's
    /// global supported set.
    fn has_supported_inputs(&self, node: &Node, _device_type: DeviceType) -> bool {
        let supported = helper::webnn_supported_data_types();
        helper::accept(
            helper::input(node, 0)
                .and_then(|input| helper::check_data_type(&node.op_type, input, &supported)),
        )
    }

    /// Whether the declared output type, if any, is one the backend can hold.
    fn has_supported_outputs(&self, node: &Node) -> bool {
        let Some(output_type) = node.outputs.first().and_then(|o| o.data_type) else {
            return true;
        };
        if helper::webnn_supported_data_types().contains(&output_type) {
            return true;
        }
        debug!(
            "[{}] Output type: [{}] is not supported for now",
            node.op_type, output_type
        );
        false
    }

    fn min_supported_opset(&self) -> i64 {
        1
    }

    fn max_supported_opset(&self) -> i64 {
        21
    }

    fn has_supported_opset(&self, node: &Node) -> bool {
        let version = node.since_version;
        if version < self.min_supported_opset() || version > self.max_supported_opset() {
            debug!(
                "[{}] opset {} is outside the supported range [{}, {}]",
                node.op_type,
                version,
                self.min_supported_opset(),
                self.max_supported_opset()
            );
            return false;
        }
        true
    }

    /// Operator specific support check.
    fn is_supported(&self, _node: &Node, _device_type: DeviceType) -> bool {
        true
    }

    /// Full support check, in protocol order, stopping at the first rejection.
    fn supports(&self, node: &Node, device_type: DeviceType) -> bool {
        self.has_supported_inputs(node, device_type)
            && self.has_supported_outputs(node)
            && self.has_supported_opset(node)
            && self.is_supported(node, device_type)
    }

    /// Append the backend operations for `node` and install its output operand.
    ///
    /// Only called after [`OpBuilder::supports`] accepted the node.
    fn emit(&self, model_builder: &mut ModelBuilder<'_, '_>, node: &Node) -> LowerResult<()>;
}

/// Error for a node that reached a builder not made for its opcode.
pub(crate) fn unsupported_operator(node: &Node) -> LowerError {
    LowerError::UnsupportedOperator {
        op_type: node.op_type.clone(),
    }
}
