// This module defines the compiler driver that lowers a whole graph through the op builder
// registry. GraphCompiler walks the nodes in topological order; for each node it looks up
// the builder by opcode, runs the read-only support check and, if the node is accepted,
// lets the builder emit backend operations into the ModelBuilder context. An opcode with
// no builder and a node that fails its support check both abort the pass: the backend
// never receives a partial graph. The same per-node decision also drives supported_nodes,
// which groups consecutive supported nodes so a caller can split a graph between this
// backend and a fallback executor.

//! Compiler driver.
//!
//! ```text
//! declare graph inputs
//! for node in graph.nodes {
//!     builder = registry.lookup(node.op_type)     // none -> UnsupportedOperator
//!     builder.supports(node, device)              // false -> NodeRejected
//!     builder.emit(model_builder, node)           // error -> abort
//! }
//! resolve graph outputs
//! ```

use super::{CompilationSession, DeviceType, LowerError, LowerResult, ModelBuilder};
use crate::backend::{GraphBuilder, OperandHandle};
use crate::builders::OpBuilderRegistry;
use crate::graph::{Graph, Node};
use log::{debug, trace};

/// Operand handles of a lowered graph's inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGraph {
    pub inputs: Vec<(String, OperandHandle)>,
    pub outputs: Vec<(String, OperandHandle)>,
}

/// Lowers graphs onto one device through a builder registry.
pub struct GraphCompiler<'r> {
    registry: &'r OpBuilderRegistry,
    device_type: DeviceType,
}

impl<'r> GraphCompiler<'r> {
    pub fn new(registry: &'r OpBuilderRegistry, device_type: DeviceType) -> Self {
        Self {
            registry,
            device_type,
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Whether a builder exists for the node and accepts it on this device.
    pub fn is_node_supported(&self, node: &Node) -> bool {
        match self.registry.lookup(&node.op_type) {
            Some(op_builder) => op_builder.supports(node, self.device_type),
            None => {
                debug!("Operator type: [{}] is not supported for now", node.op_type);
                false
            }
        }
    }

    /// Indices of supported nodes, grouped into runs of consecutive nodes.
    pub fn supported_nodes(&self, graph: &Graph) -> Vec<Vec<usize>> {
        let mut groups = Vec::new();
        let mut current = Vec::new();
        for (idx, node) in graph.nodes.iter().enumerate() {
            let supported = self.is_node_supported(node);
            trace!(
                "node {} '{}' ({}) supported: {}",
                idx,
                node.display_name(),
                node.op_type,
                supported
            );
            if supported {
                current.push(idx);
            } else if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Lower every node of `graph` into `builder`.
    pub fn compile(
        &self,
        graph: &Graph,
        session: &CompilationSession<'_>,
        builder: &mut dyn GraphBuilder,
    ) -> LowerResult<CompiledGraph> {
        let mut model_builder = ModelBuilder::new(session, builder, self.device_type);

        let mut inputs = Vec::with_capacity(graph.inputs.len());
        for input in &graph.inputs {
            let handle = model_builder.add_graph_input(input)?;
            inputs.push((input.name.clone(), handle));
        }

        for node in &graph.nodes {
            self.lower_node(&mut model_builder, session, node)?;
        }

        let mut outputs = Vec::with_capacity(graph.outputs.len());
        for output in &graph.outputs {
            let handle = model_builder.get_operand(&output.name)?;
            outputs.push((output.name.clone(), handle));
        }

        debug!(
            "lowered {} nodes onto the {} device",
            graph.nodes.len(),
            self.device_type
        );
        Ok(CompiledGraph { inputs, outputs })
    }

    fn lower_node(
        &self,
        model_builder: &mut ModelBuilder<'_, '_>,
        session: &CompilationSession<'_>,
        node: &Node,
    ) -> LowerResult<()> {
        let op_builder =
            self.registry
                .lookup(&node.op_type)
                .ok_or_else(|| LowerError::UnsupportedOperator {
                    op_type: node.op_type.clone(),
                })?;

        if !op_builder.supports(node, self.device_type) {
            session.record_node_rejected(&node.op_type);
            return Err(LowerError::NodeRejected {
                node: node.display_name().to_string(),
                op_type: node.op_type.clone(),
                device: self.device_type.to_string(),
            });
        }

        op_builder.emit(model_builder, node)?;
        session.record_node_lowered(&node.op_type);
        Ok(())
    }
}
