//! Model builder context shared by the op builders during one pass.
//!
//! The [`ModelBuilder`] owns the operand table that maps IR tensor names to
//! backend operand handles. Producers run before consumers, so every name a
//! node consumes must already be present, and every name a node produces is
//! inserted exactly once.

use super::{CompilationSession, DeviceType, LowerError, LowerResult};
use crate::backend::{GraphBuilder, OperandDataType, OperandDescriptor, OperandHandle};
use crate::graph::TensorRef;
use hashbrown::HashMap;
use log::trace;

pub struct ModelBuilder<'a, 'arena> {
    session: &'a CompilationSession<'arena>,
    builder: &'a mut dyn GraphBuilder,
    device_type: DeviceType,
    operands: HashMap<&'arena str, OperandHandle>,
}

impl<'a, 'arena> ModelBuilder<'a, 'arena> {
    pub fn new(
        session: &'a CompilationSession<'arena>,
        builder: &'a mut dyn GraphBuilder,
        device_type: DeviceType,
    ) -> Self {
        Self {
            session,
            builder,
            device_type,
            operands: HashMap::new(),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Backend graph builder under construction.
    pub fn builder(&mut self) -> &mut dyn GraphBuilder {
        &mut *self.builder
    }

    /// Handle of a previously produced operand.
    pub fn get_operand(&self, name: &str) -> LowerResult<OperandHandle> {
        self.operands
            .get(name)
            .copied()
            .ok_or_else(|| LowerError::MissingOperand {
                name: name.to_string(),
            })
    }

    pub fn has_operand(&self, name: &str) -> bool {
        self.operands.contains_key(name)
    }

    /// Install a newly produced operand. Names are never overwritten.
    pub fn add_operand(&mut self, name: &str, handle: OperandHandle) -> LowerResult<()> {
        if self.operands.contains_key(name) {
            return Err(LowerError::DuplicateOperand {
                name: name.to_string(),
            });
        }
        trace!("operand '{name}' -> {handle}");
        let name = self.session.intern_str(name);
        self.operands.insert(name, handle);
        self.session.record_operand_added();
        Ok(())
    }

    /// Declare a graph input on the backend and install its operand.
    pub fn add_graph_input(&mut self, input: &TensorRef) -> LowerResult<OperandHandle> {
        let data_type = input.data_type.ok_or_else(|| {
            LowerError::invalid_graph(format!("graph input '{}' has no element type", input.name))
        })?;
        let operand_type = OperandDataType::from_data_type(data_type).ok_or_else(|| {
            LowerError::UnsupportedInputType {
                op_type: "input".to_string(),
                data_type: data_type.to_string(),
            }
        })?;
        let shape = input
            .shape
            .clone()
            .ok_or_else(|| LowerError::UnresolvableShape {
                tensor: input.name.clone(),
            })?;

        if self.has_operand(&input.name) {
            return Err(LowerError::DuplicateOperand {
                name: input.name.clone(),
            });
        }
        let desc = OperandDescriptor::new(operand_type, shape);
        let handle = self.builder.input(&input.name, &desc)?;
        self.add_operand(&input.name, handle)?;
        Ok(handle)
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }
}
