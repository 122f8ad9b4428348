//! Graph builder that records every call.
//!
//! [`RecordingGraphBuilder`] stands in for a real backend: it hands out
//! sequential operand handles, tracks the descriptor of every operand it has
//! produced and keeps the list of operations in emission order.

use super::{ArgReduceOptions, GraphBuilder, OperandDescriptor, OperandHandle};
use crate::core::{LowerError, LowerResult};
use crate::graph::Dim;
use log::trace;
use std::fmt;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Input {
        name: String,
        desc: OperandDescriptor,
        output: OperandHandle,
    },
    ArgMax {
        input: OperandHandle,
        options: ArgReduceOptions,
        output: OperandHandle,
    },
    ArgMin {
        input: OperandHandle,
        options: ArgReduceOptions,
        output: OperandHandle,
    },
}

impl RecordedOp {
    pub fn output(&self) -> OperandHandle {
        match self {
            RecordedOp::Input { output, .. }
            | RecordedOp::ArgMax { output, .. }
            | RecordedOp::ArgMin { output, .. } => *output,
        }
    }
}

impl fmt::Display for RecordedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedOp::Input { name, desc, output } => {
                write!(f, "{output} = input(\"{name}\", {desc})")
            }
            RecordedOp::ArgMax {
                input,
                options,
                output,
            } => write!(f, "{output} = argMax({input}, {options})"),
            RecordedOp::ArgMin {
                input,
                options,
                output,
            } => write!(f, "{output} = argMin({input}, {options})"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingGraphBuilder {
    descriptors: Vec<OperandDescriptor>,
    ops: Vec<RecordedOp>,
}

impl RecordingGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded operations in emission order.
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Descriptor of an operand produced by this builder.
    pub fn descriptor(&self, handle: OperandHandle) -> Option<&OperandDescriptor> {
        self.descriptors.get(handle.0 as usize)
    }

    pub fn operand_count(&self) -> usize {
        self.descriptors.len()
    }

    fn push(&mut self, desc: OperandDescriptor) -> OperandHandle {
        let handle = OperandHandle(self.descriptors.len() as u32);
        self.descriptors.push(desc);
        handle
    }

    fn arg_reduce(
        &mut self,
        input: OperandHandle,
        options: &ArgReduceOptions,
    ) -> LowerResult<(OperandHandle, OperandDescriptor)> {
        let input_desc = self.descriptor(input).ok_or_else(|| {
            LowerError::invalid_graph(format!("operand {input} was not created by this builder"))
        })?;

        if let Some(&axis) = options.axes().iter().find(|&&a| a as usize >= input_desc.rank()) {
            return Err(LowerError::invalid_graph(format!(
                "axis {axis} is out of range for operand {input}"
            )));
        }

        let mut shape = Vec::with_capacity(input_desc.rank());
        for (idx, dim) in input_desc.shape.iter().enumerate() {
            if options.axes().contains(&(idx as u32)) {
                if options.keep_dimensions() {
                    shape.push(Dim::Fixed(1));
                }
            } else {
                shape.push(dim.clone());
            }
        }

        let desc = OperandDescriptor::new(options.output_data_type(), shape);
        let output = self.push(desc.clone());
        Ok((output, desc))
    }
}

impl GraphBuilder for RecordingGraphBuilder {
    fn input(&mut self, name: &str, desc: &OperandDescriptor) -> LowerResult<OperandHandle> {
        let output = self.push(desc.clone());
        trace!("{output} = input(\"{name}\", {desc})");
        self.ops.push(RecordedOp::Input {
            name: name.to_string(),
            desc: desc.clone(),
            output,
        });
        Ok(output)
    }

    fn arg_max(
        &mut self,
        input: OperandHandle,
        options: &ArgReduceOptions,
    ) -> LowerResult<OperandHandle> {
        let (output, desc) = self.arg_reduce(input, options)?;
        trace!("{output} = argMax({input}, {options}) -> {desc}");
        self.ops.push(RecordedOp::ArgMax {
            input,
            options: options.clone(),
            output,
        });
        Ok(output)
    }

    fn arg_min(
        &mut self,
        input: OperandHandle,
        options: &ArgReduceOptions,
    ) -> LowerResult<OperandHandle> {
        let (output, desc) = self.arg_reduce(input, options)?;
        trace!("{output} = argMin({input}, {options}) -> {desc}");
        self.ops.push(RecordedOp::ArgMin {
            input,
            options: options.clone(),
            output,
        });
        Ok(output)
    }
}
