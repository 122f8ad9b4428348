// This module defines the call surface of the backend graph builder that op builders lower
// onto. The GraphBuilder trait mirrors the WebNN MLGraphBuilder methods the lowering layer
// uses: declaring graph inputs and the argMax/argMin reductions. Operands are opaque
// OperandHandle values owned by the builder. Options for a backend call are statically
// typed records validated at construction, so a malformed option set (an axis outside the
// input rank, an output type the reduction cannot produce) is rejected before the backend
// sees it. RecordingGraphBuilder is a concrete builder that records every call; it backs
// the tests and the CLI.

//! Backend graph builder interface.

use crate::core::{LowerError, LowerResult};
use crate::graph::{DataType, Dim};
use std::fmt;

pub mod recording;

pub use recording::{RecordedOp, RecordingGraphBuilder};

/// Opaque handle to an operand inside the backend graph under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperandHandle(pub u32);

impl fmt::Display for OperandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element types a backend operand can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandDataType {
    Float32,
    Float16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Int8,
    Uint8,
}

impl OperandDataType {
    /// Backend type for an IR element type, if the backend has one.
    ///
    /// Booleans are carried as `uint8`.
    pub fn from_data_type(ty: DataType) -> Option<Self> {
        match ty {
            DataType::Bool | DataType::Uint8 => Some(Self::Uint8),
            DataType::Int8 => Some(Self::Int8),
            DataType::Float16 => Some(Self::Float16),
            DataType::Float32 => Some(Self::Float32),
            DataType::Int32 => Some(Self::Int32),
            DataType::Int64 => Some(Self::Int64),
            DataType::Uint32 => Some(Self::Uint32),
            DataType::Uint64 => Some(Self::Uint64),
            DataType::Uint16
            | DataType::Int16
            | DataType::String
            | DataType::Float64
            | DataType::Bfloat16 => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float16 => "float16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
        }
    }
}

impl fmt::Display for OperandDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type and shape of a backend operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandDescriptor {
    pub data_type: OperandDataType,
    pub shape: Vec<Dim>,
}

impl OperandDescriptor {
    pub fn new(data_type: OperandDataType, shape: Vec<Dim>) -> Self {
        Self { data_type, shape }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

impl fmt::Display for OperandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.shape.iter().map(Dim::to_string).collect();
        write!(f, "{}[{}]", self.data_type, dims.join(","))
    }
}

/// Options of the argMax/argMin backend primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgReduceOptions {
    axes: Vec<u32>,
    keep_dimensions: bool,
    select_last_index: bool,
    output_data_type: OperandDataType,
}

impl ArgReduceOptions {
    /// Start building options reducing along `axis`.
    pub fn builder(axis: u32) -> ArgReduceOptionsBuilder {
        ArgReduceOptionsBuilder {
            axis,
            keep_dimensions: false,
            select_last_index: false,
            output_data_type: OperandDataType::Int32,
        }
    }

    pub fn axes(&self) -> &[u32] {
        &self.axes
    }

    pub fn keep_dimensions(&self) -> bool {
        self.keep_dimensions
    }

    pub fn select_last_index(&self) -> bool {
        self.select_last_index
    }

    pub fn output_data_type(&self) -> OperandDataType {
        self.output_data_type
    }
}

impl fmt::Display for ArgReduceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{axes: {:?}, keepDimensions: {}, selectLastIndex: {}, outputDataType: {}}}",
            self.axes, self.keep_dimensions, self.select_last_index, self.output_data_type
        )
    }
}

/// Validating builder for [`ArgReduceOptions`].
#[derive(Debug, Clone)]
pub struct ArgReduceOptionsBuilder {
    axis: u32,
    keep_dimensions: bool,
    select_last_index: bool,
    output_data_type: OperandDataType,
}

impl ArgReduceOptionsBuilder {
    pub fn keep_dimensions(mut self, keep: bool) -> Self {
        self.keep_dimensions = keep;
        self
    }

    pub fn select_last_index(mut self, select_last: bool) -> Self {
        self.select_last_index = select_last;
        self
    }

    pub fn output_data_type(mut self, ty: OperandDataType) -> Self {
        self.output_data_type = ty;
        self
    }

    /// Validate against an input of rank `input_rank`.
    pub fn build(self, input_rank: usize) -> LowerResult<ArgReduceOptions> {
        if self.axis as usize >= input_rank {
            return Err(LowerError::invalid_graph(format!(
                "axis {} is out of range for an input of rank {}",
                self.axis, input_rank
            )));
        }
        if !matches!(
            self.output_data_type,
            OperandDataType::Int32 | OperandDataType::Int64
        ) {
            return Err(LowerError::invalid_graph(format!(
                "argMax/argMin cannot produce {} indices",
                self.output_data_type
            )));
        }
        Ok(ArgReduceOptions {
            axes: vec![self.axis],
            keep_dimensions: self.keep_dimensions,
            select_last_index: self.select_last_index,
            output_data_type: self.output_data_type,
        })
    }
}

/// Call surface of a backend graph builder.
///
/// Each method appends one operation to the backend graph and returns the
/// handle of the operand it produces.
pub trait GraphBuilder {
    /// Declare a graph input.
    fn input(&mut self, name: &str, desc: &OperandDescriptor) -> LowerResult<OperandHandle>;

    /// Index of the largest value along the reduced axes.
    fn arg_max(
        &mut self,
        input: OperandHandle,
        options: &ArgReduceOptions,
    ) -> LowerResult<OperandHandle>;

    /// Index of the smallest value along the reduced axes.
    fn arg_min(
        &mut self,
        input: OperandHandle,
        options: &ArgReduceOptions,
    ) -> LowerResult<OperandHandle>;
}
