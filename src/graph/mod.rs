//! Graph IR consumed by the op builders.
//!
//! This is the narrow view of an ONNX-style computation graph that lowering
//! needs: nodes with an opcode, ordered input/output tensor references and an
//! attribute map. Tensor references carry an optional shape and an optional
//! element type; lowering never assumes either is present.
//!
//! Graphs are normally produced by an upstream loader. For tests and the CLI a
//! small textual format is provided by [`parser`]:
//!
//! ```text
//! ; Comments start with semicolon
//! opset 13
//! input %x: f32[2,3,4]
//! %y = ArgMax(%x) {axis = -1, keepdims = 0}
//! output %y
//! ```

use hashbrown::HashMap;
use std::fmt;

pub mod attr;
pub mod parser;

pub use attr::NodeAttrHelper;

/// Opset assumed when a graph does not declare one.
pub const DEFAULT_OPSET: i64 = 13;

/// Tensor element type, numbered after ONNX `TensorProto.DataType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float32 = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    String = 8,
    Bool = 9,
    Float16 = 10,
    Float64 = 11,
    Uint32 = 12,
    Uint64 = 13,
    Bfloat16 = 16,
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        DataType::Float32,
        DataType::Uint8,
        DataType::Int8,
        DataType::Uint16,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::String,
        DataType::Bool,
        DataType::Float16,
        DataType::Float64,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Bfloat16,
    ];

    /// Short name used by the textual graph format.
    pub const fn short_name(self) -> &'static str {
        use DataType::*;
        match self {
            Float32 => "f32",
            Uint8 => "u8",
            Int8 => "i8",
            Uint16 => "u16",
            Int16 => "i16",
            Int32 => "i32",
            Int64 => "i64",
            String => "str",
            Bool => "bool",
            Float16 => "f16",
            Float64 => "f64",
            Uint32 => "u32",
            Uint64 => "u64",
            Bfloat16 => "bf16",
        }
    }

    pub fn from_short_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.short_name() == s)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DataType::*;
        let name = match self {
            Float32 => "float32",
            Uint8 => "uint8",
            Int8 => "int8",
            Uint16 => "uint16",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            String => "string",
            Bool => "bool",
            Float16 => "float16",
            Float64 => "float64",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Bfloat16 => "bfloat16",
        };
        f.write_str(name)
    }
}

/// One dimension of a tensor shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(u32),
    /// Unknown size; the string is the symbolic name, possibly empty.
    Dynamic(String),
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Dynamic(name) if name.is_empty() => f.write_str("?"),
            Dim::Dynamic(name) => f.write_str(name),
        }
    }
}

/// Build a fully static shape.
pub fn fixed_shape(dims: &[u32]) -> Vec<Dim> {
    dims.iter().copied().map(Dim::Fixed).collect()
}

/// A named tensor flowing between nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorRef {
    pub name: String,
    pub shape: Option<Vec<Dim>>,
    pub data_type: Option<DataType>,
}

impl TensorRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
            data_type: None,
        }
    }

    pub fn with_shape(mut self, shape: Vec<Dim>) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

impl fmt::Display for TensorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name)?;
        if let Some(ty) = self.data_type {
            write!(f, ": {}", ty.short_name())?;
        }
        if let Some(shape) = &self.shape {
            let dims: Vec<String> = shape.iter().map(Dim::to_string).collect();
            write!(f, "[{}]", dims.join(","))?;
        }
        Ok(())
    }
}

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Ints(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    String(String),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "int",
            AttributeValue::Ints(_) => "ints",
            AttributeValue::Float(_) => "float",
            AttributeValue::Floats(_) => "floats",
            AttributeValue::String(_) => "string",
        }
    }
}

pub type Attributes = HashMap<String, AttributeValue>;

/// One operation of the source graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub op_type: String,
    /// Opset version the node was authored against.
    pub since_version: i64,
    pub inputs: Vec<TensorRef>,
    pub outputs: Vec<TensorRef>,
    pub attributes: Attributes,
}

impl Node {
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            op_type: op_type.into(),
            since_version: DEFAULT_OPSET,
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_since_version(mut self, version: i64) -> Self {
        self.since_version = version;
        self
    }

    pub fn with_input(mut self, input: TensorRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: TensorRef) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Name used in diagnostics: the node name, or its first output.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.outputs.first().map_or(self.op_type.as_str(), |o| o.name.as_str())
    }
}

/// A computation graph in topological order.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub opset: i64,
    pub inputs: Vec<TensorRef>,
    pub nodes: Vec<Node>,
    pub outputs: Vec<TensorRef>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            opset: DEFAULT_OPSET,
            inputs: Vec::new(),
            nodes: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> crate::core::LowerResult<Self> {
        parser::parse_graph(text)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_round_trip() {
        for ty in DataType::ALL {
            assert_eq!(DataType::from_short_name(ty.short_name()), Some(ty));
        }
        assert_eq!(DataType::from_short_name("f128"), None);
    }

    #[test]
    fn test_tensor_display() {
        let t = TensorRef::new("x")
            .with_type(DataType::Float32)
            .with_shape(vec![Dim::Fixed(2), Dim::Dynamic("n".into()), Dim::Dynamic(String::new())]);
        assert_eq!(t.to_string(), "%x: f32[2,n,?]");
    }

    #[test]
    fn test_display_name_falls_back_to_output() {
        let node = Node::new("ArgMax").with_output(TensorRef::new("y"));
        assert_eq!(node.display_name(), "y");
        let node = node.with_name("argmax_0");
        assert_eq!(node.display_name(), "argmax_0");
    }
}
