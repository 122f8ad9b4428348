//! nnbridge - lowering ONNX-style graphs onto a WebNN-style graph builder.
//!
//! Every opcode the backend can execute has a stateless op builder. The
//! compiler driver asks the builder whether a node is supported on the target
//! device and, if so, lets it emit the equivalent backend operations.
//!
//! # Primary Usage
//!
//! ```
//! use bumpalo::Bump;
//! use nnbridge::backend::RecordingGraphBuilder;
//! use nnbridge::builders::create_op_builder_registry;
//! use nnbridge::core::{CompilationSession, DeviceType, GraphCompiler};
//! use nnbridge::graph::Graph;
//!
//! let graph = Graph::parse("input %x: f32[2,3,4]\n%y = ArgMax(%x) {axis = -1}\noutput %y\n")?;
//! let registry = create_op_builder_registry();
//! let compiler = GraphCompiler::new(&registry, DeviceType::Gpu);
//!
//! let arena = Bump::new();
//! let session = CompilationSession::new(&arena);
//! let mut backend = RecordingGraphBuilder::new();
//! let compiled = compiler.compile(&graph, &session, &mut backend)?;
//! assert_eq!(compiled.outputs.len(), 1);
//! # Ok::<(), nnbridge::core::LowerError>(())
//! ```
//!
//! # Architecture
//!
//! - [`graph`] - Graph IR, attribute helper and textual graph format
//! - [`backend`] - Backend graph builder interface and a recording builder
//! - [`builders`] - Op builder protocol, registry and the ArgMax/ArgMin builder
//! - [`core`] - Errors, device type, session, model builder context and driver

pub mod backend;
pub mod builders;
pub mod core;
pub mod graph;

pub use crate::builders::{create_op_builder_registry, OpBuilder, OpBuilderRegistry};
pub use crate::core::{
    CompilationSession, CompiledGraph, DeviceType, GraphCompiler, LowerError, LowerResult,
    ModelBuilder, SessionStats,
};
