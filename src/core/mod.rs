// This module gathers the infrastructure shared by every op builder: the error taxonomy,
// the device tag that capability predicates key on, the arena-backed compilation session
// that interns operand names and collects statistics, the ModelBuilder context holding the
// operand table and the backend graph builder under construction, and the GraphCompiler
// driver that walks a graph through the builder registry.

//! Core lowering infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena-based string interning using `bumpalo`
//! - Lowering statistics
//!
//! ## Model Builder (`model_builder`)
//! - Operand table: IR tensor name -> backend operand handle
//! - Producer-before-consumer and single-definition checks
//!
//! ## Driver (`compiler`)
//! - Registry lookup, support check and emission per node
//! - Supported-node partitioning

pub mod compiler;
pub mod device;
pub mod error;
pub mod model_builder;
pub mod session;
pub mod test_utils;

pub use compiler::{CompiledGraph, GraphCompiler};
pub use device::DeviceType;
pub use error::{LowerError, LowerResult};
pub use model_builder::ModelBuilder;
pub use session::{CompilationSession, SessionStats};
