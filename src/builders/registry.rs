//! Opcode -> op builder registry.
//!
//! Registration happens on an [`OpBuilderRegistrations`] value which is then
//! frozen into an immutable [`OpBuilderRegistry`]. The first builder
//! registered for an opcode wins; several opcodes may share one builder
//! instance.

use super::{argmax_min, ArgMaxMinOpBuilder, OpBuilder};
use hashbrown::HashMap;
use log::trace;

/// Mutable registration state, consumed by [`OpBuilderRegistrations::build`].
#[derive(Default)]
pub struct OpBuilderRegistrations {
    builders: Vec<Box<dyn OpBuilder>>,
    op_builder_map: HashMap<String, usize>,
}

impl OpBuilderRegistrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one builder instance for every opcode in `op_types`.
    ///
    /// Opcodes that already have a builder keep it. The factory only runs
    /// when at least one opcode is new.
    pub fn register<F>(&mut self, op_types: &[&str], factory: F) -> &mut Self
    where
        F: FnOnce() -> Box<dyn OpBuilder>,
    {
        let new_op_types: Vec<&str> = op_types
            .iter()
            .copied()
            .filter(|op_type| !self.op_builder_map.contains_key(*op_type))
            .collect();
        if new_op_types.is_empty() {
            trace!("op builder for {op_types:?} already registered");
            return self;
        }

        let idx = self.builders.len();
        self.builders.push(factory());
        for op_type in new_op_types {
            self.op_builder_map.insert(op_type.to_string(), idx);
        }
        self
    }

    pub fn build(self) -> OpBuilderRegistry {
        OpBuilderRegistry {
            builders: self.builders,
            op_builder_map: self.op_builder_map,
        }
    }
}

/// Immutable opcode -> builder map.
pub struct OpBuilderRegistry {
    builders: Vec<Box<dyn OpBuilder>>,
    op_builder_map: HashMap<String, usize>,
}

impl OpBuilderRegistry {
    /// Builder for `op_type`, or `None` when the backend cannot lower it.
    pub fn lookup(&self, op_type: &str) -> Option<&dyn OpBuilder> {
        self.op_builder_map
            .get(op_type)
            .map(|&idx| self.builders[idx].as_ref())
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.op_builder_map.contains_key(op_type)
    }

    /// Registered opcodes, sorted.
    pub fn op_types(&self) -> Vec<&str> {
        let mut op_types: Vec<&str> = self.op_builder_map.keys().map(String::as_str).collect();
        op_types.sort_unstable();
        op_types
    }

    /// Number of distinct builder instances.
    pub fn builder_count(&self) -> usize {
        self.builders.len()
    }

    /// Number of registered opcodes.
    pub fn len(&self) -> usize {
        self.op_builder_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.op_builder_map.is_empty()
    }
}

/// Registry with every op builder this crate provides.
pub fn create_op_builder_registry() -> OpBuilderRegistry {
    let mut registrations = OpBuilderRegistrations::new();
    registrations.register(&argmax_min::OP_TYPES, || Box::new(ArgMaxMinOpBuilder));
    registrations.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::test::arg_node;
    use crate::core::{DeviceType, LowerResult, ModelBuilder};
    use crate::graph::{DataType, Node};

    struct Rejecting;

    impl OpBuilder for Rejecting {
        fn is_supported(&self, _node: &Node, _device_type: DeviceType) -> bool {
            false
        }

        fn emit(&self, _model_builder: &mut ModelBuilder<'_, '_>, node: &Node) -> LowerResult<()> {
            Err(super::super::unsupported_operator(node))
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = create_op_builder_registry();
        assert_eq!(registry.op_types(), vec!["ArgMax", "ArgMin"]);
        assert_eq!(registry.builder_count(), 1);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(registry.lookup("ArgMax").is_some());
        assert!(registry.lookup("Conv").is_none());
    }

    #[test]
    fn test_aliases_share_one_instance() {
        let registry = create_op_builder_registry();
        let max = registry.lookup("ArgMax").unwrap();
        let min = registry.lookup("ArgMin").unwrap();
        assert!(std::ptr::addr_eq(max, min));
        assert_eq!(registry.builder_count(), 1);
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registrations = OpBuilderRegistrations::new();
        registrations.register(&["ArgMax"], || Box::new(ArgMaxMinOpBuilder));

        let mut called = false;
        registrations.register(&["ArgMax"], || {
            called = true;
            Box::new(Rejecting)
        });
        assert!(!called);

        // Only the new opcode gets the second builder.
        registrations.register(&["ArgMax", "Gather"], || Box::new(Rejecting));
        let registry = registrations.build();
        assert_eq!(registry.builder_count(), 2);

        let argmax = registry.lookup("ArgMax").unwrap();
        let gather = registry.lookup("Gather").unwrap();
        let node = arg_node("ArgMax", "x", "y", DataType::Float32, Some(&[2, 3]), &[]);
        assert!(argmax.is_supported(&node, DeviceType::Gpu));
        assert!(!gather.is_supported(&node, DeviceType::Gpu));
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpBuilderRegistry>();
    }
}
