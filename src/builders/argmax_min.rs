//! ArgMax / ArgMin.
//!
//! Lowers the ONNX `ArgMax` and `ArgMin` operators onto the backend's
//! `argMax`/`argMin` with a single reduced axis. The CPU device cannot take
//! 64-bit integer inputs for these operators and does not honor
//! `select_last_index`.

use super::{helper, unsupported_operator, OpBuilder};
use crate::backend::ArgReduceOptions;
use crate::core::{DeviceType, LowerError, LowerResult, ModelBuilder};
use crate::graph::{DataType, Node, NodeAttrHelper};
use hashbrown::HashSet;
use log::trace;

/// Opcodes handled by [`ArgMaxMinOpBuilder`].
pub const OP_TYPES: [&str; 2] = ["ArgMax", "ArgMin"];

#[derive(Debug, Default, Clone, Copy)]
pub struct ArgMaxMinOpBuilder;

impl ArgMaxMinOpBuilder {
    /// Input element types accepted on `device_type`.
    pub fn supported_input_types(device_type: DeviceType) -> HashSet<DataType> {
        let mut supported = helper::webnn_supported_data_types();
        if device_type.is_cpu() {
            supported.remove(&DataType::Int64);
            supported.remove(&DataType::Uint64);
        }
        supported
    }

    fn check_inputs(node: &Node, device_type: DeviceType) -> LowerResult<()> {
        let input = helper::input(node, 0)?;
        helper::check_data_type(&node.op_type, input, &Self::supported_input_types(device_type))
    }

    fn check_node(node: &Node, device_type: DeviceType) -> LowerResult<()> {
        helper::get_shape(helper::input(node, 0)?)?;

        if device_type.is_cpu() {
            let select_last_index = NodeAttrHelper::new(node).get_int("select_last_index", 0);
            if select_last_index != 0 {
                return Err(LowerError::UnsupportedAttributeCombination {
                    op_type: node.op_type.clone(),
                    reason: "select_last_index = 1 is not supported on the cpu device".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl OpBuilder for ArgMaxMinOpBuilder {
    fn has_supported_inputs(&self, node: &Node, device_type: DeviceType) -> bool {
        helper::accept(Self::check_inputs(node, device_type))
    }

    fn is_supported(&self, node: &Node, device_type: DeviceType) -> bool {
        helper::accept(Self::check_node(node, device_type))
    }

    fn emit(&self, model_builder: &mut ModelBuilder<'_, '_>, node: &Node) -> LowerResult<()> {
        let input_def = helper::input(node, 0)?;
        let output_name = &helper::output(node, 0)?.name;
        let input = model_builder.get_operand(&input_def.name)?;
        let rank = helper::get_shape(input_def)?.len();
        // The backend graph must not gain an op whose result cannot be installed.
        if model_builder.has_operand(output_name) {
            return Err(LowerError::DuplicateOperand {
                name: output_name.clone(),
            });
        }

        let helper_attrs = NodeAttrHelper::new(node);
        let axis = helper_attrs.get_int("axis", 0);
        let keep_dims = helper_attrs.get_int("keepdims", 1);
        let select_last_index = helper_attrs.get_int("select_last_index", 0);

        let axis = helper::handle_negative_axis(axis, rank);
        let axis = u32::try_from(axis).map_err(|_| {
            LowerError::invalid_graph(format!(
                "[{}] axis {} is out of range for an input of rank {}",
                node.op_type, axis, rank
            ))
        })?;

        let options = ArgReduceOptions::builder(axis)
            .keep_dimensions(keep_dims == 1)
            .select_last_index(select_last_index == 1)
            .output_data_type(helper::arg_reduce_output_type(model_builder.device_type()))
            .build(rank)?;

        let output = match node.op_type.as_str() {
            "ArgMax" => model_builder.builder().arg_max(input, &options)?,
            "ArgMin" => model_builder.builder().arg_min(input, &options)?,
            _ => return Err(unsupported_operator(node)),
        };
        trace!(
            "[{}] {} -> {} {}",
            node.op_type,
            input_def.name,
            output_name,
            options
        );

        model_builder.add_operand(output_name, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{OperandDataType, RecordedOp};
    use crate::core::test_utils::test::{arg_node, builder_with_input, TestContext};

    #[test]
    fn test_cpu_excludes_64bit_integers() {
        let cpu = ArgMaxMinOpBuilder::supported_input_types(DeviceType::Cpu);
        let gpu = ArgMaxMinOpBuilder::supported_input_types(DeviceType::Gpu);
        assert!(!cpu.contains(&DataType::Int64));
        assert!(!cpu.contains(&DataType::Uint64));
        assert!(gpu.contains(&DataType::Int64));
        assert!(gpu.contains(&DataType::Uint64));
        assert_eq!(gpu.len() - cpu.len(), 2);
    }

    #[test]
    fn test_uint64_input_rejected_on_cpu() {
        let node = arg_node("ArgMax", "x", "y", DataType::Uint64, Some(&[2, 3]), &[]);
        assert!(!ArgMaxMinOpBuilder.has_supported_inputs(&node, DeviceType::Cpu));
        assert!(ArgMaxMinOpBuilder.has_supported_inputs(&node, DeviceType::Npu));
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let node = arg_node("ArgMin", "x", "y", DataType::Float32, None, &[]);
        assert!(!ArgMaxMinOpBuilder.is_supported(&node, DeviceType::Gpu));
    }

    #[test]
    fn test_select_last_index_only_rejected_on_cpu() {
        let node = arg_node(
            "ArgMax",
            "x",
            "y",
            DataType::Float32,
            Some(&[2, 3, 4]),
            &[("select_last_index", 1)],
        );
        assert!(!ArgMaxMinOpBuilder.is_supported(&node, DeviceType::Cpu));
        assert!(ArgMaxMinOpBuilder.is_supported(&node, DeviceType::Gpu));
        assert!(ArgMaxMinOpBuilder.is_supported(&node, DeviceType::Npu));
    }

    #[test]
    fn test_emit_argmax_negative_axis() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, x) = builder_with_input(&[2, 3, 4]);
        let node = arg_node(
            "ArgMax",
            "x",
            "y",
            DataType::Float32,
            Some(&[2, 3, 4]),
            &[("axis", -1)],
        );

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        mb.add_operand("x", x).unwrap();
        ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap();
        let y = mb.get_operand("y").unwrap();
        drop(mb);

        match &backend.ops()[1] {
            RecordedOp::ArgMax {
                input,
                options,
                output,
            } => {
                assert_eq!(*input, x);
                assert_eq!(*output, y);
                assert_eq!(options.axes(), &[2]);
                assert!(options.keep_dimensions());
                assert!(!options.select_last_index());
                assert_eq!(options.output_data_type(), OperandDataType::Int64);
            }
            other => panic!("unexpected op {other}"),
        }
    }

    #[test]
    fn test_emit_argmin_attributes() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, x) = builder_with_input(&[5, 6]);
        let node = arg_node(
            "ArgMin",
            "x",
            "idx",
            DataType::Float32,
            Some(&[5, 6]),
            &[("axis", 0), ("keepdims", 0), ("select_last_index", 1)],
        );

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        mb.add_operand("x", x).unwrap();
        ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap();
        let idx = mb.get_operand("idx").unwrap();
        drop(mb);

        assert!(matches!(backend.ops()[1], RecordedOp::ArgMin { .. }));
        let desc = backend.descriptor(idx).unwrap();
        assert_eq!(desc.rank(), 1);
        assert_eq!(desc.data_type, OperandDataType::Int64);
        assert!(backend.ops()[1].to_string().contains("selectLastIndex: true"));
    }

    #[test]
    fn test_emit_unknown_opcode_fails() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, x) = builder_with_input(&[4]);
        let node = arg_node("ReduceMax", "x", "y", DataType::Float32, Some(&[4]), &[]);

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        mb.add_operand("x", x).unwrap();
        let err = ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap_err();
        assert!(matches!(err, LowerError::UnsupportedOperator { ref op_type } if op_type == "ReduceMax"));
        assert!(!mb.has_operand("y"));
    }

    #[test]
    fn test_emit_missing_input_operand() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, _) = builder_with_input(&[4]);
        let node = arg_node("ArgMax", "x", "y", DataType::Float32, Some(&[4]), &[]);

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        let err = ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap_err();
        assert!(matches!(err, LowerError::MissingOperand { .. }));
    }

    #[test]
    fn test_emit_shape_rechecked() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, x) = builder_with_input(&[4]);
        let node = arg_node("ArgMax", "x", "y", DataType::Float32, None, &[]);

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        mb.add_operand("x", x).unwrap();
        let err = ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap_err();
        assert!(matches!(err, LowerError::UnresolvableShape { .. }));
    }

    #[test]
    fn test_emit_duplicate_output() {
        let ctx = TestContext::new();
        let session = ctx.create_session();
        let (mut backend, x) = builder_with_input(&[4]);
        let node = arg_node("ArgMax", "x", "x", DataType::Float32, Some(&[4]), &[]);

        let mut mb = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        mb.add_operand("x", x).unwrap();
        let err = ArgMaxMinOpBuilder.emit(&mut mb, &node).unwrap_err();
        assert!(matches!(err, LowerError::DuplicateOperand { ref name } if name == "x"));
        assert_eq!(mb.get_operand("x").unwrap(), x);
        drop(mb);

        assert_eq!(backend.ops().len(), 1);
        assert_eq!(backend.operand_count(), 1);
    }
}
