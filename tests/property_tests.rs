//! Property-based tests for axis normalization and device capability checks.

use bumpalo::Bump;
use nnbridge::backend::{RecordedOp, RecordingGraphBuilder};
use nnbridge::builders::argmax_min::ArgMaxMinOpBuilder;
use nnbridge::builders::create_op_builder_registry;
use nnbridge::builders::helper::handle_negative_axis;
use nnbridge::core::{CompilationSession, DeviceType, ModelBuilder};
use nnbridge::graph::{fixed_shape, AttributeValue, DataType, Node, TensorRef};
use proptest::prelude::*;

fn arb_device() -> impl Strategy<Value = DeviceType> {
    prop::sample::select(DeviceType::ALL.to_vec())
}

fn arb_data_type() -> impl Strategy<Value = DataType> {
    prop::sample::select(DataType::ALL.to_vec())
}

/// A rank in 1..=6 paired with an axis valid for it, negative or not.
fn arb_rank_and_axis() -> impl Strategy<Value = (usize, i64)> {
    (1usize..=6).prop_flat_map(|rank| {
        let r = rank as i64;
        (Just(rank), -r..r)
    })
}

fn arg_node(op_type: &str, data_type: DataType, dims: &[u32], axis: i64) -> Node {
    Node::new(op_type)
        .with_input(
            TensorRef::new("x")
                .with_type(data_type)
                .with_shape(fixed_shape(dims)),
        )
        .with_output(TensorRef::new("y"))
        .with_attr("axis", AttributeValue::Int(axis))
}

proptest! {
    #[test]
    fn non_negative_axis_is_unchanged((rank, axis) in arb_rank_and_axis()) {
        prop_assume!(axis >= 0);
        prop_assert_eq!(handle_negative_axis(axis, rank), axis);
    }

    #[test]
    fn negative_axis_lands_in_range((rank, axis) in arb_rank_and_axis()) {
        prop_assume!(axis < 0);
        let normalized = handle_negative_axis(axis, rank);
        prop_assert_eq!(normalized, rank as i64 + axis);
        prop_assert!((0..rank as i64).contains(&normalized));
    }

    #[test]
    fn select_last_index_only_rejected_on_cpu(
        device in arb_device(),
        flag in 1i64..=4,
        op_type in prop::sample::select(vec!["ArgMax", "ArgMin"]),
        dims in prop::collection::vec(1u32..=16, 1..=5),
        axis_seed in any::<i64>(),
        keepdims in prop::option::of(0i64..=1),
    ) {
        let rank = dims.len() as i64;
        let axis = axis_seed.rem_euclid(2 * rank) - rank;
        let mut node = arg_node(op_type, DataType::Float32, &dims, axis)
            .with_attr("select_last_index", AttributeValue::Int(flag));
        if let Some(keepdims) = keepdims {
            node = node.with_attr("keepdims", AttributeValue::Int(keepdims));
        }

        let registry = create_op_builder_registry();
        let op_builder = registry.lookup(op_type).unwrap();
        prop_assert_eq!(op_builder.is_supported(&node, device), !device.is_cpu());
        prop_assert_eq!(op_builder.supports(&node, device), !device.is_cpu());
    }

    #[test]
    fn cpu_types_are_gpu_types_without_64_bit_integers(data_type in arb_data_type()) {
        let cpu = ArgMaxMinOpBuilder::supported_input_types(DeviceType::Cpu);
        let gpu = ArgMaxMinOpBuilder::supported_input_types(DeviceType::Gpu);
        let wide = matches!(data_type, DataType::Int64 | DataType::Uint64);
        prop_assert_eq!(cpu.contains(&data_type), gpu.contains(&data_type) && !wide);
    }

    #[test]
    fn input_type_check_agrees_with_type_set(device in arb_device(), data_type in arb_data_type()) {
        let registry = create_op_builder_registry();
        let op_builder = registry.lookup("ArgMax").unwrap();
        let node = arg_node("ArgMax", data_type, &[4], 0);
        let expected = ArgMaxMinOpBuilder::supported_input_types(device).contains(&data_type);
        prop_assert_eq!(op_builder.has_supported_inputs(&node, device), expected);
    }

    #[test]
    fn emitted_axis_matches_normalization(
        (rank, axis) in arb_rank_and_axis(),
        keepdims in 0i64..=1,
    ) {
        let dims: Vec<u32> = (2..2 + rank as u32).collect();
        let node = arg_node("ArgMin", DataType::Float32, &dims, axis)
            .with_attr("keepdims", AttributeValue::Int(keepdims));
        let registry = create_op_builder_registry();
        let op_builder = registry.lookup("ArgMin").unwrap();

        let arena = Bump::new();
        let session = CompilationSession::new(&arena);
        let mut backend = RecordingGraphBuilder::new();
        let mut model_builder = ModelBuilder::new(&session, &mut backend, DeviceType::Gpu);
        model_builder.add_graph_input(&node.inputs[0]).unwrap();
        op_builder.emit(&mut model_builder, &node).unwrap();
        let output = model_builder.get_operand("y").unwrap();
        drop(model_builder);

        let expected_axis = handle_negative_axis(axis, rank) as u32;
        match backend.ops().last() {
            Some(RecordedOp::ArgMin { options, .. }) => {
                prop_assert_eq!(options.axes(), &[expected_axis][..]);
                prop_assert_eq!(options.keep_dimensions(), keepdims != 0);
            }
            other => prop_assert!(false, "unexpected op: {:?}", other),
        }

        let out_rank = backend.descriptor(output).unwrap().rank();
        prop_assert_eq!(out_rank, if keepdims != 0 { rank } else { rank - 1 });
    }
}
