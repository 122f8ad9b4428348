//! Shared helpers for the op builders: tensor queries, axis handling and the
//! backend's supported data types.

use crate::backend::OperandDataType;
use crate::core::{DeviceType, LowerError, LowerResult};
use crate::graph::{DataType, Dim, Node, TensorRef};
use hashbrown::HashSet;
use log::debug;

/// Input `idx` of `node`.
pub fn input(node: &Node, idx: usize) -> LowerResult<&TensorRef> {
    node.inputs.get(idx).ok_or_else(|| {
        LowerError::invalid_graph(format!(
            "[{}] node '{}' has no input {}",
            node.op_type,
            node.display_name(),
            idx
        ))
    })
}

/// Output `idx` of `node`.
pub fn output(node: &Node, idx: usize) -> LowerResult<&TensorRef> {
    node.outputs.get(idx).ok_or_else(|| {
        LowerError::invalid_graph(format!(
            "[{}] node '{}' has no output {}",
            node.op_type,
            node.display_name(),
            idx
        ))
    })
}

/// Shape of a tensor. Dynamic dimensions are allowed; an absent shape is not.
pub fn get_shape(tensor: &TensorRef) -> LowerResult<&[Dim]> {
    tensor
        .shape
        .as_deref()
        .ok_or_else(|| LowerError::UnresolvableShape {
            tensor: tensor.name.clone(),
        })
}

/// Element type of a tensor.
pub fn get_type(tensor: &TensorRef) -> LowerResult<DataType> {
    tensor.data_type.ok_or_else(|| {
        LowerError::invalid_graph(format!("element type of tensor '{}' is unknown", tensor.name))
    })
}

/// Map a negative axis onto `[0, rank)`. Non-negative axes are returned as is.
pub fn handle_negative_axis(axis: i64, rank: usize) -> i64 {
    if axis < 0 {
        axis + rank as i64
    } else {
        axis
    }
}

/// Element types the backend accepts for any operation.
pub fn webnn_supported_data_types() -> HashSet<DataType> {
    DataType::ALL
        .into_iter()
        .filter(|ty| OperandDataType::from_data_type(*ty).is_some())
        .collect()
}

/// Check that `tensor`'s element type is in `supported`.
pub fn check_data_type(
    op_type: &str,
    tensor: &TensorRef,
    supported: &HashSet<DataType>,
) -> LowerResult<()> {
    let ty = get_type(tensor)?;
    if !supported.contains(&ty) {
        return Err(LowerError::UnsupportedInputType {
            op_type: op_type.to_string(),
            data_type: ty.to_string(),
        });
    }
    Ok(())
}

/// Output type of argMax/argMin.
///
/// Always int64, the ONNX index type, whatever the device.
// TODO: query the backend's supported argMax/argMin output types and fall back to int32
// output followed by an int32 -> int64 cast when int64 output is unavailable.
pub fn arg_reduce_output_type(_device_type: DeviceType) -> OperandDataType {
    OperandDataType::Int64
}

/// Turn a support-check outcome into the boolean the driver consumes.
pub(crate) fn accept(check: LowerResult<()>) -> bool {
    match check {
        Ok(()) => true,
        Err(err) => {
            debug!("{err}");
            false
        }
    }
}
