//! Constant tensor decoding
//!
//! Turns raw `TensorRecord`s into owned, shaped `f32` blobs for layer
//! parameters. Four-dimensional tensors get their shape metadata reordered
//! from the channel-last source conventions to the channel-first layer
//! conventions:
//! - activations: `[N, H, W, C]` -> `[N, C, H, W]`
//! - kernels: `[H, W, In, Out]` -> `[Out, In, H, W]`
//!
//! Only the shape is permuted. The payload keeps its original linear order.

use crate::error::ImportError;
use crate::graph::{DataType, TensorRecord};

/// Shaped `f32` weight buffer owned by a layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Blob {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Read the shape descriptor of a tensor record.
pub fn shape_of(tensor: &TensorRecord) -> Result<Vec<usize>, ImportError> {
    let dims = tensor
        .tensor_shape
        .as_ref()
        .ok_or_else(|| ImportError::MissingShape {
            node: String::new(),
        })?;
    dims.iter()
        .map(|&dim| usize::try_from(dim))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ImportError::InvalidShape {
            node: String::new(),
            shape: dims.clone(),
        })
}

/// Decode an activation-layout float tensor (biases, dense weights).
pub fn decode_activation_tensor(tensor: &TensorRecord) -> Result<Blob, ImportError> {
    let mut shape = shape_of(tensor)?;
    expect_dtype(tensor, DataType::Float)?;

    if shape.len() == 4 {
        shape.swap(2, 3); // NHCW
        shape.swap(1, 2); // NCHW
    }

    let data = read_f32(tensor, &shape)?;
    Ok(Blob::new(shape, data))
}

/// Decode a convolution kernel tensor stored as `[H, W, In, Out]`.
pub fn decode_kernel_tensor(tensor: &TensorRecord) -> Result<Blob, ImportError> {
    let mut shape = shape_of(tensor)?;
    expect_dtype(tensor, DataType::Float)?;
    if shape.len() != 4 {
        return Err(ImportError::InvalidKernelRank {
            node: String::new(),
            shape,
        });
    }

    shape.swap(0, 2); // IWHO
    shape.swap(1, 3); // IOHW
    shape.swap(0, 1); // OIHW

    let data = read_f32(tensor, &shape)?;
    Ok(Blob::new(shape, data))
}

/// Decode a 1-D `int32` shape descriptor, as consumed by `Reshape`.
pub fn decode_dims_tensor(tensor: &TensorRecord) -> Result<Vec<i32>, ImportError> {
    let shape = shape_of(tensor)?;
    expect_dtype(tensor, DataType::Int32)?;
    if shape.len() != 1 {
        return Err(ImportError::InvalidDimsRank {
            node: String::new(),
            shape,
        });
    }

    let width = check_payload(tensor, &shape)?;
    Ok(tensor
        .tensor_content
        .chunks_exact(width)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn expect_dtype(tensor: &TensorRecord, expected: DataType) -> Result<(), ImportError> {
    if tensor.dtype != expected {
        return Err(ImportError::TypeMismatch {
            node: String::new(),
            expected,
            actual: tensor.dtype,
        });
    }
    Ok(())
}

/// Checks the payload length against `shape` and returns the element width.
fn check_payload(tensor: &TensorRecord, shape: &[usize]) -> Result<usize, ImportError> {
    let Some(bytes_per_element) = tensor.dtype.bytes_per_element() else {
        return Err(ImportError::TypeMismatch {
            node: String::new(),
            expected: DataType::Float,
            actual: tensor.dtype,
        });
    };
    let expected = shape
        .iter()
        .try_fold(bytes_per_element, |acc, &dim| acc.checked_mul(dim))
        .unwrap_or(usize::MAX);
    let actual = tensor.tensor_content.len();
    if expected != actual {
        return Err(ImportError::SizeMismatch {
            node: String::new(),
            expected,
            actual,
        });
    }
    Ok(bytes_per_element)
}

fn read_f32(tensor: &TensorRecord, shape: &[usize]) -> Result<Vec<f32>, ImportError> {
    let width = check_payload(tensor, shape)?;
    Ok(tensor
        .tensor_content
        .chunks_exact(width)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(count: usize) -> Vec<f32> {
        (0..count).map(|v| v as f32).collect()
    }

    #[test]
    fn test_shape_of_requires_shape() {
        let mut tensor = TensorRecord::from_f32(&[2], &[1.0, 2.0]);
        assert_eq!(shape_of(&tensor).unwrap(), vec![2]);

        tensor.tensor_shape = None;
        assert!(matches!(
            shape_of(&tensor),
            Err(ImportError::MissingShape { .. })
        ));
    }

    #[test]
    fn test_shape_of_rejects_negative_dims() {
        let tensor = TensorRecord {
            dtype: DataType::Float,
            tensor_shape: Some(vec![-1, 4]),
            tensor_content: Vec::new(),
        };
        assert!(matches!(
            shape_of(&tensor),
            Err(ImportError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_activation_permutes_shape_not_data() {
        let values = ramp(2 * 3 * 4 * 5);
        let tensor = TensorRecord::from_f32(&[2, 3, 4, 5], &values);
        let blob = decode_activation_tensor(&tensor).unwrap();
        assert_eq!(blob.shape, vec![2, 5, 3, 4]);
        assert_eq!(blob.data, values);
    }

    #[test]
    fn test_activation_keeps_low_rank_shape() {
        let tensor = TensorRecord::from_f32(&[3], &[0.5, 1.5, 2.5]);
        let blob = decode_activation_tensor(&tensor).unwrap();
        assert_eq!(blob.shape, vec![3]);
        assert_eq!(blob.data, vec![0.5, 1.5, 2.5]);
        assert_eq!(blob.element_count(), 3);
    }

    #[test]
    fn test_activation_rejects_int_tensor() {
        let tensor = TensorRecord::from_i32(&[2], &[1, 2]);
        assert!(matches!(
            decode_activation_tensor(&tensor),
            Err(ImportError::TypeMismatch {
                expected: DataType::Float,
                actual: DataType::Int32,
                ..
            })
        ));
    }

    #[test]
    fn test_payload_size_mismatch() {
        let mut tensor = TensorRecord::from_f32(&[4], &[1.0, 2.0, 3.0, 4.0]);
        tensor.tensor_content.truncate(12);
        assert!(matches!(
            decode_activation_tensor(&tensor),
            Err(ImportError::SizeMismatch {
                expected: 16,
                actual: 12,
                ..
            })
        ));
    }

    #[test]
    fn test_kernel_hwio_to_oihw() {
        let values = ramp(3 * 3 * 3 * 16);
        let tensor = TensorRecord::from_f32(&[3, 3, 3, 16], &values);
        let blob = decode_kernel_tensor(&tensor).unwrap();
        assert_eq!(blob.shape, vec![16, 3, 3, 3]);
        assert_eq!(blob.data, values);
    }

    #[test]
    fn test_kernel_distinct_dims() {
        let tensor = TensorRecord::from_f32(&[5, 7, 2, 8], &ramp(5 * 7 * 2 * 8));
        let blob = decode_kernel_tensor(&tensor).unwrap();
        assert_eq!(blob.shape, vec![8, 2, 5, 7]);
    }

    #[test]
    fn test_kernel_requires_rank_four() {
        let tensor = TensorRecord::from_f32(&[3, 3], &ramp(9));
        assert!(matches!(
            decode_kernel_tensor(&tensor),
            Err(ImportError::InvalidKernelRank { .. })
        ));
    }

    #[test]
    fn test_dims_tensor() {
        let tensor = TensorRecord::from_i32(&[2], &[-1, 128]);
        assert_eq!(decode_dims_tensor(&tensor).unwrap(), vec![-1, 128]);

        let matrix = TensorRecord::from_i32(&[1, 2], &[1, 2]);
        assert!(matches!(
            decode_dims_tensor(&matrix),
            Err(ImportError::InvalidDimsRank { .. })
        ));

        let float = TensorRecord::from_f32(&[1], &[1.0]);
        assert!(matches!(
            decode_dims_tensor(&float),
            Err(ImportError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_payload_width_follows_dtype() {
        let mut tensor = TensorRecord::from_i32(&[3], &[7, 8, 9]);
        tensor.tensor_content.extend_from_slice(&[0, 0]);
        assert!(matches!(
            decode_dims_tensor(&tensor),
            Err(ImportError::SizeMismatch {
                expected: 12,
                actual: 14,
                ..
            })
        ));
    }
}
