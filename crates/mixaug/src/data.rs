//! # Plain Array Conversions
//!
//! Mixing accepts host-side [`TensorData`] arrays as well as backend tensors.
//! These helpers move arrays onto a device and back, restoring the original
//! [`DType`] so the caller gets back exactly the representation it passed in.

use anyhow::ensure;
use burn::prelude::Backend;
use burn::tensor::{BasicOps, DType, Tensor, TensorData};

/// Is `dtype` a floating point type?
pub fn is_float_dtype(dtype: DType) -> bool {
    matches!(
        dtype,
        DType::F64 | DType::F32 | DType::Flex32 | DType::F16 | DType::BF16
    )
}

/// Check that a host array has rank `D`.
pub fn check_rank<const D: usize>(data: &TensorData) -> anyhow::Result<()> {
    ensure!(
        data.shape.len() == D,
        "expected a rank {D} array, found shape {:?}",
        data.shape
    );
    Ok(())
}

/// Load a host array onto a device as a rank `D` tensor.
///
/// # Returns
///
/// The tensor; or an error if the array rank is not `D`.
pub fn tensor_from_data<B, const D: usize, K>(
    data: TensorData,
    device: &B::Device,
) -> anyhow::Result<Tensor<B, D, K>>
where
    B: Backend,
    K: BasicOps<B>,
{
    check_rank::<D>(&data)?;
    Ok(Tensor::from_data(data, device))
}

/// Read a tensor back to a host array of the given dtype.
pub fn data_from_tensor<B, const D: usize, K>(
    tensor: Tensor<B, D, K>,
    dtype: DType,
) -> TensorData
where
    B: Backend,
    K: BasicOps<B>,
{
    let data = tensor.into_data();
    if data.dtype == dtype {
        data
    } else {
        data.convert_dtype(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Int;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_is_float_dtype() {
        assert!(is_float_dtype(DType::F32));
        assert!(is_float_dtype(DType::F64));
        assert!(!is_float_dtype(DType::I64));
        assert!(!is_float_dtype(DType::Bool));
    }

    #[test]
    fn test_round_trip_restores_dtype() {
        let device = Default::default();

        let source = TensorData::new(vec![1.5f64, -2.0, 0.25, 4.0], [2, 2]);
        let tensor: Tensor<TestBackend, 2> = tensor_from_data(source.clone(), &device).unwrap();
        let back = data_from_tensor(tensor, source.dtype);
        assert_eq!(back.dtype, DType::F64);
        back.assert_eq(&source, true);

        let labels = TensorData::new(vec![3i32, 1, 2], [3]);
        let tensor: Tensor<TestBackend, 1, Int> = tensor_from_data(labels.clone(), &device).unwrap();
        let back = data_from_tensor(tensor, labels.dtype);
        assert_eq!(back.dtype, DType::I32);
        back.assert_eq(&labels, true);
    }

    #[test]
    fn test_rank_mismatch() {
        let device = Default::default();
        let source = TensorData::new(vec![1.0f32; 6], [2, 3]);

        let result = tensor_from_data::<TestBackend, 3, burn::tensor::Float>(source, &device);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("expected a rank 3 array"));
    }
}
