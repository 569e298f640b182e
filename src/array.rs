//! ndarray interoperability, compiled in with the `ndarray_volumes`
//! feature. The element order is preserved: the first nrrd axis is the
//! fastest, so arrays come out in Fortran (column-major) layout.

use crate::error::{NrrdError, Result};
use crate::object::Nrrd;
use crate::typedef::{NrrdElement, NrrdType};
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn, ShapeBuilder};

impl Nrrd {
    /// View the elements as a dynamic-dimensional ndarray of the exact
    /// element type, copying them out.
    pub fn to_ndarray<T: NrrdElement>(&self) -> Result<ArrayD<T>> {
        let values = self.values::<T>()?;
        ArrayD::from_shape_vec(IxDyn(&self.sizes()).f(), values).map_err(|e| {
            NrrdError::validation(format!("to_ndarray: shape mismatch: {}", e))
        })
    }

    /// The elements widened to `f64`, whatever the stored scalar type.
    pub fn to_ndarray_f64(&self) -> Result<ArrayD<f64>> {
        if self.ty == NrrdType::Block || self.ty == NrrdType::Unknown {
            return Err(NrrdError::validation(format!(
                "to_ndarray_f64: {} data has no numeric view",
                self.ty
            )));
        }
        let values: Vec<f64> = (0..self.element_count())
            .map(|i| self.ty.lookup_f64(&self.data, i))
            .collect();
        ArrayD::from_shape_vec(IxDyn(&self.sizes()).f(), values).map_err(|e| {
            NrrdError::validation(format!("to_ndarray_f64: shape mismatch: {}", e))
        })
    }

    /// Build an array from an ndarray, copying the elements. Axis order
    /// is preserved, with the first ndarray axis becoming the fastest.
    pub fn from_ndarray<T, S, D>(array: &ArrayBase<S, D>) -> Result<Nrrd>
    where
        T: NrrdElement,
        S: Data<Elem = T>,
        D: Dimension,
    {
        let sizes: Vec<usize> = array.shape().to_vec();
        // iterating the transpose row-major walks the original array
        // with its first axis fastest
        let values: Vec<T> = array.t().iter().cloned().collect();
        Nrrd::from_vec(values, &sizes)
    }
}
