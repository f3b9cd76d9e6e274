use crate::error::{MapError, Result};
use crate::order::Order;
use crate::shape::Shape;
use crate::view::{NdView, NdViewMut};

/// An owned shaped array.
///
/// Holds data laid out contiguously in `order` with an associated shape.
/// This is the buffer handed back by the shaped mapping path.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    data: Vec<T>,
    shape: Shape,
    order: Order,
}

impl<T> NdArray<T> {
    /// Create a new array from data laid out contiguously in `order`.
    ///
    /// # Errors
    /// Returns `InvalidView` if `data.len() != shape.numel()`.
    pub fn from_vec(data: Vec<T>, shape: &[usize], order: Order) -> Result<Self> {
        let shape = Shape::from_slice(shape);
        if shape.checked_numel() != Some(data.len()) {
            return Err(MapError::InvalidView(format!(
                "data length {} does not match shape {}",
                data.len(),
                shape
            )));
        }
        Ok(NdArray { data, shape, order })
    }

    /// Wraps a buffer whose length is already known to match `shape`.
    pub(crate) fn from_parts(data: Vec<T>, shape: Shape, order: Order) -> Self {
        debug_assert_eq!(data.len(), shape.numel());
        NdArray { data, shape, order }
    }

    /// Create a rank-0 array holding a single value.
    pub fn scalar(value: T, order: Order) -> Self {
        NdArray {
            data: vec![value],
            shape: Shape::scalar(),
            order,
        }
    }

    /// Returns a reference to the array's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the memory order of the data buffer.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Contiguous strides of the data buffer.
    pub fn strides(&self) -> Vec<isize> {
        self.shape.strides(self.order)
    }

    /// Returns the elements in memory order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the element at `coords`, or `None` if out of range.
    pub fn get(&self, coords: &[usize]) -> Option<&T> {
        self.view().get(coords)
    }

    /// Borrows the array as a shaped view.
    pub fn view(&self) -> NdView<'_, T> {
        NdView::from_parts(&self.data, self.shape.clone(), self.strides(), 0, self.order)
    }

    /// Borrows the array as a mutable shaped view.
    pub fn view_mut(&mut self) -> NdViewMut<'_, T> {
        let strides = self.strides();
        NdViewMut::from_parts(&mut self.data, self.shape.clone(), strides, 0, self.order)
    }
}

impl<T: Clone> NdArray<T> {
    /// Create an array filled with `value`.
    pub fn full(shape: &[usize], value: T, order: Order) -> Self {
        let shape = Shape::from_slice(shape);
        NdArray {
            data: vec![value; shape.numel()],
            shape,
            order,
        }
    }
}
