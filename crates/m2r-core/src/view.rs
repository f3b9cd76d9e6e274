use crate::error::{MapError, Result};
use crate::order::Order;
use crate::shape::Shape;

/// A read-only shaped view over a borrowed flat buffer.
///
/// The view is described by a shape, one signed element stride per
/// dimension, a base offset into `data`, and a memory order tag. The order
/// tag says how linear indices of this view are decomposed; it is not
/// inferred from the strides.
///
/// # Example
/// ```
/// use m2r_core::{NdView, Order};
///
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let view = NdView::new(&data, &[2, 3], vec![3, 1], 0, Order::RowMajor).unwrap();
/// assert_eq!(view.get(&[1, 2]), Some(&6.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NdView<'a, T> {
    data: &'a [T],
    shape: Shape,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
}

/// A mutable shaped view, used as the destination of an assign call.
#[derive(Debug, PartialEq)]
pub struct NdViewMut<'a, T> {
    data: &'a mut [T],
    shape: Shape,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
}

impl<'a, T> NdView<'a, T> {
    /// Create a new shaped view.
    ///
    /// # Errors
    /// Returns `InvalidView` if `strides` does not have one entry per
    /// dimension or if any reachable element lies outside `data`.
    pub fn new(
        data: &'a [T],
        shape: &[usize],
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        let shape = Shape::from_slice(shape);
        validate_bounds(data.len(), &shape, &strides, offset)?;
        Ok(NdView {
            data,
            shape,
            strides,
            offset,
            order,
        })
    }

    /// Create a contiguous view starting at the beginning of `data`.
    pub fn contiguous(data: &'a [T], shape: &[usize], order: Order) -> Result<Self> {
        let strides = Shape::from_slice(shape).strides(order);
        Self::new(data, shape, strides, 0, order)
    }

    /// Create a rank-0 view of a single element.
    pub fn scalar(value: &'a T, order: Order) -> Self {
        NdView {
            data: std::slice::from_ref(value),
            shape: Shape::scalar(),
            strides: Vec::new(),
            offset: 0,
            order,
        }
    }

    /// Assembles a view from parts that are already known to be in bounds.
    pub(crate) fn from_parts(
        data: &'a [T],
        shape: Shape,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Self {
        debug_assert!(validate_bounds(data.len(), &shape, &strides, offset).is_ok());
        NdView {
            data,
            shape,
            strides,
            offset,
            order,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns the whole underlying buffer, not just the viewed elements.
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Number of logical elements in the view.
    pub fn len(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `coords`, or `None` if the coordinates are out
    /// of range.
    pub fn get(&self, coords: &[usize]) -> Option<&'a T> {
        if !in_range(&self.shape, coords) {
            return None;
        }
        let data = self.data;
        data.get(element_offset(self.offset, coords, &self.strides))
    }
}

impl<'a, T> NdViewMut<'a, T> {
    /// Create a new mutable shaped view.
    ///
    /// # Errors
    /// Same conditions as [`NdView::new`].
    pub fn new(
        data: &'a mut [T],
        shape: &[usize],
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Result<Self> {
        let shape = Shape::from_slice(shape);
        validate_bounds(data.len(), &shape, &strides, offset)?;
        Ok(NdViewMut {
            data,
            shape,
            strides,
            offset,
            order,
        })
    }

    /// Create a contiguous mutable view starting at the beginning of `data`.
    pub fn contiguous(data: &'a mut [T], shape: &[usize], order: Order) -> Result<Self> {
        let strides = Shape::from_slice(shape).strides(order);
        Self::new(data, shape, strides, 0, order)
    }

    pub(crate) fn from_parts(
        data: &'a mut [T],
        shape: Shape,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
    ) -> Self {
        debug_assert!(validate_bounds(data.len(), &shape, &strides, offset).is_ok());
        NdViewMut {
            data,
            shape,
            strides,
            offset,
            order,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn len(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, coords: &[usize]) -> Option<&T> {
        if !in_range(&self.shape, coords) {
            return None;
        }
        self.data
            .get(element_offset(self.offset, coords, &self.strides))
    }

    /// Stores `value` at `coords`, returning false if the coordinates are out
    /// of range.
    pub fn set(&mut self, coords: &[usize], value: T) -> bool {
        if !in_range(&self.shape, coords) {
            return false;
        }
        let idx = element_offset(self.offset, coords, &self.strides);
        match self.data.get_mut(idx) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> NdView<'_, T> {
        NdView::from_parts(
            &*self.data,
            self.shape.clone(),
            self.strides.clone(),
            self.offset,
            self.order,
        )
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }
}

/// Offset of the element at `coords` given a base offset and element strides.
///
/// `coords` and `strides` must have the same length, and the result must be
/// non-negative (guaranteed for validated views).
#[inline]
pub(crate) fn element_offset(base: usize, coords: &[usize], strides: &[isize]) -> usize {
    let mut idx = base as isize;
    for (&c, &s) in coords.iter().zip(strides) {
        idx += c as isize * s;
    }
    idx as usize
}

fn in_range(shape: &Shape, coords: &[usize]) -> bool {
    coords.len() == shape.ndim() && coords.iter().zip(shape.dims()).all(|(&c, &d)| c < d)
}

fn validate_bounds(data_len: usize, shape: &Shape, strides: &[isize], offset: usize) -> Result<()> {
    if strides.len() != shape.ndim() {
        return Err(MapError::InvalidView(format!(
            "{} strides for shape {} with {} dimensions",
            strides.len(),
            shape,
            shape.ndim()
        )));
    }
    if shape.is_empty() {
        // Empty view, nothing is ever read
        return Ok(());
    }

    let overflow = || {
        MapError::InvalidView(format!(
            "shape {} with strides {:?} and offset {} overflows the address range",
            shape, strides, offset
        ))
    };
    if shape.checked_numel().is_none() {
        return Err(overflow());
    }

    let base = isize::try_from(offset).map_err(|_| overflow())?;
    let mut min_offset = base;
    let mut max_offset = base;
    for (&size, &stride) in shape.dims().iter().zip(strides) {
        let last = isize::try_from(size - 1).map_err(|_| overflow())?;
        let reach = stride.checked_mul(last).ok_or_else(overflow)?;
        if reach >= 0 {
            max_offset = max_offset.checked_add(reach).ok_or_else(overflow)?;
        } else {
            min_offset = min_offset.checked_add(reach).ok_or_else(overflow)?;
        }
    }

    if min_offset < 0 || max_offset as usize >= data_len {
        return Err(MapError::InvalidView(format!(
            "shape {} with strides {:?} and offset {} reaches elements [{}, {}] of a buffer of length {}",
            shape, strides, offset, min_offset, max_offset, data_len
        )));
    }
    Ok(())
}
