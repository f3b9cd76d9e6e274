use crate::error::{MapError, Result};
use crate::order::Order;
use std::fmt;

/// An array shape, wrapping a vector of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// The rank-0 shape.
    pub fn scalar() -> Self {
        Shape { dims: Vec::new() }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    ///
    /// A rank-0 shape holds one element; any zero-size dimension yields zero.
    ///
    /// # Panics
    /// Panics if a non-empty shape holds more than `usize::MAX` elements.
    /// Shapes of validated views and arrays never do.
    pub fn numel(&self) -> usize {
        self.checked_numel()
            .unwrap_or_else(|| panic!("element count of shape {} overflows usize", self))
    }

    /// Like [`Shape::numel`], returning `None` on overflow.
    pub fn checked_numel(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns true if some dimension has size zero.
    pub fn is_empty(&self) -> bool {
        self.dims.contains(&0)
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Computes contiguous element strides for this shape in the given order.
    ///
    /// For a shape [d0, d1, d2] the row-major strides are [d1*d2, d2, 1] and
    /// the column-major strides are [1, d0, d0*d1].
    ///
    /// A stride that does not fit in `isize` saturates to `isize::MAX`; bounds
    /// validation then rejects any view built from it.
    pub fn strides(&self, order: Order) -> Vec<isize> {
        let n = self.dims.len();
        let mut strides = vec![0isize; n];
        let mut step = 1isize;
        let mut visit = |i: usize| {
            strides[i] = step;
            let d = isize::try_from(self.dims[i].max(1)).unwrap_or(isize::MAX);
            step = step.saturating_mul(d);
        };
        match order {
            Order::RowMajor => (0..n).rev().for_each(&mut visit),
            Order::ColumnMajor => (0..n).for_each(&mut visit),
        }
        strides
    }

    /// Checks if the given strides describe a contiguous layout of this shape
    /// in the given order.
    pub fn is_contiguous(&self, strides: &[isize], order: Order) -> bool {
        if strides.len() != self.dims.len() {
            return false;
        }
        strides == self.strides(order).as_slice()
    }

    /// Compute the broadcast shape of `a` and `b` using numpy-style broadcasting rules.
    ///
    /// Rules:
    /// 1. If the shapes have different numbers of dimensions, the shorter shape is
    ///    padded with ones on the left.
    /// 2. For each dimension, sizes must either be equal, or one of them must be 1.
    ///    The output dimension is the other size (so 0 only pairs with 0 or 1).
    ///
    /// The `dim` reported on failure indexes the broadcast output shape.
    pub fn broadcast_shape(a: &Shape, b: &Shape) -> Result<Shape> {
        let ndim = a.ndim().max(b.ndim());
        let a_pad = ndim - a.ndim();
        let b_pad = ndim - b.ndim();
        let mut result = vec![0usize; ndim];

        for i in (0..ndim).rev() {
            let da = if i >= a_pad { a.dims[i - a_pad] } else { 1 };
            let db = if i >= b_pad { b.dims[i - b_pad] } else { 1 };

            result[i] = if da == db {
                da
            } else if da == 1 {
                db
            } else if db == 1 {
                da
            } else {
                return Err(MapError::BroadcastIncompatible {
                    x: a.dims.clone(),
                    y: b.dims.clone(),
                    dim: i,
                    x_dim: da,
                    y_dim: db,
                });
            };
        }

        Ok(Shape::new(result))
    }

    /// Checks that `src` broadcasts to exactly `target`.
    ///
    /// Unlike [`Shape::broadcast_shape`] this is one-directional: `src` may not
    /// have more dimensions than `target`, and every aligned dimension of `src`
    /// must equal the target's size or be 1.
    pub fn broadcast_to(src: &Shape, target: &Shape) -> Result<()> {
        let incompatible = |dim: usize, x_dim: usize, y_dim: usize| MapError::BroadcastIncompatible {
            x: src.dims.clone(),
            y: target.dims.clone(),
            dim,
            x_dim,
            y_dim,
        };

        if src.ndim() > target.ndim() {
            // The extra leading dimension of `src` has nothing to align with.
            let extra = src.ndim() - target.ndim() - 1;
            return Err(incompatible(0, src.dims[extra], 1));
        }

        let pad = target.ndim() - src.ndim();
        for (k, &ds) in src.dims.iter().enumerate() {
            let dt = target.dims[k + pad];
            if ds != dt && ds != 1 {
                return Err(incompatible(k + pad, ds, dt));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_shape() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.ndim(), 3);
        assert_eq!(s.numel(), 24);
        assert_eq!(s.dim(0), 2);
        assert_eq!(s.dim(1), 3);
        assert_eq!(s.dim(2), 4);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_strides_row_major() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.strides(Order::RowMajor), vec![12, 4, 1]);
    }

    #[test]
    fn test_strides_column_major() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.strides(Order::ColumnMajor), vec![1, 2, 6]);
    }

    #[test]
    fn test_is_contiguous() {
        let s = Shape::new(vec![2, 3, 4]);
        assert!(s.is_contiguous(&[12, 4, 1], Order::RowMajor));
        assert!(!s.is_contiguous(&[12, 1, 4], Order::RowMajor));
        assert!(s.is_contiguous(&[1, 2, 6], Order::ColumnMajor));
        assert!(!s.is_contiguous(&[1, 2], Order::ColumnMajor));
    }

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.numel(), 1); // product of empty = 1
        assert_eq!(s.strides(Order::RowMajor), Vec::<isize>::new());
    }

    #[test]
    fn test_empty_shape() {
        let s = Shape::from([2, 0, 2]);
        assert!(s.is_empty());
        assert_eq!(s.numel(), 0);
    }

    #[test]
    fn test_numel_empty_with_huge_dims() {
        let s = Shape::new(vec![1 << 33, 1 << 33, 0]);
        assert_eq!(s.numel(), 0);
        assert_eq!(s.checked_numel(), Some(0));
        assert_eq!(Shape::new(vec![1 << 33, 1 << 33]).checked_numel(), None);
    }

    #[test]
    fn test_strides_saturate() {
        let s = Shape::new(vec![usize::MAX, 4, 4]);
        assert_eq!(s.strides(Order::ColumnMajor), vec![1, isize::MAX, isize::MAX]);
        assert_eq!(s.strides(Order::RowMajor), vec![16, 4, 1]);
    }

    #[test]
    fn test_broadcast_same() {
        let a = Shape::new(vec![2, 3]);
        let b = Shape::new(vec![2, 3]);
        let c = Shape::broadcast_shape(&a, &b).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
    }

    #[test]
    fn test_broadcast_expand() {
        let a = Shape::new(vec![2, 1]);
        let b = Shape::new(vec![1, 3]);
        let c = Shape::broadcast_shape(&a, &b).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
    }

    #[test]
    fn test_broadcast_different_ndim() {
        let a = Shape::new(vec![3]);
        let b = Shape::new(vec![2, 3]);
        let c = Shape::broadcast_shape(&a, &b).unwrap();
        assert_eq!(c.dims(), &[2, 3]);

        let c = Shape::broadcast_shape(&b, &a).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
    }

    #[test]
    fn test_broadcast_scalar() {
        let a = Shape::scalar();
        let b = Shape::new(vec![2, 3]);
        assert_eq!(Shape::broadcast_shape(&a, &b).unwrap().dims(), &[2, 3]);
        assert_eq!(Shape::broadcast_shape(&b, &a).unwrap().dims(), &[2, 3]);
        assert_eq!(Shape::broadcast_shape(&a, &a).unwrap().ndim(), 0);
    }

    #[test]
    fn test_broadcast_zero_dims() {
        let zero = Shape::new(vec![0, 3]);
        assert_eq!(
            Shape::broadcast_shape(&zero, &Shape::new(vec![1, 3])).unwrap().dims(),
            &[0, 3]
        );
        assert_eq!(
            Shape::broadcast_shape(&zero, &Shape::new(vec![0, 1])).unwrap().dims(),
            &[0, 3]
        );
        assert!(Shape::broadcast_shape(&zero, &Shape::new(vec![2, 3])).is_err());
    }

    #[test]
    fn test_broadcast_error() {
        let a = Shape::new(vec![2, 3]);
        let b = Shape::new(vec![2, 4]);
        let err = Shape::broadcast_shape(&a, &b).unwrap_err();
        assert_eq!(
            err,
            MapError::BroadcastIncompatible {
                x: vec![2, 3],
                y: vec![2, 4],
                dim: 1,
                x_dim: 3,
                y_dim: 4,
            }
        );
    }

    #[test]
    fn test_broadcast_error_names_aligned_dim() {
        // [6] aligns with the trailing dimension of [2, 3].
        let err = Shape::broadcast_shape(&Shape::new(vec![6]), &Shape::new(vec![2, 3])).unwrap_err();
        match err {
            MapError::BroadcastIncompatible { dim, x_dim, y_dim, .. } => {
                assert_eq!((dim, x_dim, y_dim), (1, 6, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_broadcast_to() {
        let target = Shape::new(vec![2, 2, 3]);
        assert!(Shape::broadcast_to(&Shape::new(vec![2, 3]), &target).is_ok());
        assert!(Shape::broadcast_to(&Shape::new(vec![1, 3]), &target).is_ok());
        assert!(Shape::broadcast_to(&Shape::scalar(), &target).is_ok());
        assert!(Shape::broadcast_to(&target, &target).is_ok());
    }

    #[test]
    fn test_broadcast_to_rejects_growth() {
        // [2, 1] broadcasts with [1, 3] but not *to* it.
        assert!(Shape::broadcast_to(&Shape::new(vec![2, 1]), &Shape::new(vec![1, 3])).is_err());
        assert!(Shape::broadcast_to(&Shape::new(vec![2, 3]), &Shape::new(vec![3])).is_err());
        assert!(Shape::broadcast_to(&Shape::new(vec![3]), &Shape::scalar()).is_err());
    }
}
