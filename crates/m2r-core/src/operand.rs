//! Capability classification of mapping inputs.
//!
//! Every input is either a flat, positionally indexed buffer or a shaped
//! view. The two operands of a call must fall in the same category.

use std::fmt;

use crate::array::NdArray;
use crate::error::{Argument, MapError, Result, TypeMismatchKind};
use crate::order::Order;
use crate::view::NdView;

/// The capability set an operand satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Flat,
    Shaped,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Flat => write!(f, "flat"),
            Category::Shaped => write!(f, "shaped"),
        }
    }
}

/// An input to a mapping call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<'a, T> {
    /// A flat sequence indexed by position.
    Flat(&'a [T]),
    /// A shaped view with strides, offset and order.
    Shaped(NdView<'a, T>),
}

impl<'a, T> Operand<'a, T> {
    pub fn category(&self) -> Category {
        match self {
            Operand::Flat(_) => Category::Flat,
            Operand::Shaped(_) => Category::Shaped,
        }
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        match self {
            Operand::Flat(xs) => xs.len(),
            Operand::Shaped(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The memory order tag, for shaped operands.
    pub fn order(&self) -> Option<Order> {
        match self {
            Operand::Flat(_) => None,
            Operand::Shaped(v) => Some(v.order()),
        }
    }

    pub fn as_flat(&self) -> Option<&'a [T]> {
        match self {
            Operand::Flat(xs) => Some(*xs),
            Operand::Shaped(_) => None,
        }
    }

    pub fn as_shaped(&self) -> Option<&NdView<'a, T>> {
        match self {
            Operand::Flat(_) => None,
            Operand::Shaped(v) => Some(v),
        }
    }
}

impl<'a, T> From<&'a [T]> for Operand<'a, T> {
    fn from(xs: &'a [T]) -> Self {
        Operand::Flat(xs)
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Operand<'a, T> {
    fn from(xs: &'a [T; N]) -> Self {
        Operand::Flat(xs.as_slice())
    }
}

impl<'a, T> From<&'a Vec<T>> for Operand<'a, T> {
    fn from(xs: &'a Vec<T>) -> Self {
        Operand::Flat(xs.as_slice())
    }
}

impl<'a, T> From<NdView<'a, T>> for Operand<'a, T> {
    fn from(view: NdView<'a, T>) -> Self {
        Operand::Shaped(view)
    }
}

impl<'a, T> From<&'a NdArray<T>> for Operand<'a, T> {
    fn from(array: &'a NdArray<T>) -> Self {
        Operand::Shaped(array.view())
    }
}

/// A pair of operands known to share a category.
#[derive(Debug)]
pub enum Classified<'o, 'a, T, U> {
    Flat(&'a [T], &'a [U]),
    Shaped(&'o NdView<'a, T>, &'o NdView<'a, U>),
}

/// Pairs `x` and `y` by category.
///
/// # Errors
/// Returns `TypeMismatch` naming `y` when one operand is flat and the other
/// shaped.
pub fn classify<'o, 'a, T, U>(
    x: &'o Operand<'a, T>,
    y: &'o Operand<'a, U>,
) -> Result<Classified<'o, 'a, T, U>> {
    match (x, y) {
        (Operand::Flat(xs), Operand::Flat(ys)) => Ok(Classified::Flat(*xs, *ys)),
        (Operand::Shaped(xv), Operand::Shaped(yv)) => Ok(Classified::Shaped(xv, yv)),
        _ => Err(MapError::type_mismatch(
            Argument::Y,
            TypeMismatchKind::MixedCategories,
        )),
    }
}
