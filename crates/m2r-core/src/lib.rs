//! `m2r-core` - right-to-left binary element-wise mapping over flat buffers
//! and broadcast shaped views.
//!
//! This crate provides:
//! - `map2_right` / `map2_right_with`: apply a combining function to the
//!   corresponding elements of two inputs, visiting linear indices from last
//!   to first, into a freshly allocated output
//! - `map2_right_assign` / `map2_right_assign_with`: the same traversal
//!   writing into a caller-provided destination
//! - `NdView` / `NdViewMut` / `NdArray`: strided views and owned arrays
//! - Shape utilities, numpy-style broadcasting and stride resolution
//!
//! # Example
//! ```
//! use m2r_core::{map2_right, NdArray, Order};
//!
//! let x = NdArray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3], Order::RowMajor).unwrap();
//! let y = NdArray::from_vec(vec![10, 20, 30], &[3], Order::RowMajor).unwrap();
//! let out = map2_right(&x, &y, |inv| inv.lhs + inv.rhs).unwrap();
//! assert_eq!(out.data(), &[11, 22, 33, 14, 25, 36]);
//! ```

pub mod array;
pub mod broadcast;
pub mod engine;
pub mod error;
pub mod operand;
pub mod order;
pub mod shape;
pub mod view;

use log::debug;

// Re-export primary types at the crate root for convenience.
pub use array::NdArray;
pub use broadcast::{resolve_strides, select_order, BroadcastPlan};
pub use engine::{Invocation, Output};
pub use error::{Argument, MapError, Result, TypeMismatchKind};
pub use operand::{classify, Category, Classified, Operand};
pub use order::Order;
pub use shape::Shape;
pub use view::{NdView, NdViewMut};

/// Destination of an assign call.
#[derive(Debug)]
pub enum Destination<'o, R> {
    Flat(&'o mut [R]),
    Shaped(NdViewMut<'o, R>),
}

impl<'o, R> From<&'o mut [R]> for Destination<'o, R> {
    fn from(out: &'o mut [R]) -> Self {
        Destination::Flat(out)
    }
}

impl<'o, R> From<&'o mut Vec<R>> for Destination<'o, R> {
    fn from(out: &'o mut Vec<R>) -> Self {
        Destination::Flat(out.as_mut_slice())
    }
}

impl<'o, R, const N: usize> From<&'o mut [R; N]> for Destination<'o, R> {
    fn from(out: &'o mut [R; N]) -> Self {
        Destination::Flat(out.as_mut_slice())
    }
}

impl<'o, R> From<NdViewMut<'o, R>> for Destination<'o, R> {
    fn from(out: NdViewMut<'o, R>) -> Self {
        Destination::Shaped(out)
    }
}

impl<'o, R> From<&'o mut NdArray<R>> for Destination<'o, R> {
    fn from(out: &'o mut NdArray<R>) -> Self {
        Destination::Shaped(out.view_mut())
    }
}

/// Applies `f` to corresponding elements of `x` and `y`, from the last linear
/// index to the first, and returns the results in a new buffer.
///
/// `x` and `y` must both be flat (equal lengths) or both be shaped
/// (broadcast-compatible shapes). For shaped inputs the output has the
/// broadcast shape and `x`'s order.
///
/// # Errors
/// - `TypeMismatch` if one input is flat and the other shaped
/// - `LengthMismatch` if flat inputs differ in length
/// - `BroadcastIncompatible` if shaped inputs cannot be broadcast together
///
/// Nothing is invoked when validation fails.
pub fn map2_right<'a, T, U, R, F>(
    x: impl Into<Operand<'a, T>>,
    y: impl Into<Operand<'a, U>>,
    mut f: F,
) -> Result<Output<R>>
where
    T: 'a,
    U: 'a,
    F: FnMut(Invocation<'_, T, U>) -> R,
{
    map2_right_with(x, y, |inv, _: Option<&mut ()>| f(inv), None)
}

/// Like [`map2_right`], threading an optional context through every
/// invocation of `f`.
pub fn map2_right_with<'a, T, U, R, C, F>(
    x: impl Into<Operand<'a, T>>,
    y: impl Into<Operand<'a, U>>,
    f: F,
    ctx: Option<&mut C>,
) -> Result<Output<R>>
where
    T: 'a,
    U: 'a,
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    let x: Operand<'a, T> = x.into();
    let y: Operand<'a, U> = y.into();

    match classify(&x, &y)? {
        Classified::Flat(xs, ys) => {
            if xs.len() != ys.len() {
                return Err(MapError::LengthMismatch {
                    argument: Argument::Y,
                    expected: xs.len(),
                    got: ys.len(),
                });
            }
            debug!("map2_right: flat path, {} elements", xs.len());
            Ok(Output::Flat(engine::map_flat(&x, xs, &y, ys, f, ctx)))
        }
        Classified::Shaped(xv, yv) => {
            let order = select_order(&x, &y).unwrap_or_default();
            let plan = BroadcastPlan::new(xv, yv, order)?;
            debug!(
                "map2_right: shaped path, shape {} ({}), {} elements",
                plan.shape(),
                plan.order(),
                plan.len()
            );
            Ok(Output::Shaped(engine::map_shaped(&plan, &x, xv, &y, yv, f, ctx)))
        }
    }
}

/// Applies `f` to corresponding elements of `x` and `y`, from the last linear
/// index to the first, writing each result into `out`.
///
/// Flat inputs require a flat destination of the same length. Shaped inputs
/// require a shaped destination; both inputs must broadcast to exactly the
/// destination's shape, and linear indices follow the destination's order.
///
/// # Errors
/// Same as [`map2_right`], plus `TypeMismatch` / `LengthMismatch` /
/// `BroadcastIncompatible` for a destination that does not fit the inputs.
/// `out` is left untouched on error.
pub fn map2_right_assign<'a, 'o, T, U, R, F>(
    x: impl Into<Operand<'a, T>>,
    y: impl Into<Operand<'a, U>>,
    out: impl Into<Destination<'o, R>>,
    mut f: F,
) -> Result<()>
where
    T: 'a,
    U: 'a,
    R: 'o,
    F: FnMut(Invocation<'_, T, U>) -> R,
{
    map2_right_assign_with(x, y, out, |inv, _: Option<&mut ()>| f(inv), None)
}

/// Like [`map2_right_assign`], threading an optional context through every
/// invocation of `f`.
pub fn map2_right_assign_with<'a, 'o, T, U, R, C, F>(
    x: impl Into<Operand<'a, T>>,
    y: impl Into<Operand<'a, U>>,
    out: impl Into<Destination<'o, R>>,
    f: F,
    ctx: Option<&mut C>,
) -> Result<()>
where
    T: 'a,
    U: 'a,
    R: 'o,
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    let x: Operand<'a, T> = x.into();
    let y: Operand<'a, U> = y.into();
    let out: Destination<'o, R> = out.into();

    match (classify(&x, &y)?, out) {
        (Classified::Flat(xs, ys), Destination::Flat(out)) => {
            if xs.len() != ys.len() {
                return Err(MapError::LengthMismatch {
                    argument: Argument::Y,
                    expected: xs.len(),
                    got: ys.len(),
                });
            }
            if out.len() != xs.len() {
                return Err(MapError::LengthMismatch {
                    argument: Argument::Output,
                    expected: xs.len(),
                    got: out.len(),
                });
            }
            debug!("map2_right_assign: flat path, {} elements", xs.len());
            engine::assign_flat(&x, xs, &y, ys, out, f, ctx);
            Ok(())
        }
        (Classified::Shaped(xv, yv), Destination::Shaped(mut out)) => {
            let plan = BroadcastPlan::onto(xv, yv, out.shape(), out.order())?;
            debug!(
                "map2_right_assign: shaped path, shape {} ({}), {} elements",
                plan.shape(),
                plan.order(),
                plan.len()
            );
            engine::assign_shaped(&plan, &x, xv, &y, yv, &mut out, f, ctx);
            Ok(())
        }
        _ => Err(MapError::TypeMismatch {
            argument: Argument::Output,
            kind: TypeMismatchKind::MixedCategories,
        }),
    }
}
