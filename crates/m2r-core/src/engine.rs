//! Right-to-left traversal engines.
//!
//! Both engines walk linear indices from the last position down to 0 and
//! call the combining function exactly once per position, in that order.
//! Results are stored at the position they were computed for.

use crate::array::NdArray;
use crate::broadcast::BroadcastPlan;
use crate::operand::Operand;
use crate::view::{element_offset, NdView, NdViewMut};

/// The record passed to the combining function for each output position.
///
/// All five fields are always populated; callers use the ones they need.
#[derive(Debug)]
pub struct Invocation<'e, T, U> {
    /// Element of `x` mapped to this position.
    pub lhs: &'e T,
    /// Element of `y` mapped to this position.
    pub rhs: &'e U,
    /// Linear index of the output position.
    pub index: usize,
    /// The whole `x` operand.
    pub x: &'e Operand<'e, T>,
    /// The whole `y` operand.
    pub y: &'e Operand<'e, U>,
}

impl<T, U> Clone for Invocation<'_, T, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, U> Copy for Invocation<'_, T, U> {}

/// Result of an allocating mapping call.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<R> {
    /// Produced from two flat operands.
    Flat(Vec<R>),
    /// Produced from two shaped operands; carries the broadcast shape and
    /// the selected order.
    Shaped(NdArray<R>),
}

impl<R> Output<R> {
    /// Returns the elements in linear-index order.
    pub fn data(&self) -> &[R] {
        match self {
            Output::Flat(v) => v,
            Output::Shaped(a) => a.data(),
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn into_vec(self) -> Vec<R> {
        match self {
            Output::Flat(v) => v,
            Output::Shaped(a) => a.into_vec(),
        }
    }

    pub fn as_shaped(&self) -> Option<&NdArray<R>> {
        match self {
            Output::Flat(_) => None,
            Output::Shaped(a) => Some(a),
        }
    }

    pub fn into_flat(self) -> Option<Vec<R>> {
        match self {
            Output::Flat(v) => Some(v),
            Output::Shaped(_) => None,
        }
    }

    pub fn into_shaped(self) -> Option<NdArray<R>> {
        match self {
            Output::Flat(_) => None,
            Output::Shaped(a) => Some(a),
        }
    }
}

/// Maps two equal-length flat operands into a new buffer.
pub(crate) fn map_flat<T, U, R, C, F>(
    x: &Operand<'_, T>,
    xs: &[T],
    y: &Operand<'_, U>,
    ys: &[U],
    mut f: F,
    mut ctx: Option<&mut C>,
) -> Vec<R>
where
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    debug_assert_eq!(xs.len(), ys.len());
    let mut out = Vec::with_capacity(xs.len());
    for index in (0..xs.len()).rev() {
        let inv = Invocation {
            lhs: &xs[index],
            rhs: &ys[index],
            index,
            x,
            y,
        };
        out.push(f(inv, ctx.as_deref_mut()));
    }
    // Filled last-to-first; flip so position `i` holds the result for index `i`.
    out.reverse();
    out
}

/// Maps two flat operands into an existing buffer of the same length.
pub(crate) fn assign_flat<T, U, R, C, F>(
    x: &Operand<'_, T>,
    xs: &[T],
    y: &Operand<'_, U>,
    ys: &[U],
    out: &mut [R],
    mut f: F,
    mut ctx: Option<&mut C>,
) where
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    debug_assert!(xs.len() == ys.len() && ys.len() == out.len());
    for index in (0..xs.len()).rev() {
        let inv = Invocation {
            lhs: &xs[index],
            rhs: &ys[index],
            index,
            x,
            y,
        };
        out[index] = f(inv, ctx.as_deref_mut());
    }
}

/// Walks the planned output space from the last linear index to the first,
/// handing each position's coordinates and invocation result to `store`.
#[allow(clippy::too_many_arguments)]
fn traverse<T, U, R, C, F, S>(
    plan: &BroadcastPlan,
    x: &Operand<'_, T>,
    xv: &NdView<'_, T>,
    y: &Operand<'_, U>,
    yv: &NdView<'_, U>,
    mut f: F,
    mut ctx: Option<&mut C>,
    mut store: S,
) where
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
    S: FnMut(&[usize], R),
{
    let dims = plan.shape().dims();
    let (xdata, ydata) = (xv.data(), yv.data());
    let mut coords = vec![0usize; dims.len()];

    for index in (0..plan.len()).rev() {
        plan.order().unravel(index, dims, &mut coords);
        let xo = element_offset(xv.offset(), &coords, plan.x_strides());
        let yo = element_offset(yv.offset(), &coords, plan.y_strides());
        let inv = Invocation {
            lhs: &xdata[xo],
            rhs: &ydata[yo],
            index,
            x,
            y,
        };
        let value = f(inv, ctx.as_deref_mut());
        store(&coords, value);
    }
}

/// Maps two shaped operands into a freshly allocated array laid out in the
/// plan's shape and order.
pub(crate) fn map_shaped<T, U, R, C, F>(
    plan: &BroadcastPlan,
    x: &Operand<'_, T>,
    xv: &NdView<'_, T>,
    y: &Operand<'_, U>,
    yv: &NdView<'_, U>,
    f: F,
    ctx: Option<&mut C>,
) -> NdArray<R>
where
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    let mut out = Vec::with_capacity(plan.len());
    traverse(plan, x, xv, y, yv, f, ctx, |_, value| out.push(value));
    out.reverse();
    NdArray::from_parts(out, plan.shape().clone(), plan.order())
}

/// Maps two shaped operands into `out`, whose shape and order the plan was
/// built against. Writes go through `out`'s own strides and offset.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assign_shaped<T, U, R, C, F>(
    plan: &BroadcastPlan,
    x: &Operand<'_, T>,
    xv: &NdView<'_, T>,
    y: &Operand<'_, U>,
    yv: &NdView<'_, U>,
    out: &mut NdViewMut<'_, R>,
    f: F,
    ctx: Option<&mut C>,
) where
    C: ?Sized,
    F: FnMut(Invocation<'_, T, U>, Option<&mut C>) -> R,
{
    debug_assert_eq!(plan.shape(), out.shape());
    let base = out.offset();
    let strides = out.strides().to_vec();
    let data = out.data_mut();
    traverse(plan, x, xv, y, yv, f, ctx, |coords, value| {
        data[element_offset(base, coords, &strides)] = value;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;

    fn add(inv: Invocation<'_, i32, i32>, _: Option<&mut ()>) -> i32 {
        inv.lhs + inv.rhs
    }

    #[test]
    fn test_map_flat_order() {
        let xs = [1, 2, 3];
        let ys = [10, 20, 30];
        let (x, y) = (Operand::from(&xs), Operand::from(&ys));
        let mut seen = Vec::new();
        let out = map_flat(
            &x,
            &xs,
            &y,
            &ys,
            |inv, _: Option<&mut ()>| {
                seen.push(inv.index);
                inv.lhs + inv.rhs
            },
            None,
        );
        assert_eq!(out, vec![11, 22, 33]);
        assert_eq!(seen, vec![2, 1, 0]);
    }

    #[test]
    fn test_map_flat_context() {
        let xs = [1, 2];
        let ys = [1, 1];
        let (x, y) = (Operand::from(&xs), Operand::from(&ys));
        let mut calls = 0usize;
        let out = map_flat(
            &x,
            &xs,
            &y,
            &ys,
            |inv, ctx: Option<&mut usize>| {
                if let Some(c) = ctx {
                    *c += 1;
                }
                inv.lhs * inv.rhs
            },
            Some(&mut calls),
        );
        assert_eq!(out, vec![1, 2]);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_assign_flat() {
        let xs = [1, 2, 3];
        let ys = [1, 1, 1];
        let (x, y) = (Operand::from(&xs), Operand::from(&ys));
        let mut out = [0; 3];
        assign_flat(&x, &xs, &y, &ys, &mut out, add, None);
        assert_eq!(out, [2, 3, 4]);
    }

    #[test]
    fn test_map_shaped_broadcast() {
        let xd = [1, 1];
        let yd = [1, 2, 3];
        let xv = NdView::contiguous(&xd, &[2, 1], Order::RowMajor).unwrap();
        let yv = NdView::contiguous(&yd, &[1, 3], Order::RowMajor).unwrap();
        let plan = BroadcastPlan::new(&xv, &yv, Order::RowMajor).unwrap();
        let (x, y) = (Operand::from(xv.clone()), Operand::from(yv.clone()));
        let out = map_shaped(&plan, &x, &xv, &y, &yv, add, None);
        assert_eq!(out.shape().dims(), &[2, 3]);
        assert_eq!(out.data(), &[2, 3, 4, 2, 3, 4]);
    }

    #[test]
    fn test_assign_shaped_strided_destination() {
        // Destination is the transpose of a row-major [3, 2] buffer.
        let xd = [1, 2, 3, 4, 5, 6];
        let yd = [0];
        let xv = NdView::contiguous(&xd, &[2, 3], Order::RowMajor).unwrap();
        let yv = NdView::contiguous(&yd, &[1], Order::RowMajor).unwrap();
        let mut buf = [0; 6];
        let mut out = NdViewMut::new(&mut buf, &[2, 3], vec![1, 2], 0, Order::RowMajor).unwrap();
        let plan = BroadcastPlan::onto(&xv, &yv, out.shape(), out.order()).unwrap();
        let (x, y) = (Operand::from(xv.clone()), Operand::from(yv.clone()));
        assign_shaped(&plan, &x, &xv, &y, &yv, &mut out, add, None);
        assert_eq!(buf, [1, 4, 2, 5, 3, 6]);
    }
}
