//! Broadcast planning for shaped operands.
//!
//! A [`BroadcastPlan`] fixes everything the traversal needs before the first
//! element is touched: the output shape, the order used to decompose linear
//! indices, and one effective stride vector per input.

use log::trace;

use crate::error::{MapError, Result};
use crate::operand::Operand;
use crate::order::Order;
use crate::shape::Shape;
use crate::view::NdView;

/// Output shape, order and per-input effective strides of a shaped call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPlan {
    shape: Shape,
    order: Order,
    x_strides: Vec<isize>,
    y_strides: Vec<isize>,
}

impl BroadcastPlan {
    /// Plans a mapping of `x` and `y` into a freshly allocated output
    /// traversed in `order` (see [`select_order`]).
    ///
    /// The output shape is the broadcast of both input shapes.
    pub fn new<T, U>(x: &NdView<'_, T>, y: &NdView<'_, U>, order: Order) -> Result<Self> {
        let shape = Shape::broadcast_shape(x.shape(), y.shape())?;
        if shape.checked_numel().is_none() {
            return Err(MapError::InvalidView(format!(
                "broadcast shape {} has more elements than fit in usize",
                shape
            )));
        }
        let plan = Self::with_target(x, y, shape, order);
        trace!(
            "broadcast plan: {} x {} -> {} ({})",
            x.shape(),
            y.shape(),
            plan.shape,
            plan.order
        );
        Ok(plan)
    }

    /// Plans a mapping of `x` and `y` into an existing destination of shape
    /// `target` traversed in `order`.
    ///
    /// Both inputs must broadcast to exactly `target`.
    pub fn onto<T, U>(
        x: &NdView<'_, T>,
        y: &NdView<'_, U>,
        target: &Shape,
        order: Order,
    ) -> Result<Self> {
        Shape::broadcast_to(x.shape(), target)?;
        Shape::broadcast_to(y.shape(), target)?;
        let plan = Self::with_target(x, y, target.clone(), order);
        trace!(
            "broadcast plan: {} x {} onto {} ({})",
            x.shape(),
            y.shape(),
            plan.shape,
            plan.order
        );
        Ok(plan)
    }

    fn with_target<T, U>(x: &NdView<'_, T>, y: &NdView<'_, U>, shape: Shape, order: Order) -> Self {
        let x_strides = resolve_strides(x.shape(), x.strides(), &shape);
        let y_strides = resolve_strides(y.shape(), y.strides(), &shape);
        trace!("effective strides: x={:?} y={:?}", x_strides, y_strides);
        BroadcastPlan {
            shape,
            order,
            x_strides,
            y_strides,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn x_strides(&self) -> &[isize] {
        &self.x_strides
    }

    pub fn y_strides(&self) -> &[isize] {
        &self.y_strides
    }

    /// Number of output elements, and so of combining-function invocations.
    pub fn len(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes the strides used to walk an input of shape `shape` (with native
/// `strides`) across the broadcast output shape `out`.
///
/// The input is right-aligned against `out`. Leading output dimensions the
/// input lacks, and input dimensions of size 1 stretched to a larger output
/// size, get stride 0. Every other stride is copied through unchanged.
///
/// `out` must have at least as many dimensions as `shape`.
pub fn resolve_strides(shape: &Shape, strides: &[isize], out: &Shape) -> Vec<isize> {
    debug_assert_eq!(shape.ndim(), strides.len());
    debug_assert!(out.ndim() >= shape.ndim());

    let pad = out.ndim() - shape.ndim();
    let mut resolved = vec![0isize; out.ndim()];
    for (k, (&size, &stride)) in shape.dims().iter().zip(strides).enumerate() {
        let i = k + pad;
        resolved[i] = if size == 1 && out.dim(i) > 1 { 0 } else { stride };
    }
    resolved
}

/// Picks the order of the output buffer: `x`'s order when `x` is shaped,
/// otherwise `y`'s, otherwise none (flat operands carry no order).
pub fn select_order<T, U>(x: &Operand<'_, T>, y: &Operand<'_, U>) -> Option<Order> {
    x.order().or_else(|| y.order())
}
