//! Conversion of `M2RArray` descriptors into core operands and destinations.

use std::slice;

use m2r_core::{
    Argument, Destination, MapError, NdView, NdViewMut, Operand, Order, Result, Shape,
    TypeMismatchKind,
};

use crate::types::{M2RArray, M2R_KIND_FLAT, M2R_KIND_SHAPED};

fn not_array_like(argument: Argument) -> MapError {
    MapError::TypeMismatch {
        argument,
        kind: TypeMismatchKind::NotArrayLike,
    }
}

/// Borrows the descriptor behind `desc`, rejecting null pointers and unknown
/// kind tags.
///
/// # Safety
/// `desc` must be null or point to a valid `M2RArray` for `'a`.
unsafe fn probe<'a>(desc: *const M2RArray, argument: Argument) -> Result<&'a M2RArray> {
    let desc = desc.as_ref().ok_or_else(|| not_array_like(argument))?;
    match desc.kind {
        M2R_KIND_FLAT | M2R_KIND_SHAPED => Ok(desc),
        _ => Err(not_array_like(argument)),
    }
}

/// # Safety
/// `data` must be null with `len == 0`, or valid for `len` reads for `'a`.
unsafe fn buffer<'a>(data: *const f64, len: usize) -> Result<&'a [f64]> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(MapError::InvalidView("null data pointer".to_string()));
    }
    Ok(slice::from_raw_parts(data, len))
}

/// Reads the shape, order and strides of a shaped descriptor.
///
/// # Safety
/// `shape` and, when non-null, `strides` must be valid for `ndim` reads.
unsafe fn layout<'a>(desc: &M2RArray) -> Result<(&'a [usize], Vec<isize>, Order)> {
    let order = Order::from_code(desc.order)
        .ok_or_else(|| MapError::UnknownOrder(desc.order.to_string()))?;
    if desc.ndim == 0 {
        return Ok((&[], Vec::new(), order));
    }
    if desc.shape.is_null() {
        return Err(MapError::InvalidView("null shape pointer".to_string()));
    }
    let shape = slice::from_raw_parts(desc.shape, desc.ndim);
    let strides = if desc.strides.is_null() {
        Shape::from_slice(shape).strides(order)
    } else {
        slice::from_raw_parts(desc.strides, desc.ndim).to_vec()
    };
    Ok((shape, strides, order))
}

/// Builds a read-only operand from an input descriptor.
///
/// # Safety
/// `desc` must be null or point to a valid descriptor whose pointers are
/// valid for the lengths it states, for `'a`.
pub unsafe fn operand<'a>(desc: *const M2RArray, argument: Argument) -> Result<Operand<'a, f64>> {
    let desc = probe(desc, argument)?;
    let data = buffer(desc.data, desc.len)?;
    if desc.kind == M2R_KIND_FLAT {
        return Ok(Operand::Flat(data));
    }
    let (shape, strides, order) = layout(desc)?;
    Ok(Operand::Shaped(NdView::new(
        data,
        shape,
        strides,
        desc.offset,
        order,
    )?))
}

/// Builds a writable destination from an output descriptor.
///
/// # Safety
/// As for [`operand`]; additionally `data` must be writable and must not be
/// aliased for `'o`.
pub unsafe fn destination<'o>(desc: *const M2RArray) -> Result<Destination<'o, f64>> {
    let desc = probe(desc, Argument::Output)?;
    let data: &'o mut [f64] = if desc.len == 0 {
        &mut []
    } else if desc.data.is_null() {
        return Err(MapError::InvalidView("null data pointer".to_string()));
    } else {
        slice::from_raw_parts_mut(desc.data as *mut f64, desc.len)
    };
    if desc.kind == M2R_KIND_FLAT {
        return Ok(Destination::Flat(data));
    }
    let (shape, strides, order) = layout(desc)?;
    Ok(Destination::Shaped(NdViewMut::new(
        data,
        shape,
        strides,
        desc.offset,
        order,
    )?))
}

/// Whether the buffers of `a` and `b` share any element.
pub fn overlaps(a: &M2RArray, b: &M2RArray) -> bool {
    if a.len == 0 || b.len == 0 || a.data.is_null() || b.data.is_null() {
        return false;
    }
    let (a0, b0) = (a.data as usize, b.data as usize);
    let size = std::mem::size_of::<f64>();
    let (a1, b1) = (
        a0.saturating_add(a.len.saturating_mul(size)),
        b0.saturating_add(b.len.saturating_mul(size)),
    );
    a0 < b1 && b0 < a1
}
