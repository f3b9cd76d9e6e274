mod descriptor;
mod error;
mod output;
mod types;

pub use error::*;
pub use output::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::{c_char, c_void};

use log::debug;
use m2r_core::{Argument, MapError, TypeMismatchKind};

/// Execute a closure that returns an `M2RStatus`, catching any panics
/// and converting them into `M2RStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> M2RStatus + std::panic::UnwindSafe>(f: F) -> M2RStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            M2RStatus::ErrorInternal
        }
    }
}

fn not_callable() -> MapError {
    MapError::TypeMismatch {
        argument: Argument::Callback,
        kind: TypeMismatchKind::NotCallable,
    }
}

/// Map `x` and `y` through `callback` into a new buffer.
///
/// The callback runs once per output position, from the last linear index to
/// the first, and receives `user_data` unchanged. On success, writes a
/// heap-allocated `M2ROutput` pointer into `*out`; the caller must later call
/// `m2r_output_destroy` to free it. Nothing is invoked when validation fails.
///
/// # Safety
/// `x` and `y` must be null or point to valid descriptors whose buffers stay
/// alive for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn m2r_map2_right(
    x: *const M2RArray,
    y: *const M2RArray,
    callback: M2RCallback,
    user_data: *mut c_void,
    out: *mut *mut M2ROutput,
) -> M2RStatus {
    catch_panic(|| {
        if out.is_null() {
            set_last_error("out is null".to_string());
            return M2RStatus::ErrorInvalidArgument;
        }
        let xo = match unsafe { descriptor::operand(x, Argument::X) } {
            Ok(op) => op,
            Err(e) => return fail(e),
        };
        let yo = match unsafe { descriptor::operand(y, Argument::Y) } {
            Ok(op) => op,
            Err(e) => return fail(e),
        };
        let Some(cb) = callback else {
            return fail(not_callable());
        };

        let result = m2r_core::map2_right(xo, yo, |inv| {
            cb(*inv.lhs, *inv.rhs, inv.index, x, y, user_data)
        });
        match result {
            Ok(output) => {
                debug!("m2r_map2_right: {} elements", output.len());
                let handle = Box::new(M2ROutput::from(output));
                unsafe { *out = Box::into_raw(handle) };
                M2RStatus::Ok
            }
            Err(e) => fail(e),
        }
    })
}

/// Map `x` and `y` through `callback` into the caller-owned buffer described
/// by `out`.
///
/// Flat inputs need a flat `out` of the same length; shaped inputs need a
/// shaped `out` whose shape both inputs broadcast to. `out`'s buffer is
/// written through its own strides and offset, and must not overlap either
/// input buffer. On error it is left untouched.
///
/// # Safety
/// As for `m2r_map2_right`; additionally `out->data` must be writable.
#[no_mangle]
pub unsafe extern "C" fn m2r_map2_right_assign(
    x: *const M2RArray,
    y: *const M2RArray,
    out: *const M2RArray,
    callback: M2RCallback,
    user_data: *mut c_void,
) -> M2RStatus {
    catch_panic(|| {
        let xo = match unsafe { descriptor::operand(x, Argument::X) } {
            Ok(op) => op,
            Err(e) => return fail(e),
        };
        let yo = match unsafe { descriptor::operand(y, Argument::Y) } {
            Ok(op) => op,
            Err(e) => return fail(e),
        };
        if let (Some(xd), Some(yd), Some(od)) =
            unsafe { (x.as_ref(), y.as_ref(), out.as_ref()) }
        {
            if descriptor::overlaps(od, xd) || descriptor::overlaps(od, yd) {
                return fail(MapError::InvalidView(
                    "output buffer overlaps an input buffer".to_string(),
                ));
            }
        }
        let dest = match unsafe { descriptor::destination(out) } {
            Ok(d) => d,
            Err(e) => return fail(e),
        };
        let Some(cb) = callback else {
            return fail(not_callable());
        };

        let result = m2r_core::map2_right_assign(xo, yo, dest, |inv| {
            cb(*inv.lhs, *inv.rhs, inv.index, x, y, user_data)
        });
        match result {
            Ok(()) => M2RStatus::Ok,
            Err(e) => fail(e),
        }
    })
}

/// Pointer to the first element of the output buffer, in linear-index order.
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_data(output: *const M2ROutput) -> *const f64 {
    match output.as_ref() {
        Some(o) => o.data.as_ptr(),
        None => std::ptr::null(),
    }
}

/// Number of elements in the output buffer.
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_len(output: *const M2ROutput) -> usize {
    output.as_ref().map_or(0, |o| o.data.len())
}

/// Number of output dimensions (1 for flat results, 0 for rank-0 results).
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_ndim(output: *const M2ROutput) -> usize {
    output.as_ref().map_or(0, |o| o.shape.len())
}

/// Pointer to `m2r_output_ndim` dimension sizes.
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_shape(output: *const M2ROutput) -> *const usize {
    match output.as_ref() {
        Some(o) => o.shape.as_ptr(),
        None => std::ptr::null(),
    }
}

/// `M2R_ORDER_*` code of the output layout.
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_order(output: *const M2ROutput) -> u32 {
    output
        .as_ref()
        .map_or(M2R_ORDER_ROW_MAJOR, |o| o.order.to_code())
}

/// `M2R_KIND_*` code telling whether the output came from flat or shaped
/// inputs.
///
/// # Safety
/// `output` must be null or a live handle from `m2r_map2_right`.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_kind(output: *const M2ROutput) -> u32 {
    output.as_ref().map_or(M2R_KIND_FLAT, |o| o.kind)
}

/// Destroy an output previously created by `m2r_map2_right`.
///
/// Passing a null pointer is a no-op and returns `M2RStatus::Ok`.
///
/// # Safety
/// `output` must be null or a handle not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn m2r_output_destroy(output: *mut M2ROutput) -> M2RStatus {
    if output.is_null() {
        return M2RStatus::Ok;
    }
    drop(Box::from_raw(output));
    M2RStatus::Ok
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `m2r_free_string`.
#[no_mangle]
pub extern "C" fn m2r_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `m2r_last_error`.
///
/// # Safety
/// `s` must be null or a pointer obtained from `m2r_last_error`.
#[no_mangle]
pub unsafe extern "C" fn m2r_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::ffi::CStr;
    use std::ptr;

    fn flat(data: &[f64]) -> M2RArray {
        M2RArray {
            kind: M2R_KIND_FLAT,
            data: data.as_ptr(),
            len: data.len(),
            ndim: 0,
            shape: ptr::null(),
            strides: ptr::null(),
            offset: 0,
            order: M2R_ORDER_ROW_MAJOR,
        }
    }

    fn shaped(data: &[f64], shape: &[usize], order: u32) -> M2RArray {
        M2RArray {
            kind: M2R_KIND_SHAPED,
            ndim: shape.len(),
            shape: shape.as_ptr(),
            order,
            ..flat(data)
        }
    }

    extern "C" fn add(
        x: f64,
        y: f64,
        _index: usize,
        _xs: *const M2RArray,
        _ys: *const M2RArray,
        _user_data: *mut c_void,
    ) -> f64 {
        x + y
    }

    /// Records each index into the `Vec<usize>` behind `user_data`.
    extern "C" fn record(
        x: f64,
        y: f64,
        index: usize,
        xs: *const M2RArray,
        _ys: *const M2RArray,
        user_data: *mut c_void,
    ) -> f64 {
        assert!(!xs.is_null());
        let seen = unsafe { &mut *(user_data as *mut Vec<usize>) };
        seen.push(index);
        x * y
    }

    fn last_error() -> String {
        let p = m2r_last_error();
        assert!(!p.is_null());
        let msg = unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string();
        unsafe { m2r_free_string(p as *mut c_char) };
        msg
    }

    #[test]
    fn test_flat_map_with_user_data() {
        let xd = [1.0, 2.0, 3.0];
        let yd = [4.0, 5.0, 6.0];
        let (x, y) = (flat(&xd), flat(&yd));
        let mut seen: Vec<usize> = Vec::new();
        let mut out: *mut M2ROutput = ptr::null_mut();

        let status = unsafe {
            m2r_map2_right(
                &x,
                &y,
                Some(record),
                &mut seen as *mut Vec<usize> as *mut c_void,
                &mut out,
            )
        };
        assert_eq!(status, M2RStatus::Ok);
        assert_eq!(seen, vec![2, 1, 0]);

        unsafe {
            assert_eq!(m2r_output_kind(out), M2R_KIND_FLAT);
            assert_eq!(m2r_output_len(out), 3);
            assert_eq!(m2r_output_ndim(out), 1);
            let data = std::slice::from_raw_parts(m2r_output_data(out), 3);
            assert_relative_eq!(data[0], 4.0);
            assert_relative_eq!(data[1], 10.0);
            assert_relative_eq!(data[2], 18.0);
            assert_eq!(m2r_output_destroy(out), M2RStatus::Ok);
        }
    }

    #[test]
    fn test_shaped_broadcast_column_major() {
        let xd = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let yd = [0.0; 12];
        let xs = [2usize, 3];
        let ys = [2usize, 2, 3];
        let x = shaped(&xd, &xs, M2R_ORDER_COLUMN_MAJOR);
        let y = shaped(&yd, &ys, M2R_ORDER_COLUMN_MAJOR);
        let mut out: *mut M2ROutput = ptr::null_mut();

        let status =
            unsafe { m2r_map2_right(&x, &y, Some(add), ptr::null_mut(), &mut out) };
        assert_eq!(status, M2RStatus::Ok);

        unsafe {
            assert_eq!(m2r_output_kind(out), M2R_KIND_SHAPED);
            assert_eq!(m2r_output_order(out), M2R_ORDER_COLUMN_MAJOR);
            let shape = std::slice::from_raw_parts(m2r_output_shape(out), m2r_output_ndim(out));
            assert_eq!(shape, &[2, 2, 3]);
            let data = std::slice::from_raw_parts(m2r_output_data(out), m2r_output_len(out));
            assert_eq!(
                data,
                &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0, 6.0, 6.0]
            );
            m2r_output_destroy(out);
        }
    }

    #[test]
    fn test_error_statuses() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        let shape = [2usize];
        let mut out: *mut M2ROutput = ptr::null_mut();

        // Differing flat lengths.
        let status = unsafe {
            m2r_map2_right(&flat(&a), &flat(&b), Some(add), ptr::null_mut(), &mut out)
        };
        assert_eq!(status, M2RStatus::ErrorLengthMismatch);
        assert!(last_error().starts_with("length mismatch"));

        // Flat mixed with shaped.
        let status = unsafe {
            m2r_map2_right(
                &flat(&a),
                &shaped(&a, &shape, M2R_ORDER_ROW_MAJOR),
                Some(add),
                ptr::null_mut(),
                &mut out,
            )
        };
        assert_eq!(status, M2RStatus::ErrorTypeMismatch);

        // Null input descriptor.
        let status =
            unsafe { m2r_map2_right(ptr::null(), &flat(&a), Some(add), ptr::null_mut(), &mut out) };
        assert_eq!(status, M2RStatus::ErrorTypeMismatch);
        assert!(last_error().contains("`x`"));

        // Missing callback.
        let status =
            unsafe { m2r_map2_right(&flat(&a), &flat(&a), None, ptr::null_mut(), &mut out) };
        assert_eq!(status, M2RStatus::ErrorTypeMismatch);
        assert!(last_error().contains("`callback`"));

        // Incompatible shapes.
        let bshape = [3usize];
        let status = unsafe {
            m2r_map2_right(
                &shaped(&a, &shape, M2R_ORDER_ROW_MAJOR),
                &shaped(&b, &bshape, M2R_ORDER_ROW_MAJOR),
                Some(add),
                ptr::null_mut(),
                &mut out,
            )
        };
        assert_eq!(status, M2RStatus::ErrorBroadcastIncompatible);

        // Null out pointer.
        let status = unsafe {
            m2r_map2_right(&flat(&a), &flat(&a), Some(add), ptr::null_mut(), ptr::null_mut())
        };
        assert_eq!(status, M2RStatus::ErrorInvalidArgument);

        assert!(out.is_null());
    }

    #[test]
    fn test_assign_shaped() {
        let xd = [1.0, 2.0, 3.0];
        let yd = [10.0, 20.0];
        let xs = [1usize, 3];
        let ys = [2usize, 1];
        let x = shaped(&xd, &xs, M2R_ORDER_ROW_MAJOR);
        let y = shaped(&yd, &ys, M2R_ORDER_ROW_MAJOR);

        let mut buf = [0.0; 6];
        let os = [2usize, 3];
        let o = shaped(&buf, &os, M2R_ORDER_ROW_MAJOR);
        let o = M2RArray {
            data: buf.as_mut_ptr(),
            ..o
        };
        let mut seen: Vec<usize> = Vec::new();

        let status = unsafe {
            m2r_map2_right_assign(
                &x,
                &y,
                &o,
                Some(record),
                &mut seen as *mut Vec<usize> as *mut c_void,
            )
        };
        assert_eq!(status, M2RStatus::Ok);
        assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(buf, [10.0, 20.0, 30.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_assign_rejects_bad_destination() {
        let xd = [1.0, 2.0];
        let x = flat(&xd);

        let mut short = [0.0; 1];
        let o = M2RArray {
            data: short.as_mut_ptr(),
            ..flat(&short)
        };
        let status =
            unsafe { m2r_map2_right_assign(&x, &x, &o, Some(add), ptr::null_mut()) };
        assert_eq!(status, M2RStatus::ErrorLengthMismatch);
        assert!(last_error().contains("`output`"));
        assert_eq!(short, [0.0]);

        // Writing into an input is refused.
        let status =
            unsafe { m2r_map2_right_assign(&x, &x, &x, Some(add), ptr::null_mut()) };
        assert_eq!(status, M2RStatus::ErrorInvalidArgument);
        assert_eq!(xd, [1.0, 2.0]);
    }

    #[test]
    fn test_output_accessors_null() {
        unsafe {
            assert!(m2r_output_data(ptr::null()).is_null());
            assert_eq!(m2r_output_len(ptr::null()), 0);
            assert_eq!(m2r_output_destroy(ptr::null_mut()), M2RStatus::Ok);
        }
        // Clear any message left by a prior failure on this thread.
        let p = m2r_last_error();
        unsafe { m2r_free_string(p as *mut c_char) };
    }
}
