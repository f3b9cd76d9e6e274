use std::os::raw::c_void;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum M2RStatus {
    Ok = 0,
    ErrorTypeMismatch = 1,
    ErrorLengthMismatch = 2,
    ErrorBroadcastIncompatible = 3,
    ErrorInvalidArgument = 4,
    ErrorInternal = 5,
}

/// `M2RArray::kind` of a flat buffer.
pub const M2R_KIND_FLAT: u32 = 0;
/// `M2RArray::kind` of a shaped view.
pub const M2R_KIND_SHAPED: u32 = 1;

/// `M2RArray::order` value for row-major (last dimension fastest).
pub const M2R_ORDER_ROW_MAJOR: u32 = 0;
/// `M2RArray::order` value for column-major (first dimension fastest).
pub const M2R_ORDER_COLUMN_MAJOR: u32 = 1;

/// Describes a `double` buffer passed across the boundary.
///
/// For `M2R_KIND_FLAT` only `data` and `len` are read. For `M2R_KIND_SHAPED`
/// `shape` holds `ndim` sizes and `strides` holds `ndim` signed element
/// strides; a null `strides` means contiguous in `order`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct M2RArray {
    pub kind: u32,
    pub data: *const f64,
    /// Length of the underlying buffer in elements.
    pub len: usize,
    pub ndim: usize,
    pub shape: *const usize,
    pub strides: *const isize,
    pub offset: usize,
    pub order: u32,
}

/// Combining function invoked once per output position, from the last
/// linear index to the first.
///
/// Receives both elements, the linear index, both input descriptors and the
/// caller's `user_data`.
pub type M2RCallback = Option<
    extern "C" fn(
        x: f64,
        y: f64,
        index: usize,
        xs: *const M2RArray,
        ys: *const M2RArray,
        user_data: *mut c_void,
    ) -> f64,
>;
