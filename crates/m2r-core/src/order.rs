use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Memory order of a shaped buffer.
///
/// Determines how a linear index maps onto a coordinate tuple:
/// - `RowMajor`: the last dimension varies fastest (C order)
/// - `ColumnMajor`: the first dimension varies fastest (Fortran order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    RowMajor,
    ColumnMajor,
}

impl Order {
    /// Converts a numeric order code (as used at the C boundary) to an `Order`.
    ///
    /// - 0 => RowMajor
    /// - 1 => ColumnMajor
    pub fn from_code(code: u32) -> Option<Order> {
        match code {
            0 => Some(Order::RowMajor),
            1 => Some(Order::ColumnMajor),
            _ => None,
        }
    }

    /// Returns the numeric code for this order.
    pub fn to_code(&self) -> u32 {
        match self {
            Order::RowMajor => 0,
            Order::ColumnMajor => 1,
        }
    }

    /// Decomposes `index` into per-dimension coordinates for `dims`, writing
    /// them into `coords`.
    ///
    /// `coords.len()` must equal `dims.len()`, and `index` must be less than
    /// the product of `dims`. A rank-0 shape has no coordinates.
    pub fn unravel(&self, mut index: usize, dims: &[usize], coords: &mut [usize]) {
        debug_assert_eq!(dims.len(), coords.len());
        match self {
            Order::RowMajor => {
                for i in (0..dims.len()).rev() {
                    coords[i] = index % dims[i];
                    index /= dims[i];
                }
            }
            Order::ColumnMajor => {
                for i in 0..dims.len() {
                    coords[i] = index % dims[i];
                    index /= dims[i];
                }
            }
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::RowMajor => write!(f, "row-major"),
            Order::ColumnMajor => write!(f, "column-major"),
        }
    }
}

impl FromStr for Order {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row-major" | "C" => Ok(Order::RowMajor),
            "column-major" | "F" => Ok(Order::ColumnMajor),
            other => Err(MapError::UnknownOrder(other.to_string())),
        }
    }
}
