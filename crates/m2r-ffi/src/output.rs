use m2r_core::{Order, Output};

use crate::types::{M2R_KIND_FLAT, M2R_KIND_SHAPED};

/// Opaque handle owning the buffer produced by `m2r_map2_right`.
///
/// Flat results report a single dimension of length `len` and row-major
/// order.
pub struct M2ROutput {
    pub kind: u32,
    pub data: Vec<f64>,
    pub shape: Vec<usize>,
    pub order: Order,
}

impl From<Output<f64>> for M2ROutput {
    fn from(out: Output<f64>) -> Self {
        match out {
            Output::Flat(data) => Self {
                kind: M2R_KIND_FLAT,
                shape: vec![data.len()],
                data,
                order: Order::RowMajor,
            },
            Output::Shaped(array) => {
                let shape = array.shape().dims().to_vec();
                let order = array.order();
                Self {
                    kind: M2R_KIND_SHAPED,
                    data: array.into_vec(),
                    shape,
                    order,
                }
            }
        }
    }
}
