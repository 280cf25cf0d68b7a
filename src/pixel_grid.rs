use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

/// Raw samples of one image frame, before any display transform
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    data: Array2<i32>,
    bits_stored: u16,
    signed: bool,
}

impl PixelGrid {
    pub fn new(data: Array2<i32>, bits_stored: u16, signed: bool) -> Self {
        Self {
            data,
            bits_stored,
            signed,
        }
    }

    /// Grid of signed 16-bit samples, the most common CT layout
    pub fn from_i16(data: Array2<i32>) -> Self {
        Self::new(data, 16, true)
    }

    /// Get the dimensions of the grid (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> ArrayView2<'_, i32> {
        self.data.view()
    }

    pub fn bits_stored(&self) -> u16 {
        self.bits_stored
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Minimum and maximum sample, `None` for an empty grid
    pub fn min_max(&self) -> Option<(i32, i32)> {
        if self.data.is_empty() {
            return None;
        }
        let (lo, hi) = self
            .data
            .as_slice()
            .map(|slice| {
                slice
                    .par_iter()
                    .fold(
                        || (i32::MAX, i32::MIN),
                        |(lo, hi), &v| (lo.min(v), hi.max(v)),
                    )
                    .reduce(
                        || (i32::MAX, i32::MIN),
                        |a, b| (a.0.min(b.0), a.1.max(b.1)),
                    )
            })
            .unwrap_or_else(|| {
                self.data
                    .iter()
                    .fold((i32::MAX, i32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
            });
        Some((lo, hi))
    }
}
