use ndarray::{Array2, Zip};

use crate::error::Result;
use crate::pixel_grid::PixelGrid;
use crate::window_level::WindowLevel;

pub struct PixelNormalizer;

impl PixelNormalizer {
    /// Map every sample of `grid` through `window` onto `0..=255`.
    ///
    /// Samples at or below the lower window edge become 0, samples at or
    /// above the upper edge become 255, the rest are scaled linearly and
    /// rounded half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidWindow`] if the width is not positive
    /// or either value is not finite
    pub fn apply(grid: &PixelGrid, window: WindowLevel) -> Result<Array2<u8>> {
        window.validate()?;
        let (min_value, max_value) = window.bounds();
        let span = max_value - min_value;

        let mut output = Array2::<u8>::zeros(grid.dim());
        Zip::from(&mut output)
            .and(grid.data())
            .par_for_each(|out, &v| *out = Self::map_sample(v, min_value, span));
        Ok(output)
    }

    #[inline]
    fn map_sample(value: i32, min_value: f64, span: f64) -> u8 {
        let clipped = f64::from(value).clamp(min_value, min_value + span);
        ((clipped - min_value) / span * 255.0).round().clamp(0.0, 255.0) as u8
    }
}
