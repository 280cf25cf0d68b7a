use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pixel_grid::PixelGrid;

pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 4096.0;
pub const MIN_CENTER: f64 = -1024.0;
pub const MAX_CENTER: f64 = 1024.0;

/// Linear contrast window, `center ± width / 2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

impl WindowLevel {
    /// Window from caller-supplied values.
    ///
    /// Non-positive or non-finite widths are rejected, everything else is
    /// clamped into the displayable bounds.
    pub fn new(center: f64, width: f64) -> Result<Self> {
        let window = Self { center, width };
        window.validate()?;
        Ok(window.clamped())
    }

    /// Bound width to `[1, 4096]` and center to `[-1024, 1024]`
    pub fn clamped(self) -> Self {
        Self {
            center: self.center.clamp(MIN_CENTER, MAX_CENTER),
            width: self.width.clamp(MIN_WIDTH, MAX_WIDTH),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.center.is_finite() || !self.width.is_finite() || self.width <= 0.0 {
            return Err(Error::InvalidWindow {
                center: self.center,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Lower and upper edge of the window
    pub fn bounds(&self) -> (f64, f64) {
        let half = self.width / 2.0;
        (self.center - half, self.center + half)
    }
}

pub struct WindowLevelCalculator;

impl WindowLevelCalculator {
    /// Default window spanning the full value range of the grid
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGrid`] if the grid has no samples
    pub fn compute_default(grid: &PixelGrid) -> Result<WindowLevel> {
        let (lo, hi) = grid.min_max().ok_or(Error::EmptyGrid)?;
        let (lo, hi) = (f64::from(lo), f64::from(hi));
        let range = hi - lo;

        // Wide dynamic ranges stay bounded even if the result no longer covers them.
        Ok(WindowLevel {
            center: lo + range / 2.0,
            width: range,
        }
        .clamped())
    }
}
