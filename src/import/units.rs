//! Archive units to host units.

use crate::archive::{ArchivePoint, Technology};
use crate::geometry::Point;

use super::error::{ImportError, ImportResult};

/// Host nanometres per millimetre.
pub const NM_PER_MM: f64 = 1_000_000.0;

/// Converts archive coordinates, lengths and angles to host values.
///
/// The design centre maps to the host origin and the Y axis is flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    multiplier: i64,
    center: ArchivePoint,
}

impl UnitConverter {
    /// Builds a converter centred on the middle of the design area.
    #[must_use]
    pub fn new(technology: &Technology) -> Self {
        let (a, b) = technology.design_area;
        Self {
            multiplier: technology.unit_multiplier,
            center: ArchivePoint::new((a.x + b.x) / 2, (a.y + b.y) / 2),
        }
    }

    /// Host nanometres per archive unit.
    #[must_use]
    pub const fn multiplier(&self) -> i64 {
        self.multiplier
    }

    /// Converts a position.
    #[must_use]
    pub const fn point(&self, p: ArchivePoint) -> Point {
        Point::new(
            (p.x - self.center.x) * self.multiplier,
            -(p.y - self.center.y) * self.multiplier,
        )
    }

    /// Converts a length.
    #[must_use]
    pub const fn length(&self, value: i64) -> i64 {
        value * self.multiplier
    }

    /// Converts an angle in thousandths of a degree to degrees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn angle(value: i64) -> f64 {
        value as f64 / 1000.0
    }
}

/// Fails if the design limit does not fit the host coordinate range.
///
/// # Errors
///
/// Returns [`ImportError::DesignTooLarge`] with the current and maximum sizes.
#[allow(clippy::cast_precision_loss)]
pub fn check_design_limit(technology: &Technology) -> ImportResult<()> {
    let m = i128::from(technology.unit_multiplier);
    let width = i128::from(technology.design_limit.x) * m;
    let height = i128::from(technology.design_limit.y) * m;
    let max = i128::from(i32::MAX);

    if width > max || height > max {
        return Err(ImportError::DesignTooLarge {
            width_mm: width as f64 / NM_PER_MM,
            height_mm: height as f64 / NM_PER_MM,
            max_mm: max as f64 / NM_PER_MM,
        });
    }
    Ok(())
}
