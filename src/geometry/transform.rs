//! Placement transform used for library instances.

use serde::{Deserialize, Serialize};

use super::point::Point;

/// Flip, scale, rotate and translate, applied in that order.
///
/// Flip, scale and rotation are performed about `center`; the translation
/// is added last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Mirror left-to-right about `center`.
    pub mirror: bool,
    /// Uniform scale factor.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Translation applied after the other operations.
    pub translation: Point,
    /// Centre for mirror, scale and rotation.
    pub center: Point,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        mirror: false,
        scale: 1.0,
        rotation: 0.0,
        translation: Point::ORIGIN,
        center: Point::ORIGIN,
    };

    /// Returns `true` if applying the transform leaves every point unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        !self.mirror
            && (self.scale - 1.0).abs() < f64::EPSILON
            && self.rotation == 0.0
            && self.translation == Point::ORIGIN
    }

    /// Transforms a point.
    #[must_use]
    pub fn apply(&self, point: Point) -> Point {
        let mut p = point;
        if self.mirror {
            p = p.mirror_x(self.center.x);
        }
        if (self.scale - 1.0).abs() > f64::EPSILON {
            p = p.scale_about(self.center, self.scale);
        }
        if self.rotation != 0.0 {
            p = p.rotate_about(self.center, self.rotation);
        }
        p + self.translation
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
