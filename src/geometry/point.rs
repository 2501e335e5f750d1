//! Integer points in host units (nanometres, Y axis pointing down).

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point or vector in host units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: i64,
    /// Y coordinate (grows downwards).
    pub y: i64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of this vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn length(self) -> f64 {
        (self.x as f64).hypot(self.y as f64)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Returns a vector with the same direction and the given length.
    ///
    /// A zero vector stays zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resize(self, new_length: f64) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ORIGIN;
        }
        let factor = new_length / len;
        Self::new(
            round(self.x as f64 * factor),
            round(self.y as f64 * factor),
        )
    }

    /// Polar angle of this vector in degrees, in `[0, 360)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn angle(self) -> f64 {
        normalize_angle_pos((self.y as f64).atan2(self.x as f64).to_degrees())
    }

    /// Rotates this vector about the origin.
    ///
    /// Positive angles turn counter-clockwise as seen on the board.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rotate(self, degrees: f64) -> Self {
        let angle = normalize_angle_pos(degrees);

        if angle == 0.0 {
            return self;
        }
        if (angle - 90.0).abs() < f64::EPSILON {
            return Self::new(self.y, -self.x);
        }
        if (angle - 180.0).abs() < f64::EPSILON {
            return Self::new(-self.x, -self.y);
        }
        if (angle - 270.0).abs() < f64::EPSILON {
            return Self::new(-self.y, self.x);
        }

        let (sin, cos) = angle.to_radians().sin_cos();
        let (x, y) = (self.x as f64, self.y as f64);
        Self::new(round(x * cos + y * sin), round(y * cos - x * sin))
    }

    /// Rotates this point about `center`.
    #[must_use]
    pub fn rotate_about(self, center: Self, degrees: f64) -> Self {
        (self - center).rotate(degrees) + center
    }

    /// Scales this point away from `center` by `factor`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scale_about(self, center: Self, factor: f64) -> Self {
        let d = self - center;
        Self::new(round(d.x as f64 * factor), round(d.y as f64 * factor)) + center
    }

    /// Mirrors this point left-to-right about the vertical line `x = axis`.
    #[must_use]
    pub const fn mirror_x(self, axis: i64) -> Self {
        Self::new(2 * axis - self.x, self.y)
    }

    /// Midpoint between two points.
    #[must_use]
    pub const fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2, (self.y + other.y) / 2)
    }

    /// Floating point coordinates, as used by the polygon engine.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn to_f64(self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }

    /// Converts floating point coordinates back to the integer grid.
    #[must_use]
    pub fn from_f64(p: [f64; 2]) -> Self {
        Self::new(round(p[0]), round(p[1]))
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<i64> for Point {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Rounds to the nearest integer, halves away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round(value: f64) -> i64 {
    value.round() as i64
}

/// Normalises an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_angle_pos(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Normalises an angle in degrees into `(-360, 0]`.
#[must_use]
pub fn normalize_angle_neg(degrees: f64) -> f64 {
    let a = normalize_angle_pos(degrees);
    if a == 0.0 {
        0.0
    } else {
        a - 360.0
    }
}

/// Normalises an angle in degrees into `(-180, 180]`.
#[must_use]
pub fn normalize_angle_180(degrees: f64) -> f64 {
    let a = normalize_angle_pos(degrees);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}
