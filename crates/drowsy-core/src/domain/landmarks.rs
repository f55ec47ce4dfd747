//! Facial landmark types.
//!
//! The 68-point layout follows the iBUG 300-W convention:
//!
//! - 0-16: jaw outline (8 is the chin point)
//! - 17-26: eyebrows
//! - 27-35: nose (27 is the bridge top, 30 the tip)
//! - 36-41: left eye
//! - 42-47: right eye
//! - 48-67: mouth

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Number of points produced by the landmark predictor.
pub const LANDMARK_COUNT: usize = 68;

const LEFT_EYE_START: usize = 36;
const RIGHT_EYE_START: usize = 42;
const MOUTH_START: usize = 48;
const NOSE_TOP: usize = 27;
const NOSE_TIP: usize = 30;
const CHIN: usize = 8;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position in pixels.
    pub x: i32,
    /// Vertical position in pixels.
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A full 68-point landmark set for one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    points: [Point; LANDMARK_COUNT],
}

impl Landmarks {
    /// Wraps a fixed-size point array.
    #[must_use]
    pub const fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a landmark set from a slice, which must hold exactly 68 points.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not 68.
    pub fn from_slice(points: &[Point]) -> Result<Self> {
        let Ok(points) = <[Point; LANDMARK_COUNT]>::try_from(points) else {
            bail!(
                "expected {LANDMARK_COUNT} landmark points, got {}",
                points.len()
            );
        };
        Ok(Self { points })
    }

    /// All points in predictor order.
    #[must_use]
    pub const fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Points 36-41.
    #[must_use]
    pub fn left_eye(&self) -> [Point; 6] {
        self.group(LEFT_EYE_START)
    }

    /// Points 42-47.
    #[must_use]
    pub fn right_eye(&self) -> [Point; 6] {
        self.group(RIGHT_EYE_START)
    }

    /// Points 48-67.
    #[must_use]
    pub fn mouth(&self) -> [Point; 20] {
        self.group(MOUTH_START)
    }

    /// Point 27.
    #[must_use]
    pub const fn nose_top(&self) -> Point {
        self.points[NOSE_TOP]
    }

    /// Point 30.
    #[must_use]
    pub const fn nose_tip(&self) -> Point {
        self.points[NOSE_TIP]
    }

    /// Point 8.
    #[must_use]
    pub const fn chin(&self) -> Point {
        self.points[CHIN]
    }

    fn group<const N: usize>(&self, start: usize) -> [Point; N] {
        std::array::from_fn(|i| self.points[start + i])
    }
}

/// A detected face in pixel coordinates of the image it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
    /// Detector confidence (0.0 to 1.0).
    pub score: f32,
}

impl FaceBox {
    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}
