//! Facial geometry ratios computed from landmark subsets.
//!
//! Each ratio returns 0 when its denominator is 0, so degenerate landmark
//! placements never produce `NaN` or infinity.

// Ratios are stored as f32 features
#![allow(clippy::cast_possible_truncation)]

use crate::domain::Point;

/// Eye aspect ratio: vertical opening over horizontal width.
///
/// `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`. Low values indicate a closed eye.
#[must_use]
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> f32 {
    let a = eye[1].distance(eye[5]);
    let b = eye[2].distance(eye[4]);
    let c = eye[0].distance(eye[3]);

    if c == 0.0 {
        return 0.0;
    }
    ((a + b) / (2.0 * c)) as f32
}

/// Mouth opening ratio over the 20 mouth landmarks.
///
/// `(|p2-p10| + |p3-p9| + |p4-p8|) / (3 * |p0-p6|)`.
#[must_use]
pub fn mouth_opening_ratio(mouth: &[Point; 20]) -> f32 {
    let a = mouth[2].distance(mouth[10]);
    let b = mouth[3].distance(mouth[9]);
    let c = mouth[4].distance(mouth[8]);
    let d = mouth[0].distance(mouth[6]);

    if d == 0.0 {
        return 0.0;
    }
    ((a + b + c) / (3.0 * d)) as f32
}

/// Nose length relative to the nose-tip to chin distance.
#[must_use]
pub fn nose_length_ratio(nose_top: Point, nose_tip: Point, chin: Point) -> f32 {
    let a = nose_top.distance(nose_tip);
    let b = nose_tip.distance(chin);

    if b == 0.0 {
        return 0.0;
    }
    (a / b) as f32
}
