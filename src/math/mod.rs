//! Angle and direction helpers.
//!
//! Angles are `(pitch, yaw, roll)` in degrees, stored in a `Vector3` as
//! `x = pitch`, `y = yaw`, `z = roll`. Z is up.
//!
//! There are two pitch conventions in play. Orientation angles (what
//! `angle_to_vectors` takes) treat positive pitch as looking *down*. Angles
//! produced by `vector_to_angles` treat positive pitch as looking *up*; feed
//! those to `angle_to_aim_vectors`, which flips the pitch back.

use cgmath::{InnerSpace, Vector3};

/// Per-axis tolerance used by `vectors_equal`.
pub const EQUAL_EPSILON: f32 = 0.001;

/// Forward/right/up basis built from a set of angles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalVectors {
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

pub fn to_radians(degrees: f32) -> f32 {
    (degrees as f64).to_radians() as f32
}

pub fn to_degrees(radians: f32) -> f32 {
    (radians as f64).to_degrees() as f32
}

pub fn vec_to_radians(degrees: Vector3<f32>) -> Vector3<f32> {
    degrees.map(to_radians)
}

pub fn vec_to_degrees(radians: Vector3<f32>) -> Vector3<f32> {
    radians.map(to_degrees)
}

/// Converts a direction into `(pitch, yaw, 0)`, each in `[0, 360)`.
///
/// A vertical direction gets yaw 0 and pitch 90 (up) or 270 (down). The zero
/// vector counts as pointing down.
pub fn vector_to_angles(v: Vector3<f32>) -> Vector3<f32> {
    let (pitch, yaw);

    if v.x == 0.0 && v.y == 0.0 {
        yaw = 0.0;
        pitch = if v.z > 0.0 { 90.0 } else { 270.0 };
    } else {
        let mut y = (v.y as f64).atan2(v.x as f64).to_degrees() as f32;
        if y < 0.0 {
            y += 360.0;
        }
        yaw = y;

        let horizontal = ((v.x * v.x) + (v.y * v.y)).sqrt();
        let mut p = (v.z as f64).atan2(horizontal as f64).to_degrees() as f32;
        if p < 0.0 {
            p += 360.0;
        }
        pitch = p;
    }

    Vector3::new(pitch, yaw, 0.0)
}

struct SinCos {
    sp: f32, cp: f32,
    sy: f32, cy: f32,
    sr: f32, cr: f32,
}

fn sin_cos(angles: Vector3<f32>) -> SinCos {
    let sc = |deg: f32| {
        let rad = (deg as f64).to_radians();
        (rad.sin() as f32, rad.cos() as f32)
    };
    let (sp, cp) = sc(angles.x);
    let (sy, cy) = sc(angles.y);
    let (sr, cr) = sc(angles.z);
    SinCos { sp, cp, sy, cy, sr, cr }
}

/// Builds the forward/right/up basis for a set of orientation angles.
pub fn angle_to_vectors(angles: Vector3<f32>) -> DirectionalVectors {
    let SinCos { sp, cp, sy, cy, sr, cr } = sin_cos(angles);

    DirectionalVectors {
        forward: Vector3::new(cp * cy, cp * sy, -sp),
        right: Vector3::new(
            (-sr * sp * cy) + (cr * sy),
            (-sr * sp * sy) - (cr * cy),
            -sr * cp,
        ),
        up: Vector3::new(
            (cr * sp * cy) + (sr * sy),
            (cr * sp * sy) - (sr * cy),
            cr * cp,
        ),
    }
}

/// Same inputs as `angle_to_vectors`, but the result is the transposed
/// rotation matrix: each output vector is a *row* of the basis.
pub fn angle_to_vectors_transpose(angles: Vector3<f32>) -> DirectionalVectors {
    let SinCos { sp, cp, sy, cy, sr, cr } = sin_cos(angles);

    DirectionalVectors {
        forward: Vector3::new(
            cp * cy,
            (sr * sp * cy) - (cr * sy),
            (cr * sp * cy) + (sr * sy),
        ),
        right: Vector3::new(
            cp * sy,
            (sr * sp * sy) + (cr * cy),
            (cr * sp * sy) - (sr * cy),
        ),
        up: Vector3::new(-sp, sr * cp, cr * cp),
    }
}

/// `angle_to_vectors` for aim angles, where positive pitch looks up.
pub fn angle_to_aim_vectors(mut angles: Vector3<f32>) -> DirectionalVectors {
    angles.x = -angles.x;
    angle_to_vectors(angles)
}

/// Angle between two vectors in degrees. Zero if either has zero length.
pub fn angle_between_vectors(v1: Vector3<f32>, v2: Vector3<f32>) -> f32 {
    let l1 = v1.magnitude();
    let l2 = v2.magnitude();

    if l1 == 0.0 || l2 == 0.0 {
        return 0.0;
    }

    let cos = (v1.dot(v2) / (l1 * l2)).max(-1.0).min(1.0);
    to_degrees(cos.acos())
}

/// Whether every component of `lhs` is within `EQUAL_EPSILON` of `rhs`.
pub fn vectors_equal(lhs: Vector3<f32>, rhs: Vector3<f32>) -> bool {
    (lhs.x - rhs.x).abs() <= EQUAL_EPSILON
        && (lhs.y - rhs.y).abs() <= EQUAL_EPSILON
        && (lhs.z - rhs.z).abs() <= EQUAL_EPSILON
}

/// Formats as `"x y z"`, the form used in entity key-values.
pub fn vector_to_string(v: Vector3<f32>) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}
