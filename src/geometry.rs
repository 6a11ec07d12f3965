// src/geometry.rs - body frame and joint angle geometry
//!
//! Everything here is a pure function of its arguments. Missing landmarks and
//! degenerate vectors come back as `None` instead of NaN.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::{MeasurementConfig, DEFAULT_MIN_VECTOR_LENGTH};
use crate::error::Error;
use crate::landmark::{visible_landmark, Landmark};
use crate::skeleton::{LEFT_HIP, LEFT_SHOULDER, RIGHT_HIP, RIGHT_SHOULDER};

/// Anatomical planes, in dominant-plane tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Sagittal,
    Frontal,
    Transverse,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Sagittal, Plane::Frontal, Plane::Transverse];

    pub fn name(&self) -> &'static str {
        match self {
            Plane::Sagittal => "sagittal",
            Plane::Frontal => "frontal",
            Plane::Transverse => "transverse",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Plane {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sagittal" => Ok(Plane::Sagittal),
            "frontal" => Ok(Plane::Frontal),
            "transverse" => Ok(Plane::Transverse),
            other => Err(Error::InvalidPlane(other.to_string())),
        }
    }
}

/// Subject-relative orthonormal frame anchored at the hip midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyFrame {
    /// Medio-lateral axis, toward the subject's right hip
    pub right: Vector3<f64>,
    /// Superior axis, hips toward shoulders
    pub up: Vector3<f64>,
    /// Antero-posterior axis, `right × up`. Its sign follows the hip order,
    /// so it is not guaranteed to point anterior.
    pub forward: Vector3<f64>,
    /// Hip midpoint
    pub origin: Vector3<f64>,
}

impl BodyFrame {
    /// Build the frame from scene-space hip and shoulder points. Returns `None`
    /// when the hips coincide or the torso has no extent perpendicular to the
    /// hip line.
    pub fn from_points(
        left_hip: Vector3<f64>,
        right_hip: Vector3<f64>,
        left_shoulder: Vector3<f64>,
        right_shoulder: Vector3<f64>,
        min_len: f64,
    ) -> Option<Self> {
        let origin = (left_hip + right_hip) * 0.5;
        let right = (right_hip - left_hip).try_normalize(min_len)?;

        let shoulder_center = (left_shoulder + right_shoulder) * 0.5;
        let raw_up = shoulder_center - origin;
        // Gram-Schmidt against the hip line so a twisted torso stays orthogonal
        let up = (raw_up - right * raw_up.dot(&right)).try_normalize(min_len)?;

        let forward = right.cross(&up).try_normalize(min_len)?;

        Some(Self { right, up, forward, origin })
    }

    /// Build the frame from a landmark set, or `None` if a hip or shoulder is
    /// missing or below the visibility threshold.
    pub fn from_landmarks(landmarks: &[Landmark], config: &MeasurementConfig) -> Option<Self> {
        let point = |index: usize| {
            visible_landmark(landmarks, index, config.visibility_threshold)
                .map(|lm| lm.to_scene_scaled(config.scene_scale))
        };

        Self::from_points(
            point(LEFT_HIP)?,
            point(RIGHT_HIP)?,
            point(LEFT_SHOULDER)?,
            point(RIGHT_SHOULDER)?,
            config.min_vector_length,
        )
    }

    /// Normal of an anatomical plane: right for sagittal, forward for frontal,
    /// up for transverse.
    pub fn normal(&self, plane: Plane) -> Vector3<f64> {
        match plane {
            Plane::Sagittal => self.right,
            Plane::Frontal => self.forward,
            Plane::Transverse => self.up,
        }
    }
}

pub fn build_body_frame(landmarks: &[Landmark], config: &MeasurementConfig) -> Option<BodyFrame> {
    BodyFrame::from_landmarks(landmarks, config)
}

/// Unsigned angle in degrees between two vectors, or `None` if either is
/// shorter than `min_len`.
pub fn vector_angle(va: &Vector3<f64>, vb: &Vector3<f64>, min_len: f64) -> Option<f64> {
    let (la, lb) = (va.norm(), vb.norm());
    if la < min_len || lb < min_len {
        return None;
    }
    let cos_angle = (va.dot(vb) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

/// Angle at `joint` between the bones to `outer_a` and `outer_b`.
pub fn try_segment_angle(
    joint: &Vector3<f64>,
    outer_a: &Vector3<f64>,
    outer_b: &Vector3<f64>,
    min_len: f64,
) -> Option<f64> {
    vector_angle(&(outer_a - joint), &(outer_b - joint), min_len)
}

/// Angle at `joint` in degrees, in [0, 180]. A zero-length bone yields 0.
pub fn angle_between_segments(
    joint: &Vector3<f64>,
    outer_a: &Vector3<f64>,
    outer_b: &Vector3<f64>,
) -> f64 {
    try_segment_angle(joint, outer_a, outer_b, DEFAULT_MIN_VECTOR_LENGTH).unwrap_or(0.0)
}

/// Remove the component of `v` along the unit `normal`.
pub fn project_onto_plane(v: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    v - normal * v.dot(normal)
}

/// Angle between `va` and `vb` once both are flattened onto the plane with
/// the given normal. `None` when either bone points straight out of the plane.
pub fn projected_angle(
    va: &Vector3<f64>,
    vb: &Vector3<f64>,
    normal: &Vector3<f64>,
    min_len: f64,
) -> Option<f64> {
    vector_angle(
        &project_onto_plane(va, normal),
        &project_onto_plane(vb, normal),
        min_len,
    )
}

/// Per-plane joint angles in degrees. `None` marks a plane in which the
/// angle is undefined, which is distinct from a measured 0°.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneAngles {
    pub sagittal: Option<f64>,
    pub frontal: Option<f64>,
    pub transverse: Option<f64>,
}

impl PlaneAngles {
    pub fn get(&self, plane: Plane) -> Option<f64> {
        match plane {
            Plane::Sagittal => self.sagittal,
            Plane::Frontal => self.frontal,
            Plane::Transverse => self.transverse,
        }
    }

    /// Display value with undefined planes shown as 0°.
    pub fn or_zero(&self, plane: Plane) -> f64 {
        self.get(plane).unwrap_or(0.0)
    }

    /// Plane with the largest defined angle. Ties go to the earlier plane in
    /// [`Plane::ALL`].
    pub fn dominant(&self) -> Option<Plane> {
        let mut best: Option<(Plane, f64)> = None;
        for plane in Plane::ALL {
            if let Some(value) = self.get(plane) {
                match best {
                    Some((_, best_value)) if best_value >= value => {}
                    _ => best = Some((plane, value)),
                }
            }
        }
        best.map(|(plane, _)| plane)
    }
}

pub fn plane_angles(
    joint: &Vector3<f64>,
    outer_a: &Vector3<f64>,
    outer_b: &Vector3<f64>,
    frame: &BodyFrame,
    min_len: f64,
) -> PlaneAngles {
    let va = outer_a - joint;
    let vb = outer_b - joint;
    let angle = |plane| projected_angle(&va, &vb, &frame.normal(plane), min_len);

    PlaneAngles {
        sagittal: angle(Plane::Sagittal),
        frontal: angle(Plane::Frontal),
        transverse: angle(Plane::Transverse),
    }
}
