// src/landmark.rs
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::skeleton::LANDMARK_COUNT;

/// A single pose-model keypoint. `x`/`y` are normalized image coordinates,
/// `z` is the model's depth proxy (more negative = closer to the camera).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }

    /// Center x/y on the image, flip y so up is positive, and flip z so that
    /// depth into the screen becomes distance away from the viewer.
    pub fn to_scene_scaled(&self, scale: f64) -> Vector3<f64> {
        Vector3::new(
            (self.x - 0.5) * scale,
            -(self.y - 0.5) * scale,
            -self.z * scale,
        )
    }
}

/// Landmark `index` if it is part of the topology, present in this frame and
/// confident enough to use.
pub fn visible_landmark(landmarks: &[Landmark], index: usize, threshold: f64) -> Option<&Landmark> {
    if index >= LANDMARK_COUNT {
        return None;
    }
    landmarks.get(index).filter(|lm| lm.is_visible(threshold))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub frame_index: usize,
    pub timestamp_ms: u64,
    pub landmarks: Vec<Landmark>,
}

impl PoseFrame {
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// Pose sequence for one video, as returned by the pose service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseData {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub frame_count: usize,
    pub frames: Vec<PoseFrame>,
}

impl PoseData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut data: PoseData = serde_json::from_str(&content)?;
        if data.frame_count == 0 {
            data.frame_count = data.frames.len();
        }
        tracing::debug!(
            "Loaded {} pose frames from {}",
            data.frames.len(),
            path.as_ref().display()
        );
        Ok(data)
    }

    /// Frame at a position in the sequence (not by `frame_index`).
    pub fn frame(&self, position: usize) -> Option<&PoseFrame> {
        self.frames.get(position)
    }
}
