// src/measurement.rs - per-frame joint angle measurement
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::MeasurementConfig;
use crate::error::{Error, Result};
use crate::geometry::{plane_angles, try_segment_angle, BodyFrame, Plane, PlaneAngles};
use crate::landmark::{visible_landmark, Landmark, PoseFrame};
use crate::selection::{outer_endpoints, shared_joint, Edge, EdgeSelection, SelectionEvent};
use crate::skeleton::{joint_name, plane_movements};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredAngle {
    pub joint_index: usize,
    pub joint_name: String,
    pub edge_a: Edge,
    pub edge_b: Edge,
    /// Unsigned 3D angle at the joint
    pub degrees: f64,
    /// Absent when no body frame could be built for the frame
    pub plane_angles: Option<PlaneAngles>,
}

impl MeasuredAngle {
    pub fn dominant_plane(&self) -> Option<Plane> {
        self.plane_angles.as_ref().and_then(PlaneAngles::dominant)
    }

    /// The pinned plane if there is one, otherwise the dominant plane.
    pub fn active_plane(&self, pinned: Option<Plane>) -> Option<Plane> {
        pinned.or_else(|| self.dominant_plane())
    }

    /// Clinical movement name for the active plane at this joint.
    pub fn movement(&self, pinned: Option<Plane>) -> Option<&'static str> {
        let plane = self.active_plane(pinned)?;
        plane_movements(self.joint_index).map(|m| m.get(plane))
    }

    /// e.g. `"Left Elbow — Flex / Ext @ 0:03.2"`
    pub fn label(&self, pinned: Option<Plane>, timestamp_ms: u64) -> String {
        let mut parts = vec![self.joint_name.clone()];
        if let Some(movement) = self.movement(pinned) {
            parts.push(format!("— {}", movement));
        }
        parts.push(format!("@ {}", format_timestamp(timestamp_ms)));
        parts.join(" ")
    }
}

/// `m:ss.s`
pub fn format_timestamp(timestamp_ms: u64) -> String {
    let tenths = timestamp_ms.saturating_add(50) / 100;
    let minutes = tenths / 600;
    let rem = tenths % 600;
    format!("{}:{:02}.{}", minutes, rem / 10, rem % 10)
}

/// Measure the angle at the joint shared by `edge_a` and `edge_b`.
///
/// Returns `None` when the edges do not meet at a single joint, when the
/// joint or either outer landmark is missing, or when a bone has zero length.
/// Plane angles are attached only if a body frame is available.
pub fn measure_angle(
    landmarks: &[Landmark],
    edge_a: Edge,
    edge_b: Edge,
    config: &MeasurementConfig,
) -> Option<MeasuredAngle> {
    let joint_index = shared_joint(edge_a, edge_b)?;
    let (outer_a, outer_b) = outer_endpoints(edge_a, edge_b, joint_index);

    let point = |index: usize| {
        visible_landmark(landmarks, index, config.visibility_threshold)
            .map(|lm| lm.to_scene_scaled(config.scene_scale))
    };
    let joint = point(joint_index)?;
    let a = point(outer_a)?;
    let b = point(outer_b)?;

    let degrees = try_segment_angle(&joint, &a, &b, config.min_vector_length)?;

    let plane_angles = match BodyFrame::from_landmarks(landmarks, config) {
        Some(frame) => Some(plane_angles(&joint, &a, &b, &frame, config.min_vector_length)),
        None => {
            debug!("No body frame available, reporting 3D angle only");
            None
        }
    };

    Some(MeasuredAngle {
        joint_index,
        joint_name: joint_name(joint_index),
        edge_a,
        edge_b,
        degrees,
        plane_angles,
    })
}

/// Like [`measure_angle`], but reports why nothing could be measured.
pub fn try_measure_angle(
    landmarks: &[Landmark],
    edge_a: Edge,
    edge_b: Edge,
    config: &MeasurementConfig,
) -> Result<Option<MeasuredAngle>> {
    if shared_joint(edge_a, edge_b).is_none() {
        return Err(Error::InvalidSelection { edge_a, edge_b });
    }
    Ok(measure_angle(landmarks, edge_a, edge_b, config))
}

/// User-side measurement state: the edge selection and the pinned plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementSession {
    pub selection: EdgeSelection,
    pub pinned_plane: Option<Plane>,
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(edge_a: Edge, edge_b: Edge) -> Self {
        Self {
            selection: EdgeSelection::with_pair(edge_a, edge_b),
            pinned_plane: None,
        }
    }

    pub fn add_edge(&mut self, edge: Edge) -> SelectionEvent {
        self.selection.add(edge)
    }

    /// Drop both edges and the pinned plane.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.pinned_plane = None;
    }

    pub fn pin(&mut self, plane: Option<Plane>) {
        self.pinned_plane = plane;
    }

    /// Pin `plane`, or unpin it if it is already pinned.
    pub fn toggle_pin(&mut self, plane: Plane) {
        self.pinned_plane = if self.pinned_plane == Some(plane) {
            None
        } else {
            Some(plane)
        };
    }

    pub fn measure(
        &self,
        landmarks: &[Landmark],
        config: &MeasurementConfig,
    ) -> Option<MeasuredAngle> {
        let (edge_a, edge_b) = self.selection.pair()?;
        measure_angle(landmarks, edge_a, edge_b, config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    frame_index: usize,
    timestamp_ms: u64,
    edge_a: Edge,
    edge_b: Edge,
}

/// Holds the last measurement and recomputes only when the frame or the edge
/// pair changes. Call [`invalidate`](Self::invalidate) when the landmark set
/// is replaced.
#[derive(Debug, Default)]
pub struct MeasurementCache {
    key: Option<CacheKey>,
    value: Option<MeasuredAngle>,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_measure(
        &mut self,
        frame: &PoseFrame,
        session: &MeasurementSession,
        config: &MeasurementConfig,
    ) -> Option<&MeasuredAngle> {
        let Some((edge_a, edge_b)) = session.selection.pair() else {
            self.invalidate();
            return None;
        };
        let key = CacheKey {
            frame_index: frame.frame_index,
            timestamp_ms: frame.timestamp_ms,
            edge_a,
            edge_b,
        };

        if self.key != Some(key) {
            self.value = measure_angle(&frame.landmarks, edge_a, edge_b, config);
            self.key = Some(key);
        }
        self.value.as_ref()
    }

    /// Whether a lookup with these inputs would be served from the cache.
    pub fn is_fresh(&self, frame: &PoseFrame, session: &MeasurementSession) -> bool {
        match (self.key, session.selection.pair()) {
            (Some(key), Some((edge_a, edge_b))) => {
                key.frame_index == frame.frame_index
                    && key.timestamp_ms == frame.timestamp_ms
                    && key.edge_a == edge_a
                    && key.edge_b == edge_b
            }
            _ => false,
        }
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.value = None;
    }
}

/// A measurement the user chose to keep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedMeasurement {
    pub id: Uuid,
    pub frame_index: usize,
    pub frame_timestamp_ms: u64,
    pub joint_index: usize,
    pub edge_a: Edge,
    pub edge_b: Edge,
    pub angle_degrees: f64,
    pub plane: Option<Plane>,
    pub plane_degrees: Option<f64>,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

/// Saved measurements, newest first.
#[derive(Debug, Clone, Default)]
pub struct MeasurementHistory {
    entries: Vec<SavedMeasurement>,
}

impl MeasurementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `measured` for `frame` under the session's pinned plane, then
    /// clear the session for the next measurement.
    pub fn save(
        &mut self,
        frame: &PoseFrame,
        measured: &MeasuredAngle,
        session: &mut MeasurementSession,
    ) -> &SavedMeasurement {
        let plane = measured.active_plane(session.pinned_plane);
        let plane_degrees = plane
            .zip(measured.plane_angles)
            .and_then(|(plane, angles)| angles.get(plane));

        let saved = SavedMeasurement {
            id: Uuid::new_v4(),
            frame_index: frame.frame_index,
            frame_timestamp_ms: frame.timestamp_ms,
            joint_index: measured.joint_index,
            edge_a: measured.edge_a,
            edge_b: measured.edge_b,
            angle_degrees: measured.degrees,
            plane,
            plane_degrees,
            label: measured.label(session.pinned_plane, frame.timestamp_ms),
            created_at: Utc::now(),
        };
        debug!("Saved measurement {} ({})", saved.id, saved.label);

        session.clear();
        self.entries.insert(0, saved);
        &self.entries[0]
    }

    pub fn entries(&self) -> &[SavedMeasurement] {
        &self.entries
    }

    pub fn remove(&mut self, id: Uuid) -> Option<SavedMeasurement> {
        let position = self.entries.iter().position(|m| m.id == id)?;
        Some(self.entries.remove(position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
