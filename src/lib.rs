//! Anatomical joint-angle measurement for 33-point pose landmarks.
//!
//! Given a frame of pose landmarks and two bones that meet at a joint, this
//! crate computes the 3D angle at that joint and the same angle within each
//! of the subject's sagittal, frontal and transverse planes. The planes come
//! from a body frame built out of the hips and shoulders, so the numbers do
//! not depend on where the camera stands.
//!
//! The same calls serve a single paused frame, a whole recorded sequence
//! (see [`data::AngleSeries`]) and a live landmark stream (see
//! [`live::LiveMeasurer`]).
//!
//! # Example
//!
//! ```no_run
//! use angle_tracker::{measure_angle, Edge, MeasurementConfig, PoseData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let poses = PoseData::load("poses.json")?;
//! let config = MeasurementConfig::default();
//!
//! let frame = &poses.frames[0];
//! // Upper arm and forearm meet at the left elbow (13)
//! let (upper_arm, forearm) = (Edge::new(11, 13), Edge::new(13, 15));
//! if let Some(m) = measure_angle(&frame.landmarks, upper_arm, forearm, &config) {
//!     println!("{}: {:.1}°", m.joint_name, m.degrees);
//!     if let Some(planes) = m.plane_angles {
//!         println!("sagittal {:?}", planes.sagittal);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod landmark;
pub mod live;
pub mod measurement;
pub mod selection;
pub mod skeleton;

pub use config::MeasurementConfig;
pub use error::{Error, Result};
pub use geometry::{
    angle_between_segments, build_body_frame, plane_angles, BodyFrame, Plane, PlaneAngles,
};
pub use landmark::{Landmark, PoseData, PoseFrame};
pub use measurement::{measure_angle, MeasuredAngle, MeasurementSession};
pub use selection::{outer_endpoints, shared_joint, Edge, EdgeSelection};
