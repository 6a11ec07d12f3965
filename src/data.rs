// src/data.rs - angle time series, range of motion and exports
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use tracing::info;

use crate::config::MeasurementConfig;
use crate::error::Result;
use crate::geometry::{plane_angles, try_segment_angle, BodyFrame, Plane, PlaneAngles};
use crate::landmark::{visible_landmark, PoseFrame};
use crate::measurement::SavedMeasurement;
use crate::selection::{outer_endpoints, shared_joint, Edge};
use crate::skeleton::{edge_name, joint_name};

/// One point of the angle-over-time chart.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub t: f64,
    pub frame_index: usize,
    pub angle: f64,
    pub plane_angles: Option<PlaneAngles>,
    /// Normalized image position of the joint
    pub joint_x: f64,
    pub joint_y: f64,
}

impl FrameSample {
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Angle3d => Some(self.angle),
            Channel::Plane(plane) => self.plane_angles.and_then(|p| p.get(plane)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Angle3d,
    Plane(Plane),
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Angle3d,
        Channel::Plane(Plane::Sagittal),
        Channel::Plane(Plane::Frontal),
        Channel::Plane(Plane::Transverse),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Angle3d => "3D",
            Channel::Plane(Plane::Sagittal) => "Sagittal",
            Channel::Plane(Plane::Frontal) => "Frontal",
            Channel::Plane(Plane::Transverse) => "Transverse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeOfMotion {
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

impl RangeOfMotion {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Angle of one joint across a frame sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSeries {
    pub joint_index: usize,
    pub edge_a: Edge,
    pub edge_b: Edge,
    pub samples: Vec<FrameSample>,
}

impl AngleSeries {
    /// Sample every frame where the joint and both outer landmarks are
    /// present. `None` if the edges do not meet at a joint or no frame
    /// qualifies.
    pub fn build(
        frames: &[PoseFrame],
        edge_a: Edge,
        edge_b: Edge,
        config: &MeasurementConfig,
    ) -> Option<Self> {
        let joint_index = shared_joint(edge_a, edge_b)?;
        let (outer_a, outer_b) = outer_endpoints(edge_a, edge_b, joint_index);

        let samples: Vec<FrameSample> = frames
            .iter()
            .filter_map(|frame| {
                let lms = &frame.landmarks;
                let threshold = config.visibility_threshold;
                let joint_lm = visible_landmark(lms, joint_index, threshold)?;
                let a_lm = visible_landmark(lms, outer_a, threshold)?;
                let b_lm = visible_landmark(lms, outer_b, threshold)?;

                let joint = joint_lm.to_scene_scaled(config.scene_scale);
                let a = a_lm.to_scene_scaled(config.scene_scale);
                let b = b_lm.to_scene_scaled(config.scene_scale);

                let angle = try_segment_angle(&joint, &a, &b, config.min_vector_length)?;
                let planes = BodyFrame::from_landmarks(lms, config)
                    .map(|body| plane_angles(&joint, &a, &b, &body, config.min_vector_length));

                Some(FrameSample {
                    t: frame.timestamp_secs(),
                    frame_index: frame.frame_index,
                    angle,
                    plane_angles: planes,
                    joint_x: joint_lm.x,
                    joint_y: joint_lm.y,
                })
            })
            .collect();

        if samples.is_empty() {
            return None;
        }

        Some(Self {
            joint_index,
            edge_a,
            edge_b,
            samples,
        })
    }

    pub fn joint_name(&self) -> String {
        joint_name(self.joint_index)
    }

    /// The sample for `frame_index`, or the closest one when that frame was
    /// skipped.
    pub fn nearest(&self, frame_index: usize) -> Option<&FrameSample> {
        self.samples
            .iter()
            .find(|s| s.frame_index == frame_index)
            .or_else(|| {
                self.samples
                    .iter()
                    .min_by_key(|s| s.frame_index.abs_diff(frame_index))
            })
    }

    /// Min and max of a channel over the samples where it is defined.
    pub fn range_of_motion(&self, channel: Channel) -> Option<RangeOfMotion> {
        self.samples
            .iter()
            .filter_map(|s| s.channel(channel))
            .fold(None, |acc: Option<RangeOfMotion>, value| {
                Some(match acc {
                    None => RangeOfMotion { min: value, max: value, samples: 1 },
                    Some(rom) => RangeOfMotion {
                        min: rom.min.min(value),
                        max: rom.max.max(value),
                        samples: rom.samples + 1,
                    },
                })
            })
    }

    pub fn duration_secs(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct SeriesRecord {
    time_s: f64,
    frame: usize,
    joint_index: usize,
    angle: f64,
    sagittal: Option<f64>,
    frontal: Option<f64>,
    transverse: Option<f64>,
    joint_x: f64,
    joint_y: f64,
}

#[derive(Debug, Serialize)]
struct MeasurementRecord {
    id: String,
    frame: usize,
    timestamp_ms: u64,
    joint_index: usize,
    edge_a: String,
    edge_b: String,
    angle_degrees: f64,
    plane: Option<String>,
    plane_degrees: Option<f64>,
    label: String,
    created_at: String,
}

pub struct DataExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl DataExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.session_dir().join(file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    pub fn export_series_csv(&self, series: &AngleSeries) -> Result<PathBuf> {
        let csv_path = self.prepare("angle_series.csv")?;
        let mut writer = Writer::from_writer(File::create(&csv_path)?);

        for sample in &series.samples {
            writer.serialize(SeriesRecord {
                time_s: sample.t,
                frame: sample.frame_index,
                joint_index: series.joint_index,
                angle: sample.angle,
                sagittal: sample.channel(Channel::Plane(Plane::Sagittal)),
                frontal: sample.channel(Channel::Plane(Plane::Frontal)),
                transverse: sample.channel(Channel::Plane(Plane::Transverse)),
                joint_x: sample.joint_x,
                joint_y: sample.joint_y,
            })?;
        }

        writer.flush()?;
        info!("Wrote {} samples to {}", series.samples.len(), csv_path.display());
        Ok(csv_path)
    }

    /// Append saved measurements to the session's `measurements.csv`. The
    /// header is written only when the file is created.
    pub fn export_measurements_csv(&self, measurements: &[SavedMeasurement]) -> Result<PathBuf> {
        let csv_path = self.prepare("measurements.csv")?;
        let is_new = !csv_path.exists();
        let file = OpenOptions::new().append(true).create(true).open(&csv_path)?;
        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);

        for m in measurements {
            writer.serialize(MeasurementRecord {
                id: m.id.to_string(),
                frame: m.frame_index,
                timestamp_ms: m.frame_timestamp_ms,
                joint_index: m.joint_index,
                edge_a: format!("{}-{}", m.edge_a.a, m.edge_a.b),
                edge_b: format!("{}-{}", m.edge_b.a, m.edge_b.b),
                angle_degrees: m.angle_degrees,
                plane: m.plane.map(|p| p.to_string()),
                plane_degrees: m.plane_degrees,
                label: m.label.clone(),
                created_at: m.created_at.to_rfc3339(),
            })?;
        }

        writer.flush()?;
        info!("Wrote {} measurements to {}", measurements.len(), csv_path.display());
        Ok(csv_path)
    }

    pub fn generate_report(&self, series: &AngleSeries) -> Result<PathBuf> {
        let report_path = self.prepare("report.html")?;
        std::fs::write(&report_path, self.create_html_report(series))?;
        info!("Wrote report to {}", report_path.display());
        Ok(report_path)
    }

    fn create_html_report(&self, series: &AngleSeries) -> String {
        let rows: String = Channel::ALL
            .iter()
            .map(|&channel| match series.range_of_motion(channel) {
                Some(rom) => format!(
                    "            <tr><td>{}</td><td>{:.1}°</td><td>{:.1}°</td>\
                     <td>{:.1}°</td><td>{}</td></tr>\n",
                    channel.label(),
                    rom.min,
                    rom.max,
                    rom.range(),
                    rom.samples
                ),
                None => format!(
                    "            <tr><td>{}</td><td colspan=\"4\">unavailable</td></tr>\n",
                    channel.label()
                ),
            })
            .collect();

        format!(r#"
<!DOCTYPE html>
<html>
<head>
    <title>Joint Angle Report - {session}</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 40px;
            background: #f5f5f5;
        }}
        h1 {{ color: #333; }}
        .stats {{
            background: white;
            padding: 20px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
        td, th {{ padding: 4px 12px; text-align: left; }}
    </style>
</head>
<body>
    <h1>{joint} · Angle over Time</h1>
    <div class="stats">
        <h2>Session: {session}</h2>
        <div class="stat-item">
            <span class="stat-label">Bones:</span>
            <span class="stat-value">{edge_a} / {edge_b}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Samples:</span>
            <span class="stat-value">{samples} frames over {duration:.1} s</span>
        </div>
        <table>
            <tr><th>Channel</th><th>Min</th><th>Max</th><th>Range</th><th>Samples</th></tr>
{rows}        </table>
    </div>
</body>
</html>
"#,
            session = self.session_name,
            joint = series.joint_name(),
            edge_a = edge_name(series.edge_a),
            edge_b = edge_name(series.edge_b),
            samples = series.samples.len(),
            duration = series.duration_secs(),
            rows = rows,
        )
    }
}
