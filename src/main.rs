// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use angle_tracker::data::{AngleSeries, DataExporter};
use angle_tracker::live::LiveMeasurer;
use angle_tracker::measurement::{try_measure_angle, MeasurementHistory};
use angle_tracker::skeleton::{is_bone, is_measurable, joint_name};
use angle_tracker::{
    BodyFrame, Edge, Error, MeasurementConfig, MeasurementSession, Plane, PoseData, PoseFrame,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure the joint angle in one frame
    Measure {
        /// Pose data JSON file
        #[arg(long)]
        poses: PathBuf,

        /// Position of the frame in the sequence
        #[arg(long, default_value = "0")]
        frame: usize,

        /// First bone, e.g. 11,13
        #[arg(long)]
        edge_a: Edge,

        /// Second bone, e.g. 13,15
        #[arg(long)]
        edge_b: Edge,

        /// Report this plane instead of the dominant one
        #[arg(long)]
        pin: Option<Plane>,

        /// Append the measurement to measurements.csv
        #[arg(long)]
        save: bool,

        /// Output directory for --save
        #[arg(long)]
        out: Option<PathBuf>,

        /// Session name for --save
        #[arg(long)]
        session: Option<String>,
    },

    /// Export the joint angle across every frame
    Series {
        #[arg(long)]
        poses: PathBuf,

        #[arg(long)]
        edge_a: Edge,

        #[arg(long)]
        edge_b: Edge,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        session: Option<String>,
    },

    /// Measure newline-delimited JSON pose frames read from stdin
    Live {
        #[arg(long)]
        edge_a: Edge,

        #[arg(long)]
        edge_b: Edge,

        #[arg(long)]
        pin: Option<Plane>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => MeasurementConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MeasurementConfig::default(),
    };

    match args.command {
        Command::Measure {
            poses,
            frame,
            edge_a,
            edge_b,
            pin,
            save,
            out,
            session,
        } => run_measure(&config, poses, frame, edge_a, edge_b, pin, save, out, session),
        Command::Series {
            poses,
            edge_a,
            edge_b,
            out,
            session,
        } => run_series(&config, poses, edge_a, edge_b, out, session),
        Command::Live { edge_a, edge_b, pin } => run_live(config, edge_a, edge_b, pin).await,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_measure(
    config: &MeasurementConfig,
    poses: PathBuf,
    position: usize,
    edge_a: Edge,
    edge_b: Edge,
    pin: Option<Plane>,
    save: bool,
    out: Option<PathBuf>,
    session_name: Option<String>,
) -> Result<()> {
    let data = PoseData::load(&poses)
        .with_context(|| format!("Failed to load pose data {}", poses.display()))?;
    let frame = data.frame(position).ok_or(Error::FrameOutOfRange {
        index: position,
        len: data.frames.len(),
    })?;

    let mut session = MeasurementSession::with_pair(edge_a, edge_b);
    session.pin(pin);

    warn_unusual_selection(edge_a, edge_b);
    let measured = try_measure_angle(&frame.landmarks, edge_a, edge_b, config)?;
    let body_frame = BodyFrame::from_landmarks(&frame.landmarks, config);

    let output = match &measured {
        Some(m) => serde_json::json!({
            "frame_index": frame.frame_index,
            "measurement": m,
            "active_plane": m.active_plane(pin),
            "movement": m.movement(pin),
            "label": m.label(pin, frame.timestamp_ms),
            "body_frame": body_frame,
        }),
        None => {
            warn!("Joint or bone landmarks missing in frame {}", frame.frame_index);
            serde_json::json!({
                "frame_index": frame.frame_index,
                "measurement": null,
                "body_frame": body_frame,
            })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if save {
        let Some(m) = measured else {
            anyhow::bail!("Nothing to save: angle unavailable in frame {}", frame.frame_index);
        };
        let mut history = MeasurementHistory::new();
        history.save(frame, &m, &mut session);

        let out = out.unwrap_or_else(|| config.output_directory.clone());
        let exporter = DataExporter::new(out, session_name);
        let path = exporter.export_measurements_csv(history.entries())?;
        println!("{}", path.display());
    }
    Ok(())
}

fn run_series(
    config: &MeasurementConfig,
    poses: PathBuf,
    edge_a: Edge,
    edge_b: Edge,
    out: Option<PathBuf>,
    session_name: Option<String>,
) -> Result<()> {
    let data = PoseData::load(&poses)
        .with_context(|| format!("Failed to load pose data {}", poses.display()))?;

    let series = AngleSeries::build(&data.frames, edge_a, edge_b, config).ok_or_else(|| {
        anyhow::anyhow!(
            "No angle series for edges {} and {}: no shared joint or no usable frames",
            edge_a,
            edge_b
        )
    })?;
    info!(
        "{}: {} of {} frames measured",
        series.joint_name(),
        series.samples.len(),
        data.frames.len()
    );

    let out = out.unwrap_or_else(|| config.output_directory.clone());
    let exporter = DataExporter::new(out, session_name);
    let csv_path = exporter.export_series_csv(&series)?;
    let report_path = exporter.generate_report(&series)?;

    println!("{}", csv_path.display());
    println!("{}", report_path.display());
    Ok(())
}

/// Edges outside the skeleton or a vertex without movement names still
/// measure, but are usually a typo.
fn warn_unusual_selection(edge_a: Edge, edge_b: Edge) {
    for edge in [edge_a, edge_b] {
        if !is_bone(edge) {
            warn!("Edge {} is not a skeleton bone", edge);
        }
    }
    if let Some(joint) = angle_tracker::shared_joint(edge_a, edge_b) {
        if !is_measurable(joint) {
            warn!("{} is not a major joint; no movement names", joint_name(joint));
        }
    }
}

async fn run_live(
    config: MeasurementConfig,
    edge_a: Edge,
    edge_b: Edge,
    pin: Option<Plane>,
) -> Result<()> {
    let mut session = MeasurementSession::with_pair(edge_a, edge_b);
    warn_unusual_selection(edge_a, edge_b);
    if session.selection.pair().is_none() {
        return Err(Error::InvalidSelection { edge_a, edge_b }.into());
    }
    session.pin(pin);

    let (frame_tx, frame_rx) = watch::channel::<Option<PoseFrame>>(None);
    let (_session_tx, session_rx) = watch::channel(session);
    let (reading_tx, mut reading_rx) = mpsc::channel(64);

    let measurer = tokio::spawn(LiveMeasurer::new(config).run(frame_rx, session_rx, reading_tx));

    let printer = tokio::spawn(async move {
        while let Some(reading) = reading_rx.recv().await {
            match serde_json::to_string(&reading) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode reading: {}", e),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PoseFrame>(&line) {
            Ok(frame) => {
                frame_tx.send_replace(Some(frame));
            }
            Err(e) => warn!("Skipping malformed frame: {}", e),
        }
    }
    drop(frame_tx);

    let stats = measurer.await?;
    printer.await?;
    info!("Processed {} readings", stats.readings);
    Ok(())
}
