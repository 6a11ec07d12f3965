// src/live.rs - fixed-cadence measurement over a live landmark stream
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::MeasurementConfig;
use crate::geometry::{BodyFrame, Plane};
use crate::landmark::PoseFrame;
use crate::measurement::{MeasuredAngle, MeasurementCache, MeasurementSession};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReading {
    pub frame_index: usize,
    pub timestamp_ms: u64,
    /// `None` while the selection is incomplete or the joint is not visible
    pub measurement: Option<MeasuredAngle>,
    pub active_plane: Option<Plane>,
    pub movement: Option<&'static str>,
    pub body_frame: Option<BodyFrame>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub ticks: u64,
    pub readings: u64,
}

pub struct LiveMeasurer {
    config: MeasurementConfig,
    cache: MeasurementCache,
    last: Option<(usize, u64, MeasurementSession)>,
    stats: LiveStats,
}

impl LiveMeasurer {
    pub fn new(config: MeasurementConfig) -> Self {
        Self {
            config,
            cache: MeasurementCache::new(),
            last: None,
            stats: LiveStats::default(),
        }
    }

    /// Measure the most recent frame once per tick and send a reading
    /// whenever the frame or the session differs from the last reading.
    ///
    /// Returns when the frame sender is dropped or nobody listens for
    /// readings any more.
    pub async fn run(
        mut self,
        mut frames: watch::Receiver<Option<PoseFrame>>,
        mut session: watch::Receiver<MeasurementSession>,
        readings: mpsc::Sender<LiveReading>,
    ) -> LiveStats {
        let mut interval = tokio::time::interval(self.config.live_cadence());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Live measurement started (tick={}ms)", self.config.live_cadence_ms);

        loop {
            interval.tick().await;
            self.stats.ticks += 1;

            let closed = frames.has_changed().is_err();
            let frame = frames.borrow_and_update().clone();
            let current_session = session.borrow_and_update().clone();

            if let Some(frame) = frame {
                if let Some(reading) = self.step(&frame, &current_session) {
                    if readings.send(reading).await.is_err() {
                        debug!("Reading receiver dropped");
                        break;
                    }
                    self.stats.readings += 1;
                }
            }

            if closed {
                debug!("Frame source closed");
                break;
            }
        }

        info!(
            "Live measurement stopped after {} ticks, {} readings",
            self.stats.ticks, self.stats.readings
        );
        self.stats
    }

    /// One measurement step; `None` when nothing changed since the last one.
    pub fn step(&mut self, frame: &PoseFrame, session: &MeasurementSession) -> Option<LiveReading> {
        let key = (frame.frame_index, frame.timestamp_ms, session.clone());
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);

        let measurement = self
            .cache
            .get_or_measure(frame, session, &self.config)
            .cloned();
        let active_plane = measurement
            .as_ref()
            .and_then(|m| m.active_plane(session.pinned_plane));
        let movement = measurement
            .as_ref()
            .and_then(|m| m.movement(session.pinned_plane));

        Some(LiveReading {
            frame_index: frame.frame_index,
            timestamp_ms: frame.timestamp_ms,
            measurement,
            active_plane,
            movement,
            body_frame: BodyFrame::from_landmarks(&frame.landmarks, &self.config),
        })
    }
}
