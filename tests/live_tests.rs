//! Live measurement task over watch/mpsc channels


use std::time::Duration;

use angle_tracker::live::LiveMeasurer;
use angle_tracker::{Edge, MeasurementConfig, MeasurementSession, Plane, PoseFrame};
use test_helpers::{approx_eq, elbow_bent_sideways, elbow_flexed_forward, frame};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

fn fast_config() -> MeasurementConfig {
    MeasurementConfig {
        live_cadence_ms: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_live_readings_follow_latest_frame() {
    let session = MeasurementSession::with_pair(Edge::new(11, 13), Edge::new(13, 15));
    let (frame_tx, frame_rx) = watch::channel::<Option<PoseFrame>>(None);
    let (session_tx, session_rx) = watch::channel(session.clone());
    let (reading_tx, mut reading_rx) = mpsc::channel(16);

    let task = tokio::spawn(LiveMeasurer::new(fast_config()).run(frame_rx, session_rx, reading_tx));

    frame_tx.send_replace(Some(frame(1, elbow_flexed_forward())));
    let reading = timeout(Duration::from_secs(2), reading_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reading.frame_index, 1);
    let m = reading.measurement.unwrap();
    assert!(approx_eq(m.degrees, 90.0, 1e-6));
    assert_eq!(reading.active_plane, Some(Plane::Sagittal));
    assert_eq!(reading.movement, Some("Flex / Ext"));
    assert!(reading.body_frame.is_some());

    // Pinning a plane produces a new reading for the same frame
    let mut pinned = session.clone();
    pinned.pin(Some(Plane::Frontal));
    session_tx.send_replace(pinned);
    let reading = timeout(Duration::from_secs(2), reading_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reading.frame_index, 1);
    assert_eq!(reading.active_plane, Some(Plane::Frontal));

    frame_tx.send_replace(Some(frame(2, elbow_bent_sideways())));
    let reading = timeout(Duration::from_secs(2), reading_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reading.frame_index, 2);
    assert_eq!(reading.movement, Some("Valgus / Varus"));

    drop(frame_tx);
    let stats = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert_eq!(stats.readings, 3);
    assert!(stats.ticks >= 3);
}

#[tokio::test]
async fn test_live_stops_when_receiver_dropped() {
    let session = MeasurementSession::with_pair(Edge::new(11, 13), Edge::new(13, 15));
    let (frame_tx, frame_rx) = watch::channel(Some(frame(0, elbow_flexed_forward())));
    let (_session_tx, session_rx) = watch::channel(session);
    let (reading_tx, reading_rx) = mpsc::channel(1);
    drop(reading_rx);

    let task = tokio::spawn(LiveMeasurer::new(fast_config()).run(frame_rx, session_rx, reading_tx));
    let stats = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert_eq!(stats.readings, 0);
    drop(frame_tx);
}

#[tokio::test]
async fn test_zero_cadence_still_ticks() {
    let config = MeasurementConfig {
        live_cadence_ms: 0,
        ..Default::default()
    };
    let session = MeasurementSession::with_pair(Edge::new(11, 13), Edge::new(13, 15));
    let (frame_tx, frame_rx) = watch::channel(Some(frame(0, elbow_flexed_forward())));
    let (_session_tx, session_rx) = watch::channel(session);
    let (reading_tx, mut reading_rx) = mpsc::channel(4);

    let task = tokio::spawn(LiveMeasurer::new(config).run(frame_rx, session_rx, reading_tx));
    let reading = timeout(Duration::from_secs(2), reading_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reading.frame_index, 0);

    drop(frame_tx);
    let stats = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert_eq!(stats.readings, 1);
}

#[tokio::test]
async fn test_live_without_frames_emits_nothing() {
    let (frame_tx, frame_rx) = watch::channel::<Option<PoseFrame>>(None);
    let (_session_tx, session_rx) = watch::channel(MeasurementSession::new());
    let (reading_tx, mut reading_rx) = mpsc::channel(4);

    let task = tokio::spawn(LiveMeasurer::new(fast_config()).run(frame_rx, session_rx, reading_tx));
    tokio::time::sleep(Duration::from_millis(30)).await;
    drop(frame_tx);

    let stats = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert_eq!(stats.readings, 0);
    assert!(reading_rx.recv().await.is_none());
}
