//! Angle and body-frame geometry against hand-computed poses


use angle_tracker::geometry::{projected_angle, try_segment_angle, vector_angle};
use angle_tracker::{
    angle_between_segments, build_body_frame, plane_angles, BodyFrame, MeasurementConfig, Plane,
};
use nalgebra::Vector3;
use test_helpers::{approx_eq, standing_landmarks, Lcg};

const TOL: f64 = 1e-6;

fn random_vector(rng: &mut Lcg) -> Vector3<f64> {
    Vector3::new(rng.next(), rng.next(), rng.next())
}

#[test]
fn test_identical_directions_are_zero() {
    let mut rng = Lcg::new(7);
    for _ in 0..100 {
        let a = random_vector(&mut rng).normalize();
        let joint = Vector3::new(0.3, -0.2, 0.1);
        let angle = angle_between_segments(&joint, &(joint + a), &(joint + a * 2.0));
        assert!(approx_eq(angle, 0.0, 0.01), "angle {}", angle);
    }
}

#[test]
fn test_opposite_directions_are_straight() {
    let mut rng = Lcg::new(11);
    for _ in 0..100 {
        let a = random_vector(&mut rng).normalize();
        let angle = angle_between_segments(&Vector3::zeros(), &a, &(-a));
        assert!(approx_eq(angle, 180.0, 0.01), "angle {}", angle);
    }
}

#[test]
fn test_orthogonal_directions_are_right_angle() {
    let mut rng = Lcg::new(13);
    for _ in 0..100 {
        let a = random_vector(&mut rng).normalize();
        let b = a.cross(&random_vector(&mut rng)).normalize();
        let angle = angle_between_segments(&Vector3::zeros(), &a, &b);
        assert!(approx_eq(angle, 90.0, 0.01), "angle {}", angle);
    }
}

#[test]
fn test_angles_stay_in_range() {
    let mut rng = Lcg::new(17);
    for _ in 0..500 {
        let joint = random_vector(&mut rng);
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        let angle = angle_between_segments(&joint, &a, &b);
        assert!((0.0..=180.0).contains(&angle), "angle {}", angle);
    }
}

#[test]
fn test_collinear_bones_are_straight() {
    let outer_a = Vector3::new(0.0, 0.6, 0.0);
    let joint = Vector3::new(0.0, 0.3, 0.0);
    let outer_b = Vector3::new(0.0, -0.1, 0.0);
    assert!(approx_eq(angle_between_segments(&joint, &outer_a, &outer_b), 180.0, 1e-9));
}

#[test]
fn test_zero_length_bone_is_unavailable() {
    let joint = Vector3::new(0.1, 0.1, 0.1);
    assert!(try_segment_angle(&joint, &joint, &Vector3::zeros(), TOL).is_none());
    // The plain variant falls back to the 0° sentinel instead of NaN
    assert_eq!(angle_between_segments(&joint, &joint, &Vector3::zeros()), 0.0);
    assert!(vector_angle(&Vector3::zeros(), &Vector3::zeros(), TOL).is_none());
}

#[test]
fn test_body_frame_is_orthonormal() {
    let mut rng = Lcg::new(23);
    let mut built = 0;
    for _ in 0..500 {
        let frame = BodyFrame::from_points(
            random_vector(&mut rng),
            random_vector(&mut rng),
            random_vector(&mut rng),
            random_vector(&mut rng),
            TOL,
        );
        let Some(frame) = frame else { continue };
        built += 1;

        for axis in [frame.right, frame.up, frame.forward] {
            assert!(approx_eq(axis.norm(), 1.0, TOL));
        }
        assert!(approx_eq(frame.right.dot(&frame.up), 0.0, TOL));
        assert!(approx_eq(frame.right.dot(&frame.forward), 0.0, TOL));
        assert!(approx_eq(frame.up.dot(&frame.forward), 0.0, TOL));
        // Right-handed
        assert!((frame.right.cross(&frame.up) - frame.forward).norm() < TOL);
    }
    assert!(built > 450);
}

#[test]
fn test_upright_scene_frame() {
    let frame = BodyFrame::from_points(
        Vector3::new(-0.1, 0.0, 0.0),
        Vector3::new(0.1, 0.0, 0.0),
        Vector3::new(-0.1, 0.3, 0.0),
        Vector3::new(0.1, 0.3, 0.0),
        TOL,
    )
    .unwrap();
    assert!((frame.right - Vector3::x()).norm() < TOL);
    assert!((frame.up - Vector3::y()).norm() < TOL);
}

#[test]
fn test_frame_from_image_landmarks() {
    // Shoulders sit above the hips in the image (smaller y); the projector
    // flips y so up comes out positive
    let frame = build_body_frame(&standing_landmarks(), &MeasurementConfig::default()).unwrap();
    assert!((frame.right - Vector3::x()).norm() < TOL);
    assert!((frame.up - Vector3::y()).norm() < TOL);
    assert!((frame.forward - Vector3::z()).norm() < TOL);
    assert!((frame.origin - Vector3::new(0.0, -0.2, 0.0)).norm() < TOL);
}

#[test]
fn test_missing_frame_landmark() {
    let config = MeasurementConfig::default();
    for index in [11, 12, 23, 24] {
        let mut lms = standing_landmarks();
        lms[index].visibility = 0.0;
        assert!(build_body_frame(&lms, &config).is_none(), "landmark {}", index);
    }

    // Truncated frame without hips
    let lms = standing_landmarks();
    assert!(build_body_frame(&lms[..20], &config).is_none());
}

#[test]
fn test_degenerate_pose_has_no_frame() {
    let mut lms = standing_landmarks();
    // Shoulders collapsed onto the hips
    lms[11] = lms[23];
    lms[12] = lms[24];
    assert!(build_body_frame(&lms, &MeasurementConfig::default()).is_none());
}

#[test]
fn test_projection_against_itself_is_zero() {
    let mut rng = Lcg::new(29);
    for _ in 0..100 {
        let v = random_vector(&mut rng);
        let n = random_vector(&mut rng).normalize();
        if let Some(angle) = projected_angle(&v, &v, &n, TOL) {
            assert!(approx_eq(angle, 0.0, 0.01), "angle {}", angle);
        }
    }
}

#[test]
fn test_plane_angles_isolate_each_plane() {
    let frame = BodyFrame::from_points(
        Vector3::new(-0.1, 0.0, 0.0),
        Vector3::new(0.1, 0.0, 0.0),
        Vector3::new(-0.1, 0.3, 0.0),
        Vector3::new(0.1, 0.3, 0.0),
        TOL,
    )
    .unwrap();
    let joint = Vector3::zeros();

    // Both bones in the transverse (x-z) plane at 45° to each other
    let a = Vector3::new(1.0, 0.0, 0.0);
    let b = Vector3::new(1.0, 0.0, 1.0);
    let angles = plane_angles(&joint, &a, &b, &frame, TOL);
    assert!(approx_eq(angles.transverse.unwrap(), 45.0, 1e-9));
    assert!(approx_eq(angles.frontal.unwrap(), 0.0, 1e-9));
    assert!(angles.sagittal.is_none());
    assert_eq!(angles.dominant(), Some(Plane::Transverse));

    for plane in Plane::ALL {
        if let Some(value) = angles.get(plane) {
            assert!((0.0..=180.0).contains(&value));
        }
    }
}

#[test]
fn test_plane_angles_stay_in_range() {
    let mut rng = Lcg::new(31);
    let frame = BodyFrame::from_points(
        Vector3::new(-0.1, 0.0, 0.05),
        Vector3::new(0.1, 0.02, -0.05),
        Vector3::new(-0.12, 0.3, 0.0),
        Vector3::new(0.08, 0.31, 0.02),
        TOL,
    )
    .unwrap();
    for _ in 0..300 {
        let angles = plane_angles(
            &random_vector(&mut rng),
            &random_vector(&mut rng),
            &random_vector(&mut rng),
            &frame,
            TOL,
        );
        for plane in Plane::ALL {
            let value = angles.or_zero(plane);
            assert!(value.is_finite());
            assert!((0.0..=180.0).contains(&value));
        }
    }
}
