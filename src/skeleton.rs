// src/skeleton.rs - 33-point pose topology
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::geometry::Plane;
use crate::selection::Edge;

pub const LANDMARK_COUNT: usize = 33;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

const JOINT_NAMES: [&str; LANDMARK_COUNT] = [
    "Nose",
    "Left Eye Inner",
    "Left Eye",
    "Left Eye Outer",
    "Right Eye Inner",
    "Right Eye",
    "Right Eye Outer",
    "Left Ear",
    "Right Ear",
    "Mouth Left",
    "Mouth Right",
    "Left Shoulder",
    "Right Shoulder",
    "Left Elbow",
    "Right Elbow",
    "Left Wrist",
    "Right Wrist",
    "Left Pinky",
    "Right Pinky",
    "Left Index",
    "Right Index",
    "Left Thumb",
    "Right Thumb",
    "Left Hip",
    "Right Hip",
    "Left Knee",
    "Right Knee",
    "Left Ankle",
    "Right Ankle",
    "Left Heel",
    "Right Heel",
    "Left Foot Index",
    "Right Foot Index",
];

/// Bone segments drawn between landmarks.
pub const POSE_CONNECTIONS: [(usize, usize); 35] = [
    // Face
    (0, 1), (1, 2), (2, 3), (3, 7),
    (0, 4), (4, 5), (5, 6), (6, 8),
    (9, 10),
    // Torso
    (11, 12), (11, 23), (12, 24), (23, 24),
    // Left arm
    (11, 13), (13, 15), (15, 17), (15, 19), (15, 21), (17, 19),
    // Right arm
    (12, 14), (14, 16), (16, 18), (16, 20), (16, 22), (18, 20),
    // Left leg
    (23, 25), (25, 27), (27, 29), (27, 31), (29, 31),
    // Right leg
    (24, 26), (26, 28), (28, 30), (28, 32), (30, 32),
];

/// Major joints that make sense as an angle vertex.
pub const MEASURABLE_JOINTS: [usize; 12] = [
    LEFT_SHOULDER, RIGHT_SHOULDER,
    LEFT_ELBOW, RIGHT_ELBOW,
    LEFT_WRIST, RIGHT_WRIST,
    LEFT_HIP, RIGHT_HIP,
    LEFT_KNEE, RIGHT_KNEE,
    LEFT_ANKLE, RIGHT_ANKLE,
];

/// Clinical movement name for each anatomical plane at one joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneMovements {
    pub sagittal: &'static str,
    pub frontal: &'static str,
    pub transverse: &'static str,
}

impl PlaneMovements {
    pub fn get(&self, plane: Plane) -> &'static str {
        match plane {
            Plane::Sagittal => self.sagittal,
            Plane::Frontal => self.frontal,
            Plane::Transverse => self.transverse,
        }
    }
}

const SHOULDER_HIP: PlaneMovements = PlaneMovements {
    sagittal: "Flex / Ext",
    frontal: "Abd / Add",
    transverse: "Int / Ext Rot",
};
const ELBOW: PlaneMovements = PlaneMovements {
    sagittal: "Flex / Ext",
    frontal: "Valgus / Varus",
    transverse: "Rotation",
};
const WRIST: PlaneMovements = PlaneMovements {
    sagittal: "Flex / Ext",
    frontal: "Rad / Uln Dev",
    transverse: "Pron / Sup",
};
const KNEE: PlaneMovements = PlaneMovements {
    sagittal: "Flex / Ext",
    frontal: "Valgus / Varus",
    transverse: "Int / Ext Rot",
};
const ANKLE: PlaneMovements = PlaneMovements {
    sagittal: "Dorsi / Plantar",
    frontal: "Inv / Ever",
    transverse: "Rotation",
};

static JOINT_PLANE_MOVEMENTS: Lazy<HashMap<usize, PlaneMovements>> = Lazy::new(|| {
    HashMap::from([
        (LEFT_SHOULDER, SHOULDER_HIP),
        (RIGHT_SHOULDER, SHOULDER_HIP),
        (LEFT_ELBOW, ELBOW),
        (RIGHT_ELBOW, ELBOW),
        (LEFT_WRIST, WRIST),
        (RIGHT_WRIST, WRIST),
        (LEFT_HIP, SHOULDER_HIP),
        (RIGHT_HIP, SHOULDER_HIP),
        (LEFT_KNEE, KNEE),
        (RIGHT_KNEE, KNEE),
        (LEFT_ANKLE, ANKLE),
        (RIGHT_ANKLE, ANKLE),
    ])
});

pub fn joint_name(index: usize) -> String {
    JOINT_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Joint {}", index))
}

pub fn edge_name(edge: Edge) -> String {
    format!("{} - {}", joint_name(edge.a), joint_name(edge.b))
}

pub fn is_measurable(index: usize) -> bool {
    MEASURABLE_JOINTS.contains(&index)
}

pub fn plane_movements(joint: usize) -> Option<&'static PlaneMovements> {
    JOINT_PLANE_MOVEMENTS.get(&joint)
}

/// Whether the edge is one of the skeleton's bones, in either direction.
pub fn is_bone(edge: Edge) -> bool {
    POSE_CONNECTIONS
        .iter()
        .any(|&(a, b)| Edge::new(a, b) == edge)
}
