// src/model.rs
use crate::error::{ConsensusError, Result};
use crate::geometry::{self, BoundingVolume, Point3};
use crate::gesture::{GestureType, HandSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// MediaPipe hand landmark count.
pub const NUM_JOINTS: usize = 21;

/// One captured hand pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointFrame {
    joints: [Point3; NUM_JOINTS],
    timestamp: f64,
}

impl JointFrame {
    pub fn new(joints: Vec<Point3>, timestamp: f64) -> Result<Self> {
        let count = joints.len();
        let joints: [Point3; NUM_JOINTS] = joints.try_into().map_err(|_| {
            ConsensusError::malformed(
                format!("frame@{timestamp}"),
                format!("expected {NUM_JOINTS} joints, got {count}"),
            )
        })?;
        if !timestamp.is_finite() {
            return Err(ConsensusError::malformed(
                "frame",
                format!("timestamp {timestamp} is not finite"),
            ));
        }
        if let Some(j) = joints.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(ConsensusError::malformed(
                format!("frame@{timestamp}"),
                format!("joint {j} has a non-finite coordinate"),
            ));
        }
        Ok(Self { joints, timestamp })
    }

    pub fn joints(&self) -> &[Point3; NUM_JOINTS] {
        &self.joints
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn bounding_volume(&self) -> BoundingVolume {
        BoundingVolume::of_points(self.joints.iter())
            .unwrap_or_else(|| BoundingVolume::from_point(self.joints[0]))
    }

    pub fn centroid(&self) -> Point3 {
        geometry::mean(self.joints.iter())
    }

    /// Euclidean distance between the two frames' concatenated coordinates.
    pub fn distance_to(&self, other: &JointFrame) -> f64 {
        self.joints
            .iter()
            .zip(other.joints.iter())
            .map(|(a, b)| (a - b).norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    fn transformed(&self, offset: &Point3, scale: f64) -> Self {
        Self {
            joints: self.joints.map(|p| (p - offset) / scale),
            timestamp: self.timestamp,
        }
    }
}

/// A recording as delivered by the loader, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureRecording {
    pub name: String,
    pub hand: HandSide,
    pub frames: Vec<JointFrame>,
}

/// A recording re-centred on its centroid and scaled into the unit box.
///
/// Only this type is accepted by the dissimilarity engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecording {
    name: String,
    gesture: GestureType,
    hand: HandSide,
    tag: String,
    frames: Vec<JointFrame>,
    offset: Point3,
    scale: f64,
}

/// What a visualization layer needs to place and label one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub label: String,
    pub tag: String,
    pub bounding_volume: BoundingVolume,
    pub centroid: Point3,
}

impl GestureRecording {
    pub fn new(name: impl Into<String>, hand: HandSide) -> Self {
        Self {
            name: name.into(),
            hand,
            frames: Vec::new(),
        }
    }

    pub fn with_frames(name: impl Into<String>, hand: HandSide, frames: Vec<JointFrame>) -> Self {
        Self {
            name: name.into(),
            hand,
            frames,
        }
    }

    pub fn push(&mut self, frame: JointFrame) {
        self.frames.push(frame);
    }

    pub fn bounding_volume(&self) -> Result<BoundingVolume> {
        geometry::bounding_volume(&self.name, &self.frames)
    }

    pub fn centroid(&self) -> Point3 {
        geometry::centroid(&self.frames)
    }

    /// Re-centres and rescales the recording. Empty recordings are rejected
    /// since they would poison every distance they take part in.
    pub fn normalize(self, gesture: GestureType) -> Result<NormalizedRecording> {
        let volume = self.bounding_volume()?;
        if let Some(pos) = self
            .frames
            .windows(2)
            .position(|w| w[1].timestamp() <= w[0].timestamp())
        {
            return Err(ConsensusError::malformed(
                &self.name,
                format!("timestamp does not increase at frame {}", pos + 1),
            ));
        }

        let offset = self.centroid();
        let extent = volume.extent();
        let scale = if extent > f64::EPSILON { extent } else { 1.0 };
        let frames = self
            .frames
            .iter()
            .map(|f| f.transformed(&offset, scale))
            .collect();

        Ok(NormalizedRecording {
            name: self.name,
            gesture,
            hand: self.hand,
            tag: gesture.name().to_string(),
            frames,
            offset,
            scale,
        })
    }
}

impl NormalizedRecording {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gesture(&self) -> GestureType {
        self.gesture
    }

    pub fn hand(&self) -> HandSide {
        self.hand
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn frames(&self) -> &[JointFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Centroid of the raw capture, subtracted during normalization.
    pub fn offset(&self) -> Point3 {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn matches(&self, gesture: GestureType, hand: HandSide) -> bool {
        self.gesture == gesture && self.hand == hand
    }

    pub fn bounding_volume(&self) -> BoundingVolume {
        // Normalized recordings are never empty.
        geometry::bounding_volume(&self.name, &self.frames)
            .unwrap_or_else(|_| BoundingVolume::from_point(Point3::zeros()))
    }

    pub fn centroid(&self) -> Point3 {
        geometry::centroid(&self.frames)
    }

    pub fn label(&self, person: &str) -> String {
        format!("{} | {} | {}", person, self.hand, self.gesture)
    }

    pub fn display_info(&self, person: &str) -> DisplayInfo {
        DisplayInfo {
            label: self.label(person),
            tag: self.tag.clone(),
            bounding_volume: self.bounding_volume(),
            centroid: self.centroid(),
        }
    }
}

/// A participant and every recording they made, keyed by gesture type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person<R = NormalizedRecording> {
    pub name: String,
    pub gestures: BTreeMap<GestureType, Vec<R>>,
}

impl<R> Person<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gestures: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, gesture: GestureType, recording: R) {
        self.gestures.entry(gesture).or_default().push(recording);
    }

    pub fn recording_count(&self) -> usize {
        self.gestures.values().map(Vec::len).sum()
    }
}

impl Person<GestureRecording> {
    pub fn normalize(self) -> Result<Person<NormalizedRecording>> {
        let mut gestures = BTreeMap::new();
        for (gesture, recordings) in self.gestures {
            let normalized = recordings
                .into_iter()
                .map(|r| r.normalize(gesture))
                .collect::<Result<Vec<_>>>()?;
            gestures.insert(gesture, normalized);
        }
        Ok(Person {
            name: self.name,
            gestures,
        })
    }
}

impl Person<NormalizedRecording> {
    pub fn recordings_matching(
        &self,
        gesture: GestureType,
        hand: HandSide,
    ) -> impl Iterator<Item = &NormalizedRecording> {
        self.gestures
            .get(&gesture)
            .into_iter()
            .flatten()
            .filter(move |r| r.hand == hand)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn frame(offset: Point3, timestamp: f64) -> JointFrame {
        let joints = (0..NUM_JOINTS)
            .map(|i| Point3::new(i as f64 * 0.1, (i % 5) as f64 * 0.2, (i % 3) as f64) + offset)
            .collect();
        JointFrame::new(joints, timestamp).unwrap()
    }

    pub(crate) fn recording(name: &str, hand: HandSide, offsets: &[Point3]) -> GestureRecording {
        let frames = offsets
            .iter()
            .enumerate()
            .map(|(i, o)| frame(*o, i as f64 / 30.0))
            .collect();
        GestureRecording::with_frames(name, hand, frames)
    }

    #[test]
    fn frame_rejects_wrong_joint_count() {
        let err = JointFrame::new(vec![Point3::zeros(); NUM_JOINTS - 1], 0.0).unwrap_err();
        assert!(matches!(err, ConsensusError::MalformedRecording { .. }));
        assert!(JointFrame::new(vec![Point3::zeros(); NUM_JOINTS + 1], 0.0).is_err());
    }

    #[test]
    fn frame_rejects_non_finite_values() {
        let mut joints = vec![Point3::zeros(); NUM_JOINTS];
        joints[8].y = f64::NAN;
        assert!(matches!(
            JointFrame::new(joints, 0.0),
            Err(ConsensusError::MalformedRecording { .. })
        ));

        let mut joints = vec![Point3::zeros(); NUM_JOINTS];
        joints[20].z = f64::INFINITY;
        assert!(JointFrame::new(joints, 0.0).is_err());

        assert!(JointFrame::new(vec![Point3::zeros(); NUM_JOINTS], f64::NAN).is_err());
    }

    #[test]
    fn frame_distance_is_euclidean_over_all_joints() {
        let a = frame(Point3::zeros(), 0.0);
        let b = frame(Point3::new(1.0, 0.0, 0.0), 0.0);
        let expected = (NUM_JOINTS as f64).sqrt();
        assert!((a.distance_to(&b) - expected).abs() < 1e-12);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn frame_geometry_matches_its_joints() {
        let f = frame(Point3::zeros(), 0.0);
        let volume = f.bounding_volume();
        assert_eq!(volume.min, Point3::zeros());
        assert!((volume.max - Point3::new(2.0, 0.8, 2.0)).norm() < 1e-12);
        assert!(f.centroid().x > 0.0);
    }

    #[test]
    fn normalization_centres_and_scales_into_unit_box() {
        let raw = recording(
            "take-1",
            HandSide::Right,
            &[Point3::new(10.0, 5.0, 0.0), Point3::new(12.0, 5.0, 1.0)],
        );
        let expected_offset = raw.centroid();
        let normalized = raw.normalize(GestureType::Zoom).unwrap();

        assert!(normalized.centroid().norm() < 1e-9);
        assert!((normalized.bounding_volume().extent() - 1.0).abs() < 1e-9);
        assert!((normalized.offset() - expected_offset).norm() < 1e-9);
        assert_eq!(normalized.tag(), "Zoom");
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = recording("a", HandSide::Left, &[Point3::new(3.0, 1.0, 2.0), Point3::new(4.0, 0.0, 2.5)])
            .normalize(GestureType::Pan)
            .unwrap();
        let twice = GestureRecording::with_frames("a", HandSide::Left, once.frames().to_vec())
            .normalize(GestureType::Pan)
            .unwrap();

        assert!((twice.scale() - 1.0).abs() < 1e-9);
        for (a, b) in once.frames().iter().zip(twice.frames()) {
            assert!(a.distance_to(b) < 1e-9);
        }
    }

    #[test]
    fn degenerate_recording_is_only_recentred() {
        let joints = vec![Point3::new(2.0, 2.0, 2.0); NUM_JOINTS];
        let raw = GestureRecording::with_frames(
            "still",
            HandSide::Left,
            vec![JointFrame::new(joints, 0.0).unwrap()],
        );
        let normalized = raw.normalize(GestureType::Export).unwrap();
        assert_eq!(normalized.scale(), 1.0);
        assert!(normalized.frames()[0].joints().iter().all(|p| p.norm() < 1e-12));
    }

    #[test]
    fn empty_or_backwards_recordings_are_malformed() {
        let empty = GestureRecording::new("empty", HandSide::Left);
        assert!(matches!(
            empty.normalize(GestureType::Zoom),
            Err(ConsensusError::MalformedRecording { .. })
        ));

        let mut backwards = GestureRecording::new("backwards", HandSide::Left);
        backwards.push(frame(Point3::zeros(), 1.0));
        backwards.push(frame(Point3::zeros(), 0.5));
        assert!(backwards.normalize(GestureType::Zoom).is_err());

        let mut repeated = GestureRecording::new("repeated", HandSide::Left);
        repeated.push(frame(Point3::zeros(), 0.5));
        repeated.push(frame(Point3::new(0.1, 0.0, 0.0), 0.5));
        assert!(matches!(
            repeated.normalize(GestureType::Zoom),
            Err(ConsensusError::MalformedRecording { .. })
        ));
    }

    #[test]
    fn person_normalizes_every_recording_and_filters_by_hand() {
        let mut person = Person::new("p1");
        person.add(GestureType::Zoom, recording("z-r", HandSide::Right, &[Point3::zeros()]));
        person.add(GestureType::Zoom, recording("z-l", HandSide::Left, &[Point3::zeros()]));
        person.add(GestureType::Pan, recording("p-r", HandSide::Right, &[Point3::zeros()]));

        let person = person.normalize().unwrap();
        assert_eq!(person.recording_count(), 3);

        let names: Vec<_> = person
            .recordings_matching(GestureType::Zoom, HandSide::Right)
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["z-r"]);
        assert_eq!(
            person.recordings_matching(GestureType::Rotate, HandSide::Right).count(),
            0
        );
    }

    #[test]
    fn display_info_carries_label_and_geometry() {
        let normalized = recording("z", HandSide::Right, &[Point3::zeros(), Point3::new(0.0, 1.0, 0.0)])
            .normalize(GestureType::Zoom)
            .unwrap();
        let info = normalized.display_info("Alice");
        assert_eq!(info.label, "Alice | Right | Zoom");
        assert_eq!(info.tag, "Zoom");
        assert!(info.centroid.norm() < 1e-9);
        assert!(info.bounding_volume.extent() > 0.0);
    }
}
