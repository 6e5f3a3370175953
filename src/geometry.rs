// src/geometry.rs
use crate::error::{ConsensusError, Result};
use crate::model::JointFrame;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Joint position in capture space.
pub type Point3 = Vector3<f64>;

/// Axis-aligned box spanning every joint of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingVolume {
    pub(crate) fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    fn include(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn size(&self) -> Point3 {
        self.max - self.min
    }

    pub fn center(&self) -> Point3 {
        (self.min + self.max) * 0.5
    }

    /// Largest side length of the box.
    pub fn extent(&self) -> f64 {
        self.size().max()
    }

    /// Component-wise min/max over `points`. `None` when there are no points.
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut volume = Self::from_point(*iter.next()?);
        for p in iter {
            volume.include(p);
        }
        Some(volume)
    }
}

/// Bounding volume of every joint in every frame.
///
/// An empty recording has no extremes, so this is an error rather than a
/// default box.
pub fn bounding_volume(name: &str, frames: &[JointFrame]) -> Result<BoundingVolume> {
    BoundingVolume::of_points(frames.iter().flat_map(|f| f.joints().iter()))
        .ok_or_else(|| ConsensusError::malformed(name, "no frames to bound"))
}

/// Mean of every joint in every frame; the origin for an empty recording.
pub fn centroid(frames: &[JointFrame]) -> Point3 {
    mean(frames.iter().flat_map(|f| f.joints().iter()))
}

pub(crate) fn mean<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Point3 {
    let (sum, count) = points
        .into_iter()
        .fold((Point3::zeros(), 0usize), |(sum, n), p| (sum + p, n + 1));
    if count == 0 {
        return Point3::zeros();
    }
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NUM_JOINTS;

    fn frame_with(points: impl Fn(usize) -> Point3, timestamp: f64) -> JointFrame {
        JointFrame::new((0..NUM_JOINTS).map(points).collect(), timestamp).unwrap()
    }

    #[test]
    fn bounding_volume_spans_all_frames() {
        let frames = vec![
            frame_with(|i| Point3::new(i as f64, 0.0, -1.0), 0.0),
            frame_with(|i| Point3::new(0.0, -(i as f64), 2.0), 0.1),
        ];
        let volume = bounding_volume("test", &frames).unwrap();
        assert_eq!(volume.min, Point3::new(0.0, -20.0, -1.0));
        assert_eq!(volume.max, Point3::new(20.0, 0.0, 2.0));
        assert_eq!(volume.size(), Point3::new(20.0, 20.0, 3.0));
        assert_eq!(volume.extent(), 20.0);
        assert_eq!(volume.center(), Point3::new(10.0, -10.0, 0.5));
    }

    #[test]
    fn bounding_volume_of_empty_recording_is_an_error() {
        assert!(matches!(
            bounding_volume("empty", &[]),
            Err(ConsensusError::MalformedRecording { .. })
        ));
    }

    #[test]
    fn centroid_averages_all_points() {
        let frames = vec![
            frame_with(|_| Point3::new(1.0, 2.0, 3.0), 0.0),
            frame_with(|_| Point3::new(3.0, 4.0, 5.0), 0.1),
        ];
        let c = centroid(&frames);
        assert!((c - Point3::new(2.0, 3.0, 4.0)).norm() < 1e-12);
    }

    #[test]
    fn centroid_of_empty_recording_is_origin() {
        assert_eq!(centroid(&[]), Point3::zeros());
    }
}
