// src/dissimilarity.rs
use crate::error::{ConsensusError, Result};
use crate::model::{JointFrame, NormalizedRecording};
use serde::{Deserialize, Serialize};

/// Selects the distance measure used for every pair in an aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceAlgorithm {
    #[default]
    NormalizedDtw,
}

/// A distance between two joint-position time series.
///
/// Implementations must be symmetric, return zero for identical sequences and
/// never return a negative value.
pub trait DistanceMeasure {
    fn distance(&self, a: &[JointFrame], b: &[JointFrame]) -> Result<f64>;
}

/// Dynamic time warping with the symmetric step pattern, normalized by the
/// combined length of both sequences.
///
/// A diagonal step costs twice the local distance and a horizontal or vertical
/// step costs it once, so every warping path has total weight `n + m`. Dividing
/// by that keeps recordings of different duration comparable, and two
/// single-frame recordings come out at their plain Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedDtw;

impl DistanceMeasure for NormalizedDtw {
    fn distance(&self, a: &[JointFrame], b: &[JointFrame]) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(ConsensusError::malformed(
                "dtw input",
                "cannot align an empty sequence",
            ));
        }

        let m = b.len();
        // Two rolling rows of the (n+1) x (m+1) accumulated cost matrix.
        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;

        for fa in a {
            curr[0] = f64::INFINITY;
            for (j, fb) in b.iter().enumerate() {
                let cost = fa.distance_to(fb);
                let diagonal = prev[j] + 2.0 * cost;
                let vertical = prev[j + 1] + cost;
                let horizontal = curr[j] + cost;
                curr[j + 1] = diagonal.min(vertical).min(horizontal);
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        Ok(prev[m] / (a.len() + m) as f64)
    }
}

impl DistanceAlgorithm {
    pub fn frames_distance(self, a: &[JointFrame], b: &[JointFrame]) -> Result<f64> {
        match self {
            DistanceAlgorithm::NormalizedDtw => NormalizedDtw.distance(a, b),
        }
    }

    pub fn distance(self, a: &NormalizedRecording, b: &NormalizedRecording) -> Result<f64> {
        self.frames_distance(a.frames(), b.frames()).map_err(|e| match e {
            ConsensusError::MalformedRecording { reason, .. } => ConsensusError::malformed(
                format!("{} vs {}", a.name(), b.name()),
                reason,
            ),
            other => other,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            DistanceAlgorithm::NormalizedDtw => "normalized DTW",
        }
    }
}
