// src/consensus.rs
use crate::config::ConsensusConfig;
use crate::dissimilarity::DistanceAlgorithm;
use crate::error::Result;
use crate::gesture::GestureFilter;
use crate::model::NormalizedRecording;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// How repeated recordings of one person collapse into one distance per person-pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Mean over every cross pair of the two persons' recordings.
    #[default]
    Average,
    Minimum,
    Maximum,
}

impl AggregationMode {
    fn reduce(self, distances: &[f64]) -> f64 {
        match self {
            AggregationMode::Average => distances.iter().sum::<f64>() / distances.len() as f64,
            AggregationMode::Minimum => distances.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationMode::Maximum => distances.iter().copied().fold(0.0, f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DissimilarityEntry {
    pub person_a: String,
    pub person_b: String,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub tolerance: f64,
    pub consensus: f64,
}

impl OperatingPoint {
    pub const NEUTRAL: OperatingPoint = OperatingPoint {
        tolerance: 0.0,
        consensus: 0.0,
    };
}

/// Dissimilarity matrix of one aggregation run, queried without recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    filter: GestureFilter,
    algorithm: DistanceAlgorithm,
    aggregation: AggregationMode,
    dataset_version: u64,
    person_count: usize,
    entries: Vec<DissimilarityEntry>,
    sorted_distances: Vec<f64>,
}

impl ComparisonResult {
    fn new(
        filter: GestureFilter,
        algorithm: DistanceAlgorithm,
        aggregation: AggregationMode,
        person_count: usize,
        entries: Vec<DissimilarityEntry>,
    ) -> Self {
        let mut sorted_distances: Vec<f64> = entries.iter().map(|e| e.distance).collect();
        sorted_distances.sort_by(f64::total_cmp);
        Self {
            filter,
            algorithm,
            aggregation,
            dataset_version: 0,
            person_count,
            entries,
            sorted_distances,
        }
    }

    pub(crate) fn stamped(mut self, dataset_version: u64) -> Self {
        self.dataset_version = dataset_version;
        self
    }

    pub fn filter(&self) -> GestureFilter {
        self.filter
    }

    pub fn algorithm(&self) -> DistanceAlgorithm {
        self.algorithm
    }

    pub fn aggregation(&self) -> AggregationMode {
        self.aggregation
    }

    pub fn dataset_version(&self) -> u64 {
        self.dataset_version
    }

    /// Persons that contributed at least one matching recording.
    pub fn person_count(&self) -> usize {
        self.person_count
    }

    pub fn eligible_pairs(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by `(person_a, person_b)`, with `person_a < person_b`.
    pub fn matrix(&self) -> &[DissimilarityEntry] {
        &self.entries
    }

    /// Percentage (0..=100) of pairs whose distance is within `tolerance`.
    /// Zero when there are no pairs.
    pub fn relative_consensus(&self, tolerance: f64) -> f64 {
        if self.sorted_distances.is_empty() {
            return 0.0;
        }
        let agreeing = self.sorted_distances.partition_point(|d| *d <= tolerance);
        100.0 * agreeing as f64 / self.sorted_distances.len() as f64
    }

    /// Smallest tolerance at which consensus stops growing, i.e. the largest
    /// pair distance at 100%. Neutral `(0, 0)` for an empty result.
    pub fn best_operating_point(&self) -> OperatingPoint {
        match self.sorted_distances.last() {
            Some(&max) => OperatingPoint {
                tolerance: max,
                consensus: self.relative_consensus(max),
            },
            None => OperatingPoint::NEUTRAL,
        }
    }

    /// Rows to highlight at the given tolerance.
    pub fn pairs_within(&self, tolerance: f64) -> impl Iterator<Item = &DissimilarityEntry> {
        self.entries.iter().filter(move |e| e.distance <= tolerance)
    }

    /// Consensus sampled at `steps + 1` evenly spaced tolerances from 0 to the
    /// largest pair distance.
    pub fn consensus_curve(&self, steps: usize) -> Vec<OperatingPoint> {
        let Some(&max) = self.sorted_distances.last() else {
            return vec![OperatingPoint::NEUTRAL];
        };
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let tolerance = if i == steps {
                    max
                } else {
                    max * i as f64 / steps as f64
                };
                OperatingPoint {
                    tolerance,
                    consensus: self.relative_consensus(tolerance),
                }
            })
            .collect()
    }

    /// Smallest stored distance at which consensus reaches `target` percent.
    /// Targets at or below zero give the closest pair's distance.
    pub fn tolerance_for_consensus(&self, target: f64) -> Option<f64> {
        let n = self.sorted_distances.len();
        if n == 0 || target > 100.0 {
            return None;
        }
        (1..=n)
            .find(|k| 100.0 * *k as f64 / n as f64 >= target - 1e-9)
            .map(|k| self.sorted_distances[k - 1])
    }
}

/// Builds the pairwise dissimilarity matrix for one gesture/hand filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusAggregator {
    pub algorithm: DistanceAlgorithm,
    pub aggregation: AggregationMode,
}

impl ConsensusAggregator {
    pub fn new(algorithm: DistanceAlgorithm, aggregation: AggregationMode) -> Self {
        Self {
            algorithm,
            aggregation,
        }
    }

    pub fn from_config(config: &ConsensusConfig) -> Self {
        Self::new(config.algorithm, config.aggregation)
    }

    /// Recordings that do not match `filter` are dropped before pairing.
    /// Persons are paired in name order; recordings of one person are never
    /// compared with each other.
    pub fn aggregate<'a, I>(&self, recordings: I, filter: GestureFilter) -> Result<ComparisonResult>
    where
        I: IntoIterator<Item = (&'a str, &'a NormalizedRecording)>,
    {
        let started = Instant::now();
        let mut by_person: BTreeMap<&str, Vec<&NormalizedRecording>> = BTreeMap::new();
        for (person, recording) in recordings {
            if recording.matches(filter.gesture, filter.hand) {
                by_person.entry(person).or_default().push(recording);
            }
        }
        let persons: Vec<(&str, Vec<&NormalizedRecording>)> = by_person.into_iter().collect();

        info!(
            "Aggregating {} with {} over {} person(s)",
            filter,
            self.algorithm.name(),
            persons.len()
        );

        let mut entries = Vec::with_capacity(persons.len() * persons.len().saturating_sub(1) / 2);
        for (i, (person_a, takes_a)) in persons.iter().enumerate() {
            for (person_b, takes_b) in &persons[i + 1..] {
                let mut distances = Vec::with_capacity(takes_a.len() * takes_b.len());
                for a in takes_a {
                    for b in takes_b {
                        distances.push(self.algorithm.distance(a, b)?);
                    }
                }
                let distance = self.aggregation.reduce(&distances);
                debug!("{} vs {}: {:.4} ({} comparison(s))", person_a, person_b, distance, distances.len());
                entries.push(DissimilarityEntry {
                    person_a: person_a.to_string(),
                    person_b: person_b.to_string(),
                    distance,
                });
            }
        }

        info!(
            "Built {} pair(s) for {} in {:.1} ms",
            entries.len(),
            filter,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ComparisonResult::new(
            filter,
            self.algorithm,
            self.aggregation,
            persons.len(),
            entries,
        ))
    }
}
