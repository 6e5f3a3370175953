// src/lib.rs
//! Consensus analysis for recorded hand gestures.
//!
//! Recordings are normalized once when a [`Dataset`] is built, compared pairwise
//! per person with a [`DistanceAlgorithm`], and the resulting
//! [`ComparisonResult`] answers how many person-pairs agree at a tolerance.

pub mod config;
pub mod consensus;
pub mod dataset;
pub mod dissimilarity;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod loader;
pub mod model;
pub mod service;

pub use config::{round_to, ConsensusConfig};
pub use consensus::{
    AggregationMode, ComparisonResult, ConsensusAggregator, DissimilarityEntry, OperatingPoint,
};
pub use dataset::{Dataset, DatasetStore, RecordingSource};
pub use dissimilarity::{DistanceAlgorithm, DistanceMeasure, NormalizedDtw};
pub use error::{ConsensusError, Result};
pub use geometry::{bounding_volume, centroid, BoundingVolume, Point3};
pub use gesture::{GestureFilter, GestureSelection, GestureType, HandSide};
pub use loader::CsvDirectorySource;
pub use model::{DisplayInfo, GestureRecording, JointFrame, NormalizedRecording, Person, NUM_JOINTS};
pub use service::ConsensusService;
