// src/service.rs
use crate::config::ConsensusConfig;
use crate::consensus::{ComparisonResult, ConsensusAggregator};
use crate::dataset::{Dataset, DatasetStore};
use crate::error::{ConsensusError, Result};
use crate::gesture::GestureFilter;
use std::sync::Arc;
use tracing::warn;

/// Entry point for a UI layer: filter strings in, comparison snapshot out.
pub struct ConsensusService {
    store: Arc<DatasetStore>,
    config: ConsensusConfig,
}

impl ConsensusService {
    pub fn new(store: Arc<DatasetStore>, config: ConsensusConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Unrecognised or wildcard names fail here, before any distance is computed.
    pub fn request_consensus(&self, gesture: &str, hand: &str) -> Result<ComparisonResult> {
        let filter = GestureFilter::parse(gesture, hand)?;
        self.request_consensus_for(filter)
    }

    pub fn request_consensus_for(&self, filter: GestureFilter) -> Result<ComparisonResult> {
        let snapshot = self.store.snapshot();
        let result = ConsensusAggregator::from_config(&self.config).aggregate(
            snapshot.by_gesture_and_hand(filter.gesture, filter.hand),
            filter,
        )?;
        self.finish(&snapshot, result)
    }

    /// Stamps `result` with the version it was computed from, or discards it
    /// if the store has published a newer dataset since `snapshot` was taken.
    pub(crate) fn finish(
        &self,
        snapshot: &Dataset,
        result: ComparisonResult,
    ) -> Result<ComparisonResult> {
        let started = snapshot.version();
        let current = self.store.current_version();
        if current != started {
            warn!(
                "Discarding {} result: dataset moved from v{} to v{}",
                result.filter(),
                started,
                current
            );
            return Err(ConsensusError::StaleSnapshot { started, current });
        }
        Ok(result.stamped(started))
    }

    /// True while `result` still describes the published dataset.
    pub fn is_current(&self, result: &ComparisonResult) -> bool {
        result.dataset_version() == self.store.current_version()
    }
}
