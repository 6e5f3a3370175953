// src/dataset.rs
use crate::error::Result;
use crate::gesture::{GestureSelection, GestureType, HandSide};
use crate::model::{GestureRecording, NormalizedRecording, Person};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Supplies raw recordings, grouped per person.
pub trait RecordingSource {
    fn load_all(&self) -> Result<Vec<Person<GestureRecording>>>;
}

impl RecordingSource for Vec<Person<GestureRecording>> {
    fn load_all(&self) -> Result<Vec<Person<GestureRecording>>> {
        Ok(self.clone())
    }
}

/// An immutable, normalized version of the loaded recordings.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    version: u64,
    loaded_at: DateTime<Local>,
    persons: Vec<Person>,
}

impl Dataset {
    /// Normalizes every recording; the first malformed one aborts the load.
    pub fn build(version: u64, persons: Vec<Person<GestureRecording>>) -> Result<Self> {
        let persons = persons
            .into_iter()
            .map(Person::<GestureRecording>::normalize)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version,
            loaded_at: Local::now(),
            persons,
        })
    }

    pub fn empty() -> Self {
        Self {
            version: 0,
            loaded_at: Local::now(),
            persons: Vec::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn total_recordings(&self) -> usize {
        self.persons.iter().map(Person::recording_count).sum()
    }

    pub fn by_gesture_and_hand(
        &self,
        gesture: GestureType,
        hand: HandSide,
    ) -> impl Iterator<Item = (&str, &NormalizedRecording)> {
        self.persons.iter().flat_map(move |person| {
            person
                .recordings_matching(gesture, hand)
                .map(move |r| (person.name.as_str(), r))
        })
    }

    /// Recordings a display layer should show for a dropdown selection.
    pub fn visible(
        &self,
        selection: GestureSelection,
        hand: HandSide,
    ) -> impl Iterator<Item = (&str, &NormalizedRecording)> {
        self.persons.iter().flat_map(move |person| {
            person
                .gestures
                .iter()
                .filter(move |(gesture, _)| selection.matches(**gesture))
                .flat_map(|(_, recordings)| recordings.iter())
                .filter(move |r| r.hand() == hand)
                .map(move |r| (person.name.as_str(), r))
        })
    }
}

/// Holds the current dataset. Reloading publishes a new version and never
/// touches snapshots already handed out.
#[derive(Debug)]
pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Dataset::empty())),
        }
    }
}

impl DatasetStore {
    pub fn load(source: &dyn RecordingSource) -> Result<Self> {
        let store = Self::default();
        store.reload(source)?;
        Ok(store)
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn current_version(&self) -> u64 {
        self.snapshot().version()
    }

    pub fn reload(&self, source: &dyn RecordingSource) -> Result<Arc<Dataset>> {
        self.replace(source.load_all()?)
    }

    /// Publishes `persons` as the next version. The current dataset stays in
    /// place if any recording is malformed.
    ///
    /// Normalization runs before the write lock is taken, so readers keep
    /// getting snapshots while a large reload is prepared.
    pub fn replace(&self, persons: Vec<Person<GestureRecording>>) -> Result<Arc<Dataset>> {
        let mut dataset = Dataset::build(0, persons)?;

        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Dataset lock was poisoned; continuing with last published dataset");
                poisoned.into_inner()
            }
        };
        dataset.version = guard.version() + 1;
        let dataset = Arc::new(dataset);
        *guard = Arc::clone(&dataset);
        drop(guard);

        info!(
            "Published dataset v{} with {} person(s), {} recording(s)",
            dataset.version(),
            dataset.persons().len(),
            dataset.total_recordings()
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsensusError;
    use crate::geometry::Point3;
    use crate::model::tests::recording;

    fn people() -> Vec<Person<GestureRecording>> {
        let mut alice = Person::new("alice");
        alice.add(GestureType::Zoom, recording("z1", HandSide::Right, &[Point3::zeros()]));
        alice.add(GestureType::Zoom, recording("z2", HandSide::Right, &[Point3::zeros()]));
        alice.add(GestureType::Pan, recording("p1", HandSide::Left, &[Point3::zeros()]));
        let mut bob = Person::new("bob");
        bob.add(GestureType::Zoom, recording("z1", HandSide::Left, &[Point3::zeros()]));
        vec![alice, bob]
    }

    #[test]
    fn filters_by_gesture_and_hand() {
        let dataset = Dataset::build(1, people()).unwrap();
        assert_eq!(dataset.total_recordings(), 4);

        let hits: Vec<_> = dataset
            .by_gesture_and_hand(GestureType::Zoom, HandSide::Right)
            .map(|(p, r)| (p, r.name()))
            .collect();
        assert_eq!(hits, vec![("alice", "z1"), ("alice", "z2")]);
        assert_eq!(dataset.by_gesture_and_hand(GestureType::Rotate, HandSide::Left).count(), 0);
    }

    #[test]
    fn visible_honours_wildcard() {
        let dataset = Dataset::build(1, people()).unwrap();
        assert_eq!(dataset.visible(GestureSelection::All, HandSide::Left).count(), 2);
        assert_eq!(
            dataset
                .visible(GestureSelection::Only(GestureType::Zoom), HandSide::Left)
                .count(),
            1
        );
    }

    #[test]
    fn reload_bumps_version_and_keeps_old_snapshots() {
        let store = DatasetStore::load(&people()).unwrap();
        let first = store.snapshot();
        assert_eq!(first.version(), 1);

        store.replace(Vec::new()).unwrap();
        assert_eq!(store.current_version(), 2);
        assert_eq!(first.total_recordings(), 4);
        assert_eq!(store.snapshot().total_recordings(), 0);
    }

    #[test]
    fn malformed_reload_leaves_current_dataset() {
        let store = DatasetStore::load(&people()).unwrap();
        let mut broken = Person::new("carol");
        broken.add(GestureType::Zoom, GestureRecording::new("empty", HandSide::Right));

        let err = store.replace(vec![broken]).unwrap_err();
        assert!(matches!(err, ConsensusError::MalformedRecording { .. }));
        assert_eq!(store.current_version(), 1);
        assert_eq!(store.snapshot().total_recordings(), 4);
    }

    #[test]
    fn concurrent_reloads_get_distinct_versions() {
        let store = Arc::new(DatasetStore::load(&people()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.replace(people()).unwrap().version())
            })
            .collect();

        let mut versions: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        versions.sort_unstable();
        assert_eq!(versions, vec![2, 3, 4, 5]);
        assert_eq!(store.current_version(), 5);
    }

    #[test]
    fn failed_reload_does_not_consume_a_version() {
        let store = DatasetStore::load(&people()).unwrap();
        let mut broken = Person::new("carol");
        broken.add(GestureType::Zoom, GestureRecording::new("empty", HandSide::Right));
        assert!(store.replace(vec![broken]).is_err());

        assert_eq!(store.replace(people()).unwrap().version(), 2);
    }
}
