// src/loader.rs
use crate::dataset::RecordingSource;
use crate::error::{ConsensusError, Result};
use crate::geometry::Point3;
use crate::gesture::{GestureType, HandSide};
use crate::model::{GestureRecording, JointFrame, Person, NUM_JOINTS};
use csv::{ReaderBuilder, Writer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const COLUMNS: usize = 1 + NUM_JOINTS * 3;

/// Reads `<root>/<person>/<gesture>-<hand>[-suffix].csv` capture files.
///
/// Each row is `timestamp, x0, y0, z0, ..., x20, y20, z20` after a header line.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_person(&self, dir: &Path) -> Result<Person<GestureRecording>> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut person = Person::new(name);

        for path in sorted_entries(dir)? {
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let (gesture, hand) = parse_file_name(&path)?;
            let recording = read_recording(&path, hand)?;
            debug!(
                "Loaded {} ({} frame(s)) for {}",
                path.display(),
                recording.frames.len(),
                person.name
            );
            person.add(gesture, recording);
        }
        Ok(person)
    }
}

impl RecordingSource for CsvDirectorySource {
    fn load_all(&self) -> Result<Vec<Person<GestureRecording>>> {
        let mut persons = Vec::new();
        for path in sorted_entries(&self.root)? {
            if path.is_dir() {
                persons.push(self.load_person(&path)?);
            }
        }
        info!(
            "Loaded {} person(s) from {}",
            persons.len(),
            self.root.display()
        );
        Ok(persons)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ConsensusError::io(dir, e))?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| ConsensusError::io(dir, e))?;
    paths.sort();
    Ok(paths)
}

fn parse_file_name(path: &Path) -> Result<(GestureType, HandSide)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut parts = stem.split('-');
    match (parts.next(), parts.next()) {
        (Some(gesture), Some(hand)) => Ok((gesture.parse()?, hand.parse()?)),
        _ => Err(ConsensusError::malformed(
            path.display().to_string(),
            "file name must be <gesture>-<hand>[-suffix].csv",
        )),
    }
}

/// Reads one capture file. Rows with the wrong column count fail the load.
pub fn read_recording(path: &Path, hand: HandSide) -> Result<GestureRecording> {
    let name = path.display().to_string();
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut recording = GestureRecording::new(
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone()),
        hand,
    );

    for (row, values) in reader.deserialize::<Vec<f64>>().enumerate() {
        let values = values?;
        if values.len() != COLUMNS {
            return Err(ConsensusError::malformed(
                &name,
                format!("row {} has {} columns, expected {}", row + 1, values.len(), COLUMNS),
            ));
        }
        let joints = values[1..]
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        recording.push(JointFrame::new(joints, values[0])?);
    }
    Ok(recording)
}

/// Writes frames in the layout `read_recording` expects.
pub fn write_recording(path: &Path, frames: &[JointFrame]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConsensusError::io(parent, e))?;
    }
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["timestamp".to_string()];
    for j in 0..NUM_JOINTS {
        header.extend(["x", "y", "z"].iter().map(|axis| format!("{axis}{j}")));
    }
    writer.write_record(&header)?;

    for frame in frames {
        let mut row = Vec::with_capacity(COLUMNS);
        row.push(frame.timestamp());
        for p in frame.joints() {
            row.extend_from_slice(&[p.x, p.y, p.z]);
        }
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| ConsensusError::io(path, e))?;
    Ok(())
}
