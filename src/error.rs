// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsensusError>;

#[derive(Debug, Error)]
pub enum ConsensusError {
    /// A gesture or hand name that does not resolve to a concrete filter value.
    #[error("invalid filter: {0:?} is not a recognised {1}")]
    InvalidFilter(String, &'static str),

    #[error("malformed recording {name:?}: {reason}")]
    MalformedRecording { name: String, reason: String },

    #[error("dataset snapshot v{started} was superseded by v{current} during aggregation")]
    StaleSnapshot { started: u64, current: u64 },

    #[error("cannot read dataset at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid capture file: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ConsensusError {
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecording {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
