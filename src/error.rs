//! Error type shared by the whole crate.
//!
//! Divergence of a Langevin trajectory is deliberately absent here: it is an
//! ordinary outcome of a sample (see [`crate::langevin::Phase`]), not a failure
//! of the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LangevinError>;

#[derive(Debug, Error)]
pub enum LangevinError {
    #[error("invalid lattice side length {0}: must be at least 2")]
    InvalidSideLength(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot read configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("cannot open output {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("record framing mismatch: leading marker {leading}, trailing marker {trailing}")]
    FramingMismatch { leading: i32, trailing: i32 },

    #[error("unexpected record length: expected {expected} bytes, found {found}")]
    RecordLength { expected: usize, found: i32 },

    #[error("stream ends inside a record")]
    TruncatedRecord,

    #[error("{found} sites where {expected} were expected")]
    SiteCountMismatch { expected: usize, found: usize },

    #[error("body record written before the header")]
    MissingHeader,

    #[error("header already written to this stream")]
    HeaderAlreadyWritten,

    #[error("field state has {found} time slices, integrator expects {expected}")]
    TimeSliceMismatch { expected: usize, found: usize },

    #[error("{failed} of {total} sweep points failed")]
    SweepFailed { failed: usize, total: usize },

    #[error("header declares invalid site count {0}")]
    InvalidSiteCount(i32),
}
