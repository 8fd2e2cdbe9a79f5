//! Trajectory input.
//!
//! Frames reach the analysis engine through the [`traits::FrameSource`]
//! trait. [`trajectory::Trajectory`] implements it for files on disk, with
//! optional cell and topology overrides applied to every frame.

pub mod traits;
pub mod trajectory;
pub mod xyz;

use crate::core::models::frame::AtomCountMismatch;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Xyz,
}

impl Format {
    /// Looks a format up by name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, TrajectoryError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xyz" => Ok(Format::Xyz),
            _ => Err(TrajectoryError::UnknownFormat(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Xyz => "XYZ",
        }
    }
}

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("Could not open '{path}': {source}", path = path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Unknown trajectory format '{0}'")]
    UnknownFormat(String),
    #[error("Can not read past the end of the trajectory")]
    EndOfTrajectory,
    #[error("Topology does not match the trajectory: {0}")]
    Topology(#[from] AtomCountMismatch),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("Atom line needs a name and three coordinates")]
    MissingField,
    #[error("Invalid Lattice entry: {0}")]
    InvalidLattice(String),
    #[error("File ended in the middle of a frame")]
    Truncated,
}
