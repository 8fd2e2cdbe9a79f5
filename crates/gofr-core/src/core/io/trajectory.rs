use super::traits::FrameSource;
use super::xyz::XyzReader;
use super::{Format, TrajectoryError};
use crate::core::models::cell::UnitCell;
use crate::core::models::frame::Frame;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A trajectory file opened for reading.
///
/// The number of steps is computed once when the file is opened. Cell and
/// topology overrides apply to every frame read after they are set.
pub struct Trajectory {
    path: PathBuf,
    reader: XyzReader<BufReader<File>>,
    nsteps: usize,
    cell: Option<UnitCell>,
    topology: Option<Vec<String>>,
}

fn open_reader(path: &Path) -> Result<XyzReader<BufReader<File>>, TrajectoryError> {
    let file = File::open(path).map_err(|source| TrajectoryError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(XyzReader::new(BufReader::new(file)))
}

impl Trajectory {
    pub fn open(path: impl AsRef<Path>, format: Format) -> Result<Self, TrajectoryError> {
        let path = path.as_ref();
        match format {
            Format::Xyz => {
                let nsteps = open_reader(path)?.count_frames()?;
                info!(path = %path.display(), nsteps, format = format.name(), "Opened trajectory.");
                Ok(Self {
                    path: path.to_path_buf(),
                    reader: open_reader(path)?,
                    nsteps,
                    cell: None,
                    topology: None,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Uses `cell` instead of the cell stored in the file.
    pub fn set_cell(&mut self, cell: UnitCell) {
        debug!(?cell, "Overriding trajectory unit cell.");
        self.cell = Some(cell);
    }

    /// Takes atom names from the first frame of another file.
    pub fn set_topology(
        &mut self,
        path: impl AsRef<Path>,
        format: Format,
    ) -> Result<(), TrajectoryError> {
        let path = path.as_ref();
        let frame = match format {
            Format::Xyz => open_reader(path)?
                .read_frame()?
                .ok_or(TrajectoryError::EndOfTrajectory)?,
        };
        debug!(path = %path.display(), natoms = frame.size(), "Loaded topology override.");
        self.topology = Some(frame.names().to_vec());
        Ok(())
    }
}

impl FrameSource for Trajectory {
    fn nsteps(&self) -> usize {
        self.nsteps
    }

    fn read_next(&mut self) -> Result<Frame, TrajectoryError> {
        let mut frame = self
            .reader
            .read_frame()?
            .ok_or(TrajectoryError::EndOfTrajectory)?;
        if let Some(cell) = &self.cell {
            frame.set_cell(cell.clone());
        }
        if let Some(names) = &self.topology {
            frame.set_names(names.clone())?;
        }
        Ok(frame)
    }
}
