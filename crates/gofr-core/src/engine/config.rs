use crate::core::io::Format;
use crate::core::models::cell::{CellShape, UnitCell};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SELECTION: &str = "all";
pub const DEFAULT_MAX_DISTANCE: f64 = 10.0;
pub const DEFAULT_POINTS: usize = 200;
pub const DEFAULT_ANGLE_SELECTION: &str = "three: all";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Can not use a selection with {arity} atoms in {command}, {expected}")]
    UnsupportedArity {
        command: &'static str,
        arity: usize,
        expected: &'static str,
    },

    #[error("Can not have 'start' ({start}) bigger than 'end' ({end})")]
    InvalidStepRange { start: usize, end: usize },
}

/// Which steps of a trajectory are analysed: `start..end` every `stride` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: usize,
    /// Exclusive; `None` means the end of the trajectory.
    pub end: Option<usize>,
    pub stride: usize,
}

impl Default for StepRange {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            stride: 1,
        }
    }
}

impl StepRange {
    /// Resolves the steps to read for a trajectory with `nsteps` steps.
    pub fn resolve(&self, nsteps: usize) -> Result<std::iter::StepBy<std::ops::Range<usize>>, ConfigError> {
        if self.stride == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "stride",
                reason: "must be at least 1".into(),
            });
        }
        let end = self.end.unwrap_or(nsteps);
        if self.start > end {
            return Err(ConfigError::InvalidStepRange {
                start: self.start,
                end,
            });
        }
        Ok((self.start..end).step_by(self.stride))
    }
}

/// Where frames come from and how they are adjusted before analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryOptions {
    pub path: PathBuf,
    pub format: Format,
    pub range: StepRange,
    pub cell: Option<UnitCell>,
    pub topology: Option<PathBuf>,
}

impl TrajectoryOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: Format::default(),
            range: StepRange::default(),
            cell: None,
            topology: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RdfConfig {
    pub selection: String,
    pub max_distance: f64,
    pub points: usize,
}

impl Default for RdfConfig {
    fn default() -> Self {
        Self {
            selection: DEFAULT_SELECTION.to_string(),
            max_distance: DEFAULT_MAX_DISTANCE,
            points: DEFAULT_POINTS,
        }
    }
}

#[derive(Default)]
pub struct RdfConfigBuilder {
    selection: Option<String>,
    max_distance: Option<f64>,
    points: Option<usize>,
    cell: Option<UnitCell>,
}

impl RdfConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
    pub fn max_distance(mut self, max: f64) -> Self {
        self.max_distance = Some(max);
        self
    }
    pub fn points(mut self, points: usize) -> Self {
        self.points = Some(points);
        self
    }
    /// A user supplied cell; when periodic it sets the maximal distance to
    /// half of its shortest length.
    pub fn cell(mut self, cell: UnitCell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn build(self) -> Result<RdfConfig, ConfigError> {
        let mut max_distance = self.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE);
        if let Some(cell) = self.cell.filter(|c| c.shape() != CellShape::Infinite) {
            let shortest = cell.lengths().into_iter().fold(f64::INFINITY, f64::min);
            max_distance = shortest / 2.0;
        }

        if !max_distance.is_finite() || max_distance <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_distance",
                reason: format!("must be positive, got {}", max_distance),
            });
        }
        let points = self.points.unwrap_or(DEFAULT_POINTS);
        if points == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "points",
                reason: "must be at least 1".into(),
            });
        }

        Ok(RdfConfig {
            selection: self
                .selection
                .unwrap_or_else(|| DEFAULT_SELECTION.to_string()),
            max_distance,
            points,
        })
    }
}

/// Angle distribution parameters. The histogram range follows from the
/// selection: `[0, π)` for triplets, `[0, 2π)` for quadruplets.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleConfig {
    pub selection: String,
    pub points: usize,
}

impl Default for AngleConfig {
    fn default() -> Self {
        Self {
            selection: DEFAULT_ANGLE_SELECTION.to_string(),
            points: DEFAULT_POINTS,
        }
    }
}
