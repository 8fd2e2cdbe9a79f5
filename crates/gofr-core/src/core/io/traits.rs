use super::TrajectoryError;
use crate::core::models::frame::Frame;

/// A sequential stream of trajectory frames.
///
/// Frames are produced strictly in order; a source is never rewound. The
/// engine only relies on this trait, so in-memory sources can stand in for
/// files.
pub trait FrameSource {
    /// Total number of steps available from the beginning of the source.
    fn nsteps(&self) -> usize;

    /// Reads the next frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data is unreadable or malformed,
    /// or if the source is exhausted.
    fn read_next(&mut self) -> Result<Frame, TrajectoryError>;

    /// Reads and discards `count` frames.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`FrameSource::read_next`].
    fn skip(&mut self, count: usize) -> Result<(), TrajectoryError> {
        for _ in 0..count {
            self.read_next()?;
        }
        Ok(())
    }
}

/// A [`FrameSource`] over frames already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    frames: std::collections::VecDeque<Frame>,
    nsteps: usize,
}

impl InMemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            nsteps: frames.len(),
            frames: frames.into(),
        }
    }
}

impl FrameSource for InMemorySource {
    fn nsteps(&self) -> usize {
        self.nsteps
    }

    fn read_next(&mut self) -> Result<Frame, TrajectoryError> {
        self.frames.pop_front().ok_or(TrajectoryError::EndOfTrajectory)
    }
}
