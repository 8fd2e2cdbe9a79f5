use super::error::EngineError;
use crate::core::models::frame::Frame;

/// A time-averaged analysis over a trajectory.
///
/// The lifecycle is driven by [`crate::engine::runner::run`]:
///
/// 1. [`configure`](AverageCommand::configure) builds the accumulation state
///    once, before any frame is read.
/// 2. [`accumulate`](AverageCommand::accumulate) folds each frame into it.
/// 3. [`finalize`](AverageCommand::finalize) consumes the state and produces
///    the report. Taking the state by value guarantees that normalization
///    happens once per run.
pub trait AverageCommand {
    /// Data accumulated across frames.
    type State;
    /// Result produced once all frames have been seen.
    type Report;

    fn name(&self) -> &'static str;

    fn configure(&self) -> Result<Self::State, EngineError>;

    fn accumulate(&self, frame: &Frame, state: &mut Self::State) -> Result<(), EngineError>;

    fn finalize(&self, state: Self::State) -> Result<Self::Report, EngineError>;
}
