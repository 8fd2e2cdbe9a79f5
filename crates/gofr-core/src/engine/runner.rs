use super::command::AverageCommand;
use super::config::StepRange;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::traits::FrameSource;
use tracing::{debug, info, instrument};

/// Streams the frames selected by `range` through `command`.
///
/// Frames are read strictly in order and each one is accumulated before the
/// next is read. Any error aborts the run; nothing is retried.
///
/// # Errors
///
/// Returns a configuration error for an invalid `range` before any frame is
/// read, and propagates errors from the source and from the command.
#[instrument(skip_all, name = "average_run", fields(command = command.name()))]
pub fn run<C, S>(
    command: &C,
    source: &mut S,
    range: &StepRange,
    reporter: &ProgressReporter,
) -> Result<C::Report, EngineError>
where
    C: AverageCommand,
    S: FrameSource + ?Sized,
{
    let steps = range.resolve(source.nsteps())?;
    let mut state = command.configure()?;

    let total_frames = steps.len();
    info!(total_frames, nsteps = source.nsteps(), "Accumulating frames.");
    reporter.report(Progress::RunStart {
        command: command.name(),
        total_frames: total_frames as u64,
    });

    let mut cursor = 0;
    for step in steps {
        source.skip(step - cursor)?;
        let frame = source.read_next()?;
        cursor = step + 1;

        debug!(step, natoms = frame.size(), "Accumulating frame.");
        command.accumulate(&frame, &mut state)?;
        reporter.report(Progress::FrameDone { step });
    }

    reporter.report(Progress::RunFinish);
    info!("Finalizing results.");
    command.finalize(state)
}
