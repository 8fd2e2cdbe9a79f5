use gofr::engine::config::TrajectoryOptions;
use std::path::PathBuf;

/// Fully merged settings of one subcommand; `analysis` holds the
/// analysis-specific part, e.g. `RdfConfig`.
pub struct AppConfig<C> {
    pub analysis: C,
    pub trajectory: TrajectoryOptions,
    pub output: PathBuf,
}
