use crate::cli::AnglesArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gofr::engine::progress::ProgressReporter;
use gofr::workflows::{self, angles::AngleKind};
use tracing::{info, warn};

pub fn run(args: AnglesArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = config::build_angles_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Computing angle distribution of {}...",
        app_config.trajectory.path.display()
    );
    info!(
        selection = %app_config.analysis.selection,
        points = app_config.analysis.points,
        "Invoking the core angles workflow..."
    );

    let report = workflows::angles::run(
        &app_config.analysis,
        &app_config.trajectory,
        &app_config.output,
        &reporter,
    )?;

    if report.count == 0 {
        warn!("The selection did not match any atoms.");
        println!("Warning: no angle matched '{}'.", app_config.analysis.selection);
    }
    let measured = match report.kind {
        AngleKind::Angle => "angles",
        AngleKind::Dihedral => "dihedral angles",
    };
    println!(
        "✓ Distribution of {} {} ({} points) written to: {}",
        report.count,
        measured,
        report.values.len(),
        app_config.output.display()
    );

    Ok(())
}
