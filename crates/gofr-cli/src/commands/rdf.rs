use crate::cli::RdfArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gofr::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub fn run(args: RdfArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = config::build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Computing radial distribution function of {}...",
        app_config.trajectory.path.display()
    );
    info!(
        selection = %app_config.analysis.selection,
        max_distance = app_config.analysis.max_distance,
        points = app_config.analysis.points,
        "Invoking the core RDF workflow..."
    );

    let report = workflows::rdf::run(
        &app_config.analysis,
        &app_config.trajectory,
        &app_config.output,
        &reporter,
    )?;

    if report.pair_count == 0 {
        warn!("No pair of atoms was found within the maximal distance.");
        println!("Warning: no pair found within {}.", app_config.analysis.max_distance);
    }
    println!(
        "✓ RDF ({} pairs, {} points) written to: {}",
        report.pair_count,
        report.values.len(),
        app_config.output.display()
    );

    Ok(())
}
