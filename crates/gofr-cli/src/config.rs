mod defaults;
mod file;
mod models;

pub use file::FileConfig;
pub use models::AppConfig;

use crate::cli::{AnglesArgs, RdfArgs, TrajectoryArgs};
use crate::error::{CliError, Result};
use defaults::{ANGLES_EXTENSION, DefaultsConfig, RDF_EXTENSION};
use file::FileTrajectoryConfig;
use gofr::core::io::Format;
use gofr::core::models::cell::parse_cell;
use gofr::engine::config::{
    AngleConfig, ConfigError, RdfConfig, RdfConfigBuilder, StepRange, TrajectoryOptions,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Merges built-in defaults, the optional `--config` file and the command
/// line, in increasing order of priority.
pub fn build_config(args: &RdfArgs) -> Result<AppConfig<RdfConfig>> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file(&args.input)?;
    let rdf_file = file_config.rdf.unwrap_or_default();
    let trajectory = build_trajectory(
        &args.input,
        file_config.trajectory.unwrap_or_default(),
        &defaults,
    )?;

    let mut builder = RdfConfigBuilder::new()
        .selection(
            args.selection
                .clone()
                .or(rdf_file.selection)
                .unwrap_or(defaults.selection),
        )
        .max_distance(
            args.max_distance
                .or(rdf_file.max)
                .unwrap_or(defaults.max_distance),
        )
        .points(args.points.or(rdf_file.points).unwrap_or(defaults.points));
    if let Some(cell) = &trajectory.cell {
        builder = builder.cell(cell.clone());
    }
    let rdf = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    let output = output_path(&args.input, RDF_EXTENSION);
    debug!(?rdf, ?trajectory, output = %output.display(), "Merged configuration.");
    Ok(AppConfig {
        analysis: rdf,
        trajectory,
        output,
    })
}

/// Same layering as [`build_config`] for the `angles` subcommand.
pub fn build_angles_config(args: &AnglesArgs) -> Result<AppConfig<AngleConfig>> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file(&args.input)?;
    let angles_file = file_config.angles.unwrap_or_default();
    let trajectory = build_trajectory(
        &args.input,
        file_config.trajectory.unwrap_or_default(),
        &defaults,
    )?;

    let points = args.points.or(angles_file.points).unwrap_or(defaults.points);
    if points == 0 {
        let error = ConfigError::InvalidValue {
            parameter: "points",
            reason: "must be at least 1".into(),
        };
        return Err(CliError::Config(error.to_string()));
    }
    let angles = AngleConfig {
        selection: args
            .selection
            .clone()
            .or(angles_file.selection)
            .unwrap_or(defaults.angle_selection),
        points,
    };

    let output = output_path(&args.input, ANGLES_EXTENSION);
    debug!(?angles, ?trajectory, output = %output.display(), "Merged configuration.");
    Ok(AppConfig {
        analysis: angles,
        trajectory,
        output,
    })
}

fn load_file(args: &TrajectoryArgs) -> Result<FileConfig> {
    match &args.config {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

fn build_trajectory(
    args: &TrajectoryArgs,
    file: FileTrajectoryConfig,
    defaults: &DefaultsConfig,
) -> Result<TrajectoryOptions> {
    let format_name = args
        .format
        .clone()
        .or(file.format)
        .unwrap_or_else(|| defaults.format.clone());
    let format = Format::from_name(&format_name).map_err(|e| CliError::Argument(e.to_string()))?;

    let cell = args
        .cell
        .as_deref()
        .or(file.cell.as_deref())
        .map(parse_cell)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let range = StepRange {
        start: args.start.or(file.start).unwrap_or(defaults.start),
        end: args.end.or(file.end),
        stride: args.stride.or(file.stride).unwrap_or(defaults.stride),
    };

    Ok(TrajectoryOptions {
        path: args.trajectory.clone(),
        format,
        range,
        cell,
        topology: args.topology.clone().or(file.topology),
    })
}

fn output_path(args: &TrajectoryArgs, extension: &str) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.trajectory, extension))
}

/// `traj.xyz` gives `traj.xyz.rdf` for the `rdf` extension.
fn default_output_path(trajectory: &Path, extension: &str) -> PathBuf {
    let mut output = trajectory.as_os_str().to_owned();
    output.push(".");
    output.push(extension);
    PathBuf::from(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use gofr::core::models::cell::CellShape;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn rdf_args(extra: &[&str]) -> RdfArgs {
        let mut args = vec!["gofr", "rdf", "traj.xyz"];
        args.extend_from_slice(extra);
        let Commands::Rdf(args) = Cli::parse_from(args).command else {
            panic!("expected the rdf subcommand");
        };
        args
    }

    fn angles_args(extra: &[&str]) -> AnglesArgs {
        let mut args = vec!["gofr", "angles", "traj.xyz"];
        args.extend_from_slice(extra);
        let Commands::Angles(args) = Cli::parse_from(args).command else {
            panic!("expected the angles subcommand");
        };
        args
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = build_config(&rdf_args(&[])).unwrap();

        assert_eq!(config.analysis.selection, "all");
        assert_eq!(config.analysis.max_distance, 10.0);
        assert_eq!(config.analysis.points, 200);
        assert_eq!(config.output, PathBuf::from("traj.xyz.rdf"));
        assert_eq!(config.trajectory.range, StepRange::default());
        assert_eq!(config.trajectory.format, Format::Xyz);
        assert!(config.trajectory.cell.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "gofr.toml",
            r#"
        [rdf]
        selection = "pairs: name(#1) O and name(#2) H"
        max = 6.5
        points = 130

        [trajectory]
        format = "xyz"
        start = 10
        end = 100
        stride = 5
        topology = "top.xyz"
        "#,
        );

        let config = build_config(&rdf_args(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(config.analysis.selection, "pairs: name(#1) O and name(#2) H");
        assert_eq!(config.analysis.max_distance, 6.5);
        assert_eq!(config.analysis.points, 130);
        assert_eq!(
            config.trajectory.range,
            StepRange {
                start: 10,
                end: Some(100),
                stride: 5
            }
        );
        assert_eq!(config.trajectory.topology, Some(PathBuf::from("top.xyz")));
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "gofr.toml",
            "[rdf]\nselection = \"name O\"\npoints = 50\n\n[trajectory]\nstride = 4\n",
        );

        let config = build_config(&rdf_args(&[
            "--config",
            path.to_str().unwrap(),
            "-s",
            "name H",
            "--stride",
            "2",
            "-o",
            "g.dat",
        ]))
        .unwrap();
        assert_eq!(config.analysis.selection, "name H");
        assert_eq!(config.analysis.points, 50);
        assert_eq!(config.trajectory.range.stride, 2);
        assert_eq!(config.output, PathBuf::from("g.dat"));
    }

    #[test]
    fn cell_sets_max_distance_and_trajectory_override() {
        let config = build_config(&rdf_args(&["--max", "25", "-c", "12:16:20"])).unwrap();
        assert_eq!(config.analysis.max_distance, 6.0);
        let cell = config.trajectory.cell.unwrap();
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
        assert_eq!(cell.lengths(), [12.0, 16.0, 20.0]);
    }

    #[test]
    fn invalid_cell_is_an_argument_error() {
        assert!(matches!(
            build_config(&rdf_args(&["-c", "10:10"])),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn unknown_format_is_an_argument_error() {
        assert!(matches!(
            build_config(&rdf_args(&["--format", "PDB"])),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn zero_points_is_a_config_error() {
        assert!(matches!(
            build_config(&rdf_args(&["-p", "0"])),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn unknown_key_in_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "bad.toml", "[rdf]\nbins = 10\n");
        assert!(matches!(
            build_config(&rdf_args(&["--config", path.to_str().unwrap()])),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_config_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        match build_config(&rdf_args(&["--config", path.to_str().unwrap()])) {
            Err(CliError::FileParsing { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("a missing config file must be an error"),
        }
    }

    #[test]
    fn angles_defaults_use_triplets_and_ang_extension() {
        let config = build_angles_config(&angles_args(&[])).unwrap();
        assert_eq!(config.analysis.selection, "three: all");
        assert_eq!(config.analysis.points, 200);
        assert_eq!(config.output, PathBuf::from("traj.xyz.ang"));
        assert_eq!(config.trajectory.range, StepRange::default());
    }

    #[test]
    fn angles_section_of_the_file_is_layered_under_flags() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "gofr.toml",
            "[angles]\nselection = \"four: all\"\npoints = 72\n\n[rdf]\npoints = 10\n\n[trajectory]\nstride = 3\n",
        );

        let config =
            build_angles_config(&angles_args(&["--config", path.to_str().unwrap(), "-p", "36"]))
                .unwrap();
        assert_eq!(config.analysis.selection, "four: all");
        assert_eq!(config.analysis.points, 36);
        assert_eq!(config.trajectory.range.stride, 3);
    }

    #[test]
    fn angles_with_zero_points_is_a_config_error() {
        assert!(matches!(
            build_angles_config(&angles_args(&["-p", "0"])),
            Err(CliError::Config(_))
        ));
    }
}
