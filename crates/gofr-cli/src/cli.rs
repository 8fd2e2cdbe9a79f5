use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The gofr developers",
    version,
    about = "gofr - streaming analysis of molecular dynamics trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the radial distribution function g(r) of a trajectory.
    Rdf(RdfArgs),
    /// Compute the distribution of angles or dihedral angles in a trajectory.
    Angles(AnglesArgs),
}

/// Input and output options shared by every analysis.
///
/// Every option left unset falls back to the `--config` file, then to the
/// built-in defaults.
#[derive(Args, Debug)]
pub struct TrajectoryArgs {
    /// Path to the input trajectory.
    #[arg(required = true, value_name = "TRAJECTORY")]
    pub trajectory: PathBuf,

    /// Write the result to this file.
    /// Defaults to the trajectory path with the analysis extension appended.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Unit cell to use instead of the one in the trajectory:
    /// 'L', 'a:b:c' or 'a:b:c:alpha:beta:gamma'.
    #[arg(short, long, value_name = "CELL")]
    pub cell: Option<String>,

    /// Read atom names from the first frame of this file.
    #[arg(short, long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Trajectory format (only 'XYZ' is supported).
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// First step to use.
    #[arg(long, value_name = "N")]
    pub start: Option<usize>,

    /// Last step to use (exclusive). Defaults to the end of the trajectory.
    #[arg(long, value_name = "N")]
    pub end: Option<usize>,

    /// Use one step out of N.
    #[arg(long, value_name = "N")]
    pub stride: Option<usize>,

    /// Path to a configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `rdf` subcommand. The default output is `<TRAJECTORY>.rdf`.
#[derive(Args, Debug)]
pub struct RdfArgs {
    #[command(flatten)]
    pub input: TrajectoryArgs,

    /// Selection of the atoms to use. Either a single atom selection
    /// ("name O") or a selection of pairs ("pairs: name(#1) O and name(#2) H").
    #[arg(short, long, value_name = "SELECTION")]
    pub selection: Option<String>,

    /// Maximal distance to use. Ignored when a unit cell is given with
    /// --cell, half of its shortest length is used instead.
    #[arg(long = "max", value_name = "FLOAT")]
    pub max_distance: Option<f64>,

    /// Number of points in the histogram.
    #[arg(short, long, value_name = "INT")]
    pub points: Option<usize>,
}

/// Arguments for the `angles` subcommand. The default output is `<TRAJECTORY>.ang`.
#[derive(Args, Debug)]
pub struct AnglesArgs {
    #[command(flatten)]
    pub input: TrajectoryArgs,

    /// Selection of the atoms to use. Three atoms give bond angles
    /// ("three: name(#1) H and name(#2) O and name(#3) H"), four atoms give
    /// dihedral angles ("four: all").
    #[arg(short, long, value_name = "SELECTION")]
    pub selection: Option<String>,

    /// Number of points in the histogram.
    #[arg(short, long, value_name = "INT")]
    pub points: Option<usize>,
}
