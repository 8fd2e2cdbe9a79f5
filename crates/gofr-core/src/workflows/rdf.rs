use crate::core::models::frame::Frame;
use crate::core::selection::{Match, Selection};
use crate::engine::command::AverageCommand;
use crate::engine::config::{ConfigError, RdfConfig, TrajectoryOptions};
use crate::engine::error::EngineError;
use crate::engine::histogram::Histogram;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner;
use crate::workflows::output;
use itertools::Either;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Frames with fewer candidate pairs are binned on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 4096;

/// Radial distribution function between the atoms of a selection.
///
/// Single-atom selections use every ordered pair of distinct matching atoms,
/// so each physical pair is counted twice. Pair selections (`pairs: ...`)
/// use each matched tuple once. Both share the same normalization constant,
/// including its factor of two, so pair-mode values come out about half as
/// large as the single-atom convention would give.
#[derive(Debug, Clone)]
pub struct Rdf {
    config: RdfConfig,
    selection: Selection,
}

/// Accumulation state of one RDF run.
#[derive(Debug, Clone)]
pub struct RdfState {
    histogram: Histogram,
    pair_count: u64,
    natoms: usize,
    volume: f64,
}

impl RdfState {
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Pairs binned so far, across all frames.
    pub fn pair_count(&self) -> u64 {
        self.pair_count
    }
}

/// Pairs of atoms considered in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PairCandidates {
    /// Every ordered pair `(i, j)`, `i != j`, of the listed atoms.
    AllPairs(Vec<usize>),
    /// Explicit pairs matched by the selection.
    Matched(Vec<Match>),
}

impl PairCandidates {
    pub fn len(&self) -> usize {
        match self {
            PairCandidates::AllPairs(atoms) => atoms.len() * atoms.len().saturating_sub(1),
            PairCandidates::Matched(matches) => matches.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        match self {
            PairCandidates::AllPairs(atoms) => Either::Left(atoms.iter().flat_map(move |&i| {
                atoms
                    .iter()
                    .filter(move |&&j| j != i)
                    .map(move |&j| (i, j))
            })),
            PairCandidates::Matched(matches) => Either::Right(matches.iter().map(|m| (m[0], m[1]))),
        }
    }
}

impl Rdf {
    /// Validates the configuration and parses the selection.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid selection, a selection
    /// matching more than two atoms, or invalid histogram parameters.
    pub fn new(config: RdfConfig) -> Result<Self, EngineError> {
        let selection = Selection::new(&config.selection)?;
        if !(1..=2).contains(&selection.size()) {
            return Err(ConfigError::UnsupportedArity {
                command: "RDF",
                arity: selection.size(),
                expected: "only 1 or 2 are supported",
            }
            .into());
        }
        Histogram::new(config.points, 0.0, config.max_distance)?;

        Ok(Self { config, selection })
    }

    pub fn config(&self) -> &RdfConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Builds the candidate pairs of a frame.
    pub fn candidates(&self, frame: &Frame) -> Result<PairCandidates, EngineError> {
        if self.selection.size() == 1 {
            Ok(PairCandidates::AllPairs(self.selection.list(frame)?))
        } else {
            Ok(PairCandidates::Matched(self.selection.evaluate(frame)))
        }
    }

    #[inline]
    fn tally(&self, frame: &Frame, histogram: &mut Histogram, count: &mut u64, i: usize, j: usize) {
        let distance = frame.distance(i, j);
        if distance < self.config.max_distance {
            histogram.insert_at(distance);
            *count += 1;
        }
    }

    fn bin_candidates(&self, frame: &Frame, candidates: &PairCandidates, state: &mut RdfState) {
        #[cfg(feature = "parallel")]
        if candidates.len() >= PARALLEL_THRESHOLD {
            self.bin_parallel(frame, candidates, state);
            return;
        }
        for (i, j) in candidates.pairs() {
            self.tally(frame, &mut state.histogram, &mut state.pair_count, i, j);
        }
    }

    #[cfg(feature = "parallel")]
    fn bin_parallel(&self, frame: &Frame, candidates: &PairCandidates, state: &mut RdfState) {
        let empty = || (state.histogram.empty_like(), 0u64);
        let merge = |mut a: (Histogram, u64), b: (Histogram, u64)| {
            a.0.merge(&b.0);
            a.1 += b.1;
            a
        };

        let (partial, count) = match candidates {
            PairCandidates::AllPairs(atoms) => atoms
                .par_iter()
                .fold(empty, |(mut histogram, mut count), &i| {
                    for &j in atoms.iter().filter(|&&j| j != i) {
                        self.tally(frame, &mut histogram, &mut count, i, j);
                    }
                    (histogram, count)
                })
                .reduce(empty, merge),
            PairCandidates::Matched(matches) => matches
                .par_iter()
                .fold(empty, |(mut histogram, mut count), m| {
                    self.tally(frame, &mut histogram, &mut count, m[0], m[1]);
                    (histogram, count)
                })
                .reduce(empty, merge),
        };

        state.histogram.merge(&partial);
        state.pair_count += count;
    }
}

impl AverageCommand for Rdf {
    type State = RdfState;
    type Report = RdfReport;

    fn name(&self) -> &'static str {
        "rdf"
    }

    fn configure(&self) -> Result<RdfState, EngineError> {
        let histogram = Histogram::new(self.config.points, 0.0, self.config.max_distance)?;
        info!(
            selection = self.selection.string(),
            points = self.config.points,
            max_distance = self.config.max_distance,
            "Configured radial distribution function."
        );
        Ok(RdfState {
            histogram,
            pair_count: 0,
            natoms: 0,
            volume: 0.0,
        })
    }

    fn accumulate(&self, frame: &Frame, state: &mut RdfState) -> Result<(), EngineError> {
        let candidates = self.candidates(frame)?;
        let before = state.pair_count;
        if !candidates.is_empty() {
            self.bin_candidates(frame, &candidates, state);
        }

        state.natoms = frame.size();
        state.volume = frame.cell().volume();
        debug!(
            step = frame.step(),
            candidates = candidates.len(),
            binned = state.pair_count - before,
            "Binned pair distances."
        );
        Ok(())
    }

    #[instrument(skip_all, name = "rdf_finalize")]
    fn finalize(&self, state: RdfState) -> Result<RdfReport, EngineError> {
        const PI: f64 = std::f64::consts::PI;

        let RdfState {
            mut histogram,
            pair_count,
            natoms,
            volume,
        } = state;

        let volume = if volume > 0.0 { volume } else { 1.0 };
        let dr = histogram.bin_width();
        let rho = natoms as f64 / volume;
        let norm = 1e-6 * 2.0 * 4.0 * PI * rho * pair_count as f64 * dr;

        if pair_count == 0 {
            warn!("No pair found within the maximal distance, the RDF is left at zero.");
        } else {
            histogram.normalize(|i, count| {
                let r = (i as f64 + 0.5) * dr;
                count / (norm * r * r)
            });
        }

        info!(pair_count, natoms, volume, "Normalized radial distribution function.");
        Ok(RdfReport {
            bin_width: dr,
            values: histogram.into_vec(),
            pair_count,
            natoms,
            volume,
        })
    }
}

/// Normalized g(r), one value per histogram bin.
#[derive(Debug, Clone, PartialEq)]
pub struct RdfReport {
    pub bin_width: f64,
    pub values: Vec<f64>,
    /// Pairs binned over the whole trajectory.
    pub pair_count: u64,
    /// Atom count of the last frame, used for the density.
    pub natoms: usize,
    /// Volume used for the density, `1` when the last cell had no volume.
    pub volume: f64,
}

impl RdfReport {
    /// `(lower edge of the bin, g(r))` for every bin.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &value)| (i as f64 * self.bin_width, value))
    }

    pub fn write_to(
        &self,
        writer: &mut impl Write,
        trajectory: &str,
        selection: &str,
    ) -> io::Result<()> {
        let header = [
            format!("Radial distribution function in trajectory {}", trajectory),
            format!("Selection: {}", selection),
        ];
        output::write_table(writer, &header, self.points())
    }

    pub fn write_to_path(
        &self,
        path: &Path,
        trajectory: &str,
        selection: &str,
    ) -> Result<(), EngineError> {
        output::write_file(path, |writer| self.write_to(writer, trajectory, selection))
    }
}

/// Computes the RDF of a trajectory file and writes it to `output`.
///
/// # Errors
///
/// Configuration errors are raised before the trajectory is opened, an
/// output path that can not be written is reported before any frame is
/// read, and trajectory read errors abort the run.
#[instrument(skip_all, name = "rdf_workflow", fields(trajectory = %trajectory.path.display()))]
pub fn run(
    config: &RdfConfig,
    trajectory: &TrajectoryOptions,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<RdfReport, EngineError> {
    let rdf = Rdf::new(config.clone())?;
    output::check_writable(output)?;

    let mut source = super::open_trajectory(trajectory)?;
    let report = runner::run(&rdf, &mut source, &trajectory.range, reporter)?;

    info!(output = %output.display(), "Writing radial distribution function.");
    report.write_to_path(
        output,
        &trajectory.path.display().to_string(),
        rdf.selection().string(),
    )?;
    reporter.report(Progress::Message(format!("Wrote {}", output.display())));
    Ok(report)
}
