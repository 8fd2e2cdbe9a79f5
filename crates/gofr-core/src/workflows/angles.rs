use crate::core::models::frame::Frame;
use crate::core::selection::{Match, Selection};
use crate::engine::command::AverageCommand;
use crate::engine::config::{AngleConfig, ConfigError, TrajectoryOptions};
use crate::engine::error::EngineError;
use crate::engine::histogram::Histogram;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner;
use crate::workflows::output;
use std::f64::consts::{PI, TAU};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 4096;

/// What a match of the selection measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleKind {
    /// `i-j-k` bond angle, binned over `[0, π)`.
    Angle,
    /// `i-j-k-m` dihedral angle, shifted into `[0, 2π)` and binned there.
    Dihedral,
}

impl AngleKind {
    fn from_arity(arity: usize) -> Result<Self, ConfigError> {
        match arity {
            3 => Ok(AngleKind::Angle),
            4 => Ok(AngleKind::Dihedral),
            arity => Err(ConfigError::UnsupportedArity {
                command: "angle distribution",
                arity,
                expected: "only 3 (angles) or 4 (dihedrals) are supported",
            }),
        }
    }

    pub fn upper(self) -> f64 {
        match self {
            AngleKind::Angle => PI,
            AngleKind::Dihedral => TAU,
        }
    }
}

/// Histogram of the angles or dihedral angles between matched atoms,
/// scaled so that the most populated bin is 1.
#[derive(Debug, Clone)]
pub struct AngleDistribution {
    config: AngleConfig,
    selection: Selection,
    kind: AngleKind,
}

#[derive(Debug, Clone)]
pub struct AngleState {
    histogram: Histogram,
    count: u64,
}

impl AngleState {
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Angles binned so far, across all frames.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl AngleDistribution {
    /// # Errors
    ///
    /// Returns a configuration error for an invalid selection, a selection
    /// that does not match three or four atoms, or zero points.
    pub fn new(config: AngleConfig) -> Result<Self, EngineError> {
        let selection = Selection::new(&config.selection)?;
        let kind = AngleKind::from_arity(selection.size())?;
        Histogram::new(config.points, 0.0, kind.upper())?;

        Ok(Self {
            config,
            selection,
            kind,
        })
    }

    pub fn config(&self) -> &AngleConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn kind(&self) -> AngleKind {
        self.kind
    }

    /// The angle of one match in `[0, upper]`, or `None` when overlapping
    /// atoms leave it undefined.
    pub fn measure(&self, frame: &Frame, atoms: &Match) -> Option<f64> {
        let value = match self.kind {
            AngleKind::Angle => frame.angle(atoms[0], atoms[1], atoms[2]),
            AngleKind::Dihedral => {
                let phi = frame.dihedral(atoms[0], atoms[1], atoms[2], atoms[3]);
                if phi < 0.0 { phi + TAU } else { phi }
            }
        };
        value.is_finite().then_some(value)
    }

    #[inline]
    fn tally(&self, frame: &Frame, histogram: &mut Histogram, count: &mut u64, atoms: &Match) {
        if let Some(value) = self.measure(frame, atoms) {
            histogram.insert_at(value);
            *count += 1;
        }
    }

    fn bin_matches(&self, frame: &Frame, matches: &[Match], state: &mut AngleState) {
        #[cfg(feature = "parallel")]
        if matches.len() >= PARALLEL_THRESHOLD {
            let empty = || (state.histogram.empty_like(), 0u64);
            let (partial, count) = matches
                .par_iter()
                .fold(empty, |(mut histogram, mut count), atoms| {
                    self.tally(frame, &mut histogram, &mut count, atoms);
                    (histogram, count)
                })
                .reduce(empty, |mut a, b| {
                    a.0.merge(&b.0);
                    a.1 += b.1;
                    a
                });
            state.histogram.merge(&partial);
            state.count += count;
            return;
        }
        for atoms in matches {
            self.tally(frame, &mut state.histogram, &mut state.count, atoms);
        }
    }
}

impl AverageCommand for AngleDistribution {
    type State = AngleState;
    type Report = AngleReport;

    fn name(&self) -> &'static str {
        "angles"
    }

    fn configure(&self) -> Result<AngleState, EngineError> {
        let histogram = Histogram::new(self.config.points, 0.0, self.kind.upper())?;
        info!(
            selection = self.selection.string(),
            points = self.config.points,
            kind = ?self.kind,
            "Configured angle distribution."
        );
        Ok(AngleState {
            histogram,
            count: 0,
        })
    }

    fn accumulate(&self, frame: &Frame, state: &mut AngleState) -> Result<(), EngineError> {
        let matches = self.selection.evaluate(frame);
        let before = state.count;
        self.bin_matches(frame, &matches, state);
        debug!(
            step = frame.step(),
            matches = matches.len(),
            binned = state.count - before,
            "Binned angles."
        );
        Ok(())
    }

    #[instrument(skip_all, name = "angles_finalize")]
    fn finalize(&self, state: AngleState) -> Result<AngleReport, EngineError> {
        let AngleState {
            mut histogram,
            count,
        } = state;

        let max = histogram.data().iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            histogram.normalize(|_, value| value / max);
        } else {
            warn!("No angle matched the selection, the distribution is left at zero.");
        }

        info!(count, "Normalized angle distribution.");
        Ok(AngleReport {
            kind: self.kind,
            bin_width: histogram.bin_width(),
            values: histogram.into_vec(),
            count,
        })
    }
}

/// Angle histogram scaled to a maximum of 1, one value per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleReport {
    pub kind: AngleKind,
    /// In radians.
    pub bin_width: f64,
    pub values: Vec<f64>,
    /// Angles binned over the whole trajectory.
    pub count: u64,
}

impl AngleReport {
    /// `(lower edge of the bin in radians, value)` for every bin.
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
            format!("Angles distribution in trajectory {}", trajectory),
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

/// Computes the angle distribution of a trajectory file and writes it to
/// `output`.
///
/// # Errors
///
/// Same order as [`crate::workflows::rdf::run`]: configuration, then the
/// output path, then trajectory reads.
#[instrument(skip_all, name = "angles_workflow", fields(trajectory = %trajectory.path.display()))]
pub fn run(
    config: &AngleConfig,
    trajectory: &TrajectoryOptions,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<AngleReport, EngineError> {
    let angles = AngleDistribution::new(config.clone())?;
    output::check_writable(output)?;

    let mut source = super::open_trajectory(trajectory)?;
    let report = runner::run(&angles, &mut source, &trajectory.range, reporter)?;

    info!(output = %output.display(), "Writing angle distribution.");
    report.write_to_path(
        output,
        &trajectory.path.display().to_string(),
        angles.selection().string(),
    )?;
    reporter.report(Progress::Message(format!("Wrote {}", output.display())));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::InMemorySource;
    use crate::core::models::cell::UnitCell;
    use crate::engine::config::StepRange;
    use crate::engine::error::ErrorKind;
    use nalgebra::Point3;

    fn angles(selection: &str, points: usize) -> AngleDistribution {
        AngleDistribution::new(AngleConfig {
            selection: selection.to_string(),
            points,
        })
        .unwrap()
    }

    fn frame(cell: UnitCell, positions: &[[f64; 3]]) -> Frame {
        let mut frame = Frame::new(0, cell);
        for position in positions {
            frame.add_atom("C", Point3::from(*position));
        }
        frame
    }

    fn run_frames(angles: &AngleDistribution, frames: Vec<Frame>) -> AngleReport {
        runner::run(
            angles,
            &mut InMemorySource::new(frames),
            &StepRange::default(),
            &ProgressReporter::new(),
        )
        .unwrap()
    }

    fn nonzero_bins(report: &AngleReport) -> Vec<(usize, f64)> {
        report
            .values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0.0)
            .map(|(i, &value)| (i, value))
            .collect()
    }

    fn right_angle() -> Frame {
        frame(
            UnitCell::infinite(),
            &[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )
    }

    fn dihedral_frame() -> Frame {
        frame(
            UnitCell::infinite(),
            &[
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [0.0, -1.0, 1.0],
            ],
        )
    }

    #[test]
    fn arity_selects_the_kind_and_range() {
        let angle = angles("three: all", 10);
        assert_eq!(angle.kind(), AngleKind::Angle);
        assert_eq!(angle.configure().unwrap().histogram().bin_width(), PI / 10.0);

        let dihedral = angles("four: all", 10);
        assert_eq!(dihedral.kind(), AngleKind::Dihedral);
        assert_eq!(dihedral.configure().unwrap().histogram().bin_width(), TAU / 10.0);
    }

    #[test]
    fn selections_of_one_or_two_atoms_are_rejected() {
        for selection in ["name O", "pairs: all"] {
            let err = AngleDistribution::new(AngleConfig {
                selection: selection.to_string(),
                points: 10,
            })
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(matches!(
                err,
                EngineError::Config(ConfigError::UnsupportedArity { .. })
            ));
        }
    }

    #[test]
    fn zero_points_is_rejected() {
        let err = AngleDistribution::new(AngleConfig {
            points: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn right_angle_is_binned_at_half_pi() {
        let angles = angles("three: index(#1) 0 and index(#2) 1 and index(#3) 2", 45);
        let report = run_frames(&angles, vec![right_angle()]);

        assert_eq!(report.count, 1);
        // 90 degrees with 4 degree bins
        assert_eq!(nonzero_bins(&report), vec![(22, 1.0)]);
    }

    #[test]
    fn every_ordered_triplet_is_measured_and_scaled_by_the_largest_bin() {
        let angles = angles("three: all", 45);
        let report = run_frames(&angles, vec![right_angle()]);

        // Two orderings see the right angle, four see a 45 degree corner.
        assert_eq!(report.count, 6);
        assert_eq!(nonzero_bins(&report), vec![(11, 1.0), (22, 0.5)]);
    }

    #[test]
    fn dihedral_of_a_quarter_turn() {
        let selection = "four: index(#1) 0 and index(#2) 1 and index(#3) 2 and index(#4) 3";
        let report = run_frames(&angles(selection, 45), vec![dihedral_frame()]);
        assert_eq!(report.kind, AngleKind::Dihedral);
        assert_eq!(report.count, 1);
        // pi/2 with 8 degree bins
        assert_eq!(nonzero_bins(&report), vec![(11, 1.0)]);
    }

    #[test]
    fn negative_dihedral_is_shifted_by_a_full_turn() {
        let angles = angles(
            "four: index(#1) 0 and index(#2) 1 and index(#3) 2 and index(#4) 4",
            45,
        );
        let frame = dihedral_frame();
        let measured = angles.measure(&frame, &Match::new(&[0, 1, 2, 4])).unwrap();
        assert!((measured - 1.5 * PI).abs() < 1e-12);

        let report = run_frames(&angles, vec![frame]);
        assert_eq!(nonzero_bins(&report), vec![(33, 1.0)]);
    }

    #[test]
    fn straight_angle_lands_in_the_last_bin() {
        let angles = angles("three: index(#1) 0 and index(#2) 1 and index(#3) 2", 18);
        let line = frame(
            UnitCell::cubic(10.0).unwrap(),
            &[[9.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        );
        let report = run_frames(&angles, vec![line]);
        assert_eq!(nonzero_bins(&report), vec![(17, 1.0)]);
    }

    #[test]
    fn overlapping_atoms_are_skipped() {
        let angles = angles("three: index(#1) 0 and index(#2) 1 and index(#3) 2", 10);
        let overlap = frame(
            UnitCell::infinite(),
            &[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        );
        let mut state = angles.configure().unwrap();
        angles.accumulate(&overlap, &mut state).unwrap();
        assert_eq!(state.count(), 0);
    }

    #[test]
    fn no_match_leaves_finite_zeros() {
        let report = run_frames(&angles("three: name X", 20), vec![right_angle()]);
        assert_eq!(report.count, 0);
        assert!(report.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn binning_many_matches_matches_sequential_tally() {
        let angles = angles("three: all", 60);
        let positions: Vec<[f64; 3]> = (0..20)
            .map(|i| {
                let t = i as f64;
                [(t * 1.7) % 5.0, (t * 2.3) % 7.0, (t * 0.9) % 3.0]
            })
            .collect();
        let frame = frame(UnitCell::cubic(8.0).unwrap(), &positions);
        let matches = angles.selection().evaluate(&frame);
        assert_eq!(matches.len(), 20 * 19 * 18);

        let mut expected = angles.configure().unwrap();
        for atoms in &matches {
            angles.tally(&frame, &mut expected.histogram, &mut expected.count, atoms);
        }
        let mut state = angles.configure().unwrap();
        angles.bin_matches(&frame, &matches, &mut state);

        assert_eq!(state.count(), expected.count());
        assert_eq!(state.histogram(), expected.histogram());
    }

    #[test]
    fn run_writes_header_and_one_line_per_bin() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = dir.path().join("water.xyz");
        std::fs::write(&trajectory, "3\n\nH 1 0 0\nO 0 0 0\nH 0 1 0\n").unwrap();
        let output = dir.path().join("water.xyz.ang");

        let config = AngleConfig {
            selection: "three: name(#1) H and name(#2) O and name(#3) H".to_string(),
            points: 45,
        };
        let report = run(
            &config,
            &TrajectoryOptions::new(&trajectory),
            &output,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.count, 2);

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + 45);
        assert_eq!(
            lines[0],
            format!("# Angles distribution in trajectory {}", trajectory.display())
        );
        assert_eq!(
            lines[1],
            "# Selection: three: name(#1) H and name(#2) O and name(#3) H"
        );
        assert_eq!(lines[2], "0  0");
        assert!(lines[2 + 22].ends_with("  1"));
    }

    #[test]
    fn unwritable_output_fails_before_reading_the_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let options = TrajectoryOptions::new(dir.path().join("missing.xyz"));
        let err = run(
            &AngleConfig::default(),
            &options,
            &dir.path().join("no-such-dir").join("out.ang"),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
