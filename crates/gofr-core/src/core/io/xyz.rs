use super::{ParseErrorKind, TrajectoryError};
use crate::core::models::cell::UnitCell;
use crate::core::models::frame::Frame;
use nalgebra::{Matrix3, Point3, Vector3};
use std::io::BufRead;

const LATTICE_KEY: &str = "Lattice=\"";

/// Streaming reader for (extended) XYZ trajectories.
///
/// Each frame is an atom count line, a comment line and one `NAME x y z`
/// line per atom. A `Lattice="ax ay az bx by bz cx cy cz"` entry in the
/// comment line defines the frame's unit cell; without it the cell is
/// infinite.
pub struct XyzReader<R> {
    reader: R,
    line: usize,
    step: usize,
}

impl<R: BufRead> XyzReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            step: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, TrajectoryError> {
        let mut buffer = String::new();
        if self.reader.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(buffer.trim_end().to_string()))
    }

    fn required_line(&mut self) -> Result<String, TrajectoryError> {
        self.next_line()?.ok_or(TrajectoryError::Parse {
            line: self.line + 1,
            kind: ParseErrorKind::Truncated,
        })
    }

    /// Reads the atom count of the next frame, skipping blank lines.
    /// Returns `None` at the end of the input.
    fn read_atom_count(&mut self) -> Result<Option<usize>, TrajectoryError> {
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return trimmed
                .parse::<usize>()
                .map(Some)
                .map_err(|_| TrajectoryError::Parse {
                    line: self.line,
                    kind: ParseErrorKind::InvalidAtomCount(trimmed.to_string()),
                });
        }
    }

    /// Reads the next frame, or `None` when the input is exhausted.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, TrajectoryError> {
        let Some(natoms) = self.read_atom_count()? else {
            return Ok(None);
        };

        let comment = self.required_line()?;
        let cell = parse_lattice(&comment).map_err(|kind| TrajectoryError::Parse {
            line: self.line,
            kind,
        })?;

        let mut frame = Frame::with_capacity(self.step, cell, natoms);
        for _ in 0..natoms {
            let line = self.required_line()?;
            let (name, position) = parse_atom_line(&line).map_err(|kind| TrajectoryError::Parse {
                line: self.line,
                kind,
            })?;
            frame.add_atom(name, position);
        }

        self.step += 1;
        Ok(Some(frame))
    }

    /// Counts the frames left in the input without parsing atom lines.
    pub fn count_frames(&mut self) -> Result<usize, TrajectoryError> {
        let mut count = 0;
        while let Some(natoms) = self.read_atom_count()? {
            for _ in 0..natoms + 1 {
                self.required_line()?;
            }
            count += 1;
        }
        Ok(count)
    }
}

fn parse_atom_line(line: &str) -> Result<(&str, Point3<f64>), ParseErrorKind> {
    let mut fields = line.split_whitespace();
    let name = fields.next().ok_or(ParseErrorKind::MissingField)?;

    let mut coordinates = [0.0; 3];
    for coordinate in coordinates.iter_mut() {
        let raw = fields.next().ok_or(ParseErrorKind::MissingField)?;
        *coordinate = raw
            .parse()
            .map_err(|_| ParseErrorKind::InvalidCoordinate(raw.to_string()))?;
    }
    Ok((name, Point3::from(coordinates)))
}

fn parse_lattice(comment: &str) -> Result<UnitCell, ParseErrorKind> {
    let Some(start) = comment.find(LATTICE_KEY) else {
        return Ok(UnitCell::infinite());
    };
    let rest = &comment[start + LATTICE_KEY.len()..];
    let end = rest
        .find('"')
        .ok_or_else(|| ParseErrorKind::InvalidLattice("missing closing quote".into()))?;

    let values = rest[..end]
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| ParseErrorKind::InvalidLattice(format!("'{}' is not a number", v)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != 9 {
        return Err(ParseErrorKind::InvalidLattice(format!(
            "expected 9 values, found {}",
            values.len()
        )));
    }

    let matrix = Matrix3::from_columns(&[
        Vector3::new(values[0], values[1], values[2]),
        Vector3::new(values[3], values[4], values[5]),
        Vector3::new(values[6], values[7], values[8]),
    ]);
    UnitCell::from_matrix(matrix).map_err(|e| ParseErrorKind::InvalidLattice(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::CellShape;
    use std::io::Cursor;

    const TWO_FRAMES: &str = "\
3
first frame
O 0.0 0.0 0.0
H 0.9572 0.0 0.0
H -0.24 0.927 0.0
2
Lattice=\"10 0 0 0 11 0 0 0 12\" Properties=species:S:1:pos:R:3
C 1.0 2.0 3.0
N 4.0 5.0 6.0

";

    #[test]
    fn reads_frames_in_order() {
        let mut reader = XyzReader::new(Cursor::new(TWO_FRAMES));

        let first = reader.read_frame().unwrap().unwrap();
        assert_eq!(first.step(), 0);
        assert_eq!(first.size(), 3);
        assert_eq!(first.names(), &["O", "H", "H"]);
        assert_eq!(first.cell().shape(), CellShape::Infinite);
        assert_eq!(first.positions()[1], Point3::new(0.9572, 0.0, 0.0));

        let second = reader.read_frame().unwrap().unwrap();
        assert_eq!(second.step(), 1);
        assert_eq!(second.size(), 2);
        assert_eq!(second.cell().shape(), CellShape::Orthorhombic);
        assert!((second.cell().volume() - 1320.0).abs() < 1e-9);

        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn counts_frames_without_parsing_atoms() {
        let mut reader = XyzReader::new(Cursor::new(TWO_FRAMES));
        assert_eq!(reader.count_frames().unwrap(), 2);
    }

    #[test]
    fn invalid_coordinate_reports_line_number() {
        let input = "2\n\nO 0 0 0\nH 1.0 zz 0\n";
        let err = XyzReader::new(Cursor::new(input)).read_frame().unwrap_err();
        match err {
            TrajectoryError::Parse { line, kind } => {
                assert_eq!(line, 4);
                assert_eq!(kind, ParseErrorKind::InvalidCoordinate("zz".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let input = "3\ncomment\nO 0 0 0\n";
        let err = XyzReader::new(Cursor::new(input)).read_frame().unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::Parse {
                kind: ParseErrorKind::Truncated,
                ..
            }
        ));
    }

    #[test]
    fn invalid_atom_count_is_an_error() {
        let err = XyzReader::new(Cursor::new("three\n"))
            .read_frame()
            .unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::Parse {
                line: 1,
                kind: ParseErrorKind::InvalidAtomCount(_)
            }
        ));
    }

    #[test]
    fn lattice_with_wrong_value_count_is_rejected() {
        assert!(matches!(
            parse_lattice("Lattice=\"10 0 0 0 10 0\""),
            Err(ParseErrorKind::InvalidLattice(_))
        ));
    }

    #[test]
    fn skewed_lattice_gives_triclinic_cell() {
        let cell = parse_lattice("Lattice=\"10 0 0 5 8.660254 0 0 0 10\"").unwrap();
        assert_eq!(cell.shape(), CellShape::Triclinic);
    }
}
