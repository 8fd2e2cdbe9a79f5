use super::cell::UnitCell;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Topology has {expected} atoms but the frame has {found}")]
pub struct AtomCountMismatch {
    pub expected: usize,
    pub found: usize,
}

/// A single trajectory step: atom names, positions and the simulation box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    step: usize,
    names: Vec<String>,
    positions: Vec<Point3<f64>>,
    cell: UnitCell,
}

impl Frame {
    pub fn new(step: usize, cell: UnitCell) -> Self {
        Self {
            step,
            cell,
            ..Default::default()
        }
    }

    pub fn with_capacity(step: usize, cell: UnitCell, capacity: usize) -> Self {
        Self {
            step,
            names: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            cell,
        }
    }

    pub fn add_atom(&mut self, name: impl Into<String>, position: Point3<f64>) {
        self.names.push(name.into());
        self.positions.push(position);
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of atoms in the frame.
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    pub fn set_cell(&mut self, cell: UnitCell) {
        self.cell = cell;
    }

    /// Replaces every atom name, keeping positions untouched.
    pub fn set_names(&mut self, names: Vec<String>) -> Result<(), AtomCountMismatch> {
        if names.len() != self.positions.len() {
            return Err(AtomCountMismatch {
                expected: names.len(),
                found: self.positions.len(),
            });
        }
        self.names = names;
        Ok(())
    }

    /// Distance between two atoms under the minimum image convention.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.displacement(i, j).norm()
    }

    /// Angle `i-j-k` in radians, in `[0, π]`. `NaN` when two of the atoms
    /// overlap.
    pub fn angle(&self, i: usize, j: usize, k: usize) -> f64 {
        let r21 = self.displacement(j, i);
        let r23 = self.displacement(j, k);
        let cos = r21.dot(&r23) / (r21.norm() * r23.norm());
        cos.clamp(-1.0, 1.0).acos()
    }

    /// Dihedral angle `i-j-k-m` in radians, in `[-π, π]`.
    pub fn dihedral(&self, i: usize, j: usize, k: usize, m: usize) -> f64 {
        let r12 = self.displacement(i, j);
        let r23 = self.displacement(j, k);
        let r34 = self.displacement(k, m);
        let a = r12.cross(&r23);
        let b = r23.cross(&r34);
        f64::atan2(r23.norm() * b.dot(&r12), a.dot(&b))
    }

    fn displacement(&self, from: usize, to: usize) -> Vector3<f64> {
        self.cell.wrap(&(self.positions[to] - self.positions[from]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn two_atom_frame(cell: UnitCell) -> Frame {
        let mut frame = Frame::new(0, cell);
        frame.add_atom("O", Point3::new(0.5, 0.0, 0.0));
        frame.add_atom("H", Point3::new(9.5, 0.0, 0.0));
        frame
    }

    #[test]
    fn distance_uses_the_frame_cell() {
        let open = two_atom_frame(UnitCell::infinite());
        assert!((open.distance(0, 1) - 9.0).abs() < 1e-12);

        let periodic = two_atom_frame(UnitCell::cubic(10.0).unwrap());
        assert!((periodic.distance(0, 1) - 1.0).abs() < 1e-12);
        assert!((periodic.distance(1, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn right_angle_is_half_pi() {
        let mut frame = Frame::new(0, UnitCell::infinite());
        frame.add_atom("H", Point3::new(1.0, 0.0, 0.0));
        frame.add_atom("O", Point3::new(0.0, 0.0, 0.0));
        frame.add_atom("H", Point3::new(0.0, 2.0, 0.0));
        assert!((frame.angle(0, 1, 2) - FRAC_PI_2).abs() < 1e-12);
        assert!((frame.angle(2, 1, 0) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn angle_uses_minimum_image() {
        let mut frame = Frame::new(0, UnitCell::cubic(10.0).unwrap());
        frame.add_atom("A", Point3::new(9.0, 0.0, 0.0));
        frame.add_atom("B", Point3::new(0.0, 0.0, 0.0));
        frame.add_atom("C", Point3::new(1.0, 0.0, 0.0));
        assert!((frame.angle(0, 1, 2) - PI).abs() < 1e-12);
    }

    #[test]
    fn dihedral_sign_follows_handedness() {
        let mut frame = Frame::new(0, UnitCell::infinite());
        frame.add_atom("A", Point3::new(1.0, 0.0, 0.0));
        frame.add_atom("B", Point3::new(0.0, 0.0, 0.0));
        frame.add_atom("C", Point3::new(0.0, 0.0, 1.0));
        frame.add_atom("D", Point3::new(0.0, 1.0, 1.0));
        frame.add_atom("D", Point3::new(0.0, -1.0, 1.0));
        frame.add_atom("D", Point3::new(-1.0, 0.0, 1.0));

        assert!((frame.dihedral(0, 1, 2, 3) - FRAC_PI_2).abs() < 1e-12);
        assert!((frame.dihedral(0, 1, 2, 4) + FRAC_PI_2).abs() < 1e-12);
        assert!((frame.dihedral(0, 1, 2, 5).abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn set_names_requires_matching_atom_count() {
        let mut frame = two_atom_frame(UnitCell::infinite());
        let err = frame.set_names(vec!["C".to_string()]).unwrap_err();
        assert_eq!(
            err,
            AtomCountMismatch {
                expected: 1,
                found: 2
            }
        );

        frame
            .set_names(vec!["C".to_string(), "N".to_string()])
            .unwrap();
        assert_eq!(frame.name(1), Some("N"));
    }
}
