use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

const RIGHT_ANGLE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum CellError {
    #[error("Unit cell lengths must be finite and non-negative, got {0:?}")]
    InvalidLength([f64; 3]),
    #[error("Unit cell angles must be strictly between 0 and 180 degrees, got {0:?}")]
    InvalidAngle([f64; 3]),
    #[error("Unit cell matrix is singular and can not describe a periodic box")]
    Singular,
    #[error("Invalid cell specification '{0}'. The cell string should have 1, 3 or 6 values.")]
    InvalidSpecification(String),
    #[error("Invalid number '{value}' in cell specification '{spec}'")]
    InvalidNumber { spec: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    /// No periodic boundaries, distances are never wrapped.
    Infinite,
    /// All angles are right angles.
    Orthorhombic,
    /// Arbitrary parallelepiped.
    Triclinic,
}

/// A periodic simulation box.
///
/// The box vectors are stored as the columns of `matrix`; the inverse matrix
/// is cached to convert between cartesian and fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    shape: CellShape,
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Default for UnitCell {
    fn default() -> Self {
        Self::infinite()
    }
}

impl UnitCell {
    pub fn infinite() -> Self {
        Self {
            shape: CellShape::Infinite,
            matrix: Matrix3::zeros(),
            inverse: Matrix3::zeros(),
        }
    }

    pub fn cubic(length: f64) -> Result<Self, CellError> {
        Self::orthorhombic(length, length, length)
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, CellError> {
        let lengths = [a, b, c];
        validate_lengths(lengths)?;
        if lengths.iter().all(|&l| l == 0.0) {
            return Ok(Self::infinite());
        }
        if lengths.iter().any(|&l| l == 0.0) {
            return Err(CellError::Singular);
        }

        let matrix = Matrix3::from_diagonal(&Vector3::new(a, b, c));
        let inverse = Matrix3::from_diagonal(&Vector3::new(1.0 / a, 1.0 / b, 1.0 / c));
        Ok(Self {
            shape: CellShape::Orthorhombic,
            matrix,
            inverse,
        })
    }

    /// Builds a cell from its lengths and angles, with angles in degrees.
    ///
    /// The first vector is aligned with the x axis and the second one lies in
    /// the xy plane. When all angles are right angles the resulting cell is
    /// orthorhombic.
    pub fn triclinic(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, CellError> {
        let angles = [alpha, beta, gamma];
        if angles
            .iter()
            .any(|&x| !x.is_finite() || x <= 0.0 || x >= 180.0)
        {
            return Err(CellError::InvalidAngle(angles));
        }
        if angles
            .iter()
            .all(|&x| (x - 90.0).abs() < RIGHT_ANGLE_TOLERANCE)
        {
            return Self::orthorhombic(a, b, c);
        }
        validate_lengths([a, b, c])?;

        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = 1.0 - cos_beta * cos_beta - cy * cy;
        if cz_squared <= 0.0 {
            return Err(CellError::InvalidAngle(angles));
        }

        let matrix = Matrix3::new(
            a,
            b * cos_gamma,
            c * cos_beta,
            0.0,
            b * sin_gamma,
            c * cy,
            0.0,
            0.0,
            c * cz_squared.sqrt(),
        );
        Self::from_matrix(matrix)
    }

    /// Builds a cell from a matrix holding the three box vectors as columns.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Result<Self, CellError> {
        if matrix.iter().any(|x| !x.is_finite()) {
            return Err(CellError::InvalidLength([f64::NAN; 3]));
        }
        if matrix.iter().all(|&x| x == 0.0) {
            return Ok(Self::infinite());
        }
        let inverse = matrix.try_inverse().ok_or(CellError::Singular)?;

        let is_diagonal = (0..3)
            .flat_map(|i| (0..3).map(move |j| (i, j)))
            .filter(|(i, j)| i != j)
            .all(|(i, j)| matrix[(i, j)].abs() < f64::EPSILON);
        let shape = if is_diagonal {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        Ok(Self {
            shape,
            matrix,
            inverse,
        })
    }

    pub fn shape(&self) -> CellShape {
        self.shape
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn lengths(&self) -> [f64; 3] {
        [
            self.matrix.column(0).norm(),
            self.matrix.column(1).norm(),
            self.matrix.column(2).norm(),
        ]
    }

    /// Angles between the box vectors, in degrees. Infinite cells report right angles.
    pub fn angles(&self) -> [f64; 3] {
        if self.shape == CellShape::Infinite {
            return [90.0; 3];
        }
        let a = self.matrix.column(0).into_owned();
        let b = self.matrix.column(1).into_owned();
        let c = self.matrix.column(2).into_owned();
        [
            b.angle(&c).to_degrees(),
            a.angle(&c).to_degrees(),
            a.angle(&b).to_degrees(),
        ]
    }

    /// Volume of the cell, zero for infinite cells.
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            _ => self.matrix.determinant().abs(),
        }
    }

    /// Applies the minimum image convention to a displacement vector.
    pub fn wrap(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        match self.shape {
            CellShape::Infinite => *vector,
            CellShape::Orthorhombic => {
                let mut wrapped = *vector;
                for axis in 0..3 {
                    let length = self.matrix[(axis, axis)];
                    wrapped[axis] -= (wrapped[axis] / length).round() * length;
                }
                wrapped
            }
            CellShape::Triclinic => {
                let mut fractional = self.inverse * vector;
                fractional.apply(|x| *x -= (*x).round());
                self.matrix * fractional
            }
        }
    }
}

fn validate_lengths(lengths: [f64; 3]) -> Result<(), CellError> {
    if lengths.iter().any(|&l| !l.is_finite() || l < 0.0) {
        return Err(CellError::InvalidLength(lengths));
    }
    Ok(())
}

/// Parses a cell given as `L`, `a:b:c` or `a:b:c:alpha:beta:gamma`.
pub fn parse_cell(spec: &str) -> Result<UnitCell, CellError> {
    let values = spec
        .split(':')
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|_| CellError::InvalidNumber {
                spec: spec.to_string(),
                value: field.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [l] => UnitCell::cubic(*l),
        [a, b, c] => UnitCell::orthorhombic(*a, *b, *c),
        [a, b, c, alpha, beta, gamma] => UnitCell::triclinic(*a, *b, *c, *alpha, *beta, *gamma),
        _ => Err(CellError::InvalidSpecification(spec.to_string())),
    }
}
