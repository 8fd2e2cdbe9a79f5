use super::config::ConfigError;
use std::ops::Index;

/// Fixed-width histogram over `[lower, upper)`.
///
/// Bins hold raw counts until [`Histogram::normalize`] replaces them. Callers
/// filter values outside `[lower, upper)` before calling
/// [`Histogram::insert_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: Vec<f64>,
    lower: f64,
    width: f64,
}

impl Histogram {
    pub fn new(nbins: usize, lower: f64, upper: f64) -> Result<Self, ConfigError> {
        if nbins == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "points",
                reason: "the histogram needs at least one bin".into(),
            });
        }
        let width = (upper - lower) / nbins as f64;
        if !width.is_finite() || width <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_distance",
                reason: format!("empty histogram range [{}, {})", lower, upper),
            });
        }
        Ok(Self {
            bins: vec![0.0; nbins],
            lower,
            width,
        })
    }

    /// Counts one occurrence of `value` in the bin `floor((value - lower) / width)`.
    ///
    /// `width` is rounded, so a value just below `upper` can compute an index
    /// one past the end; it lands in the last bin.
    #[inline]
    pub fn insert_at(&mut self, value: f64) {
        let bin = ((value - self.lower) / self.width).floor() as usize;
        let bin = bin.min(self.bins.len() - 1);
        self.bins[bin] += 1.0;
    }

    /// A histogram with the same bins, all at zero.
    pub fn empty_like(&self) -> Self {
        Self {
            bins: vec![0.0; self.bins.len()],
            lower: self.lower,
            width: self.width,
        }
    }

    pub fn bin_width(&self) -> f64 {
        self.width
    }

    pub fn size(&self) -> usize {
        self.bins.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.bins
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Replaces every bin with `f(index, value)`.
    ///
    /// Calling this more than once transforms the already transformed values.
    pub fn normalize(&mut self, mut f: impl FnMut(usize, f64) -> f64) {
        for (i, value) in self.bins.iter_mut().enumerate() {
            *value = f(i, *value);
        }
    }

    /// Adds the bins of `other`, which must share this histogram's geometry.
    pub fn merge(&mut self, other: &Histogram) {
        debug_assert_eq!(self.bins.len(), other.bins.len());
        debug_assert_eq!(self.width, other.width);
        for (value, extra) in self.bins.iter_mut().zip(&other.bins) {
            *value += extra;
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.bins
    }
}

impl Index<usize> for Histogram {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.bins[index]
    }
}
