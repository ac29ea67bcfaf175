//! Two-sided logarithm for signed statistics
//!
//! Positive values map to `log_b(v)`, negative values to `-log_b(|v|)` and
//! zero stays zero, so the sign of a t-score survives the transform.

use crate::error::StyleError;

/// Sign-preserving logarithm with a fixed base.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogScale {
    base: f64,
    ln_base: f64,
}

impl LogScale {
    /// Create a scale with the given base.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidLogBase`] if `base` is not a finite
    /// positive number other than 1.
    pub fn new(base: f64) -> Result<Self, StyleError> {
        if !base.is_finite() || base <= 0.0 || (base - 1.0).abs() < f64::EPSILON {
            return Err(StyleError::InvalidLogBase(base));
        }
        Ok(Self {
            base,
            ln_base: base.ln(),
        })
    }

    /// Base-10 scale
    #[must_use]
    pub fn base10() -> Self {
        Self {
            base: 10.0,
            ln_base: std::f64::consts::LN_10,
        }
    }

    /// The logarithm base
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Apply the transform to a single value
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        if value > 0.0 {
            value.ln() / self.ln_base
        } else if value < 0.0 {
            -(value.abs().ln() / self.ln_base)
        } else {
            0.0
        }
    }

    /// Apply the transform element-wise
    #[must_use]
    pub fn apply_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.apply(v)).collect()
    }
}

impl Default for LogScale {
    fn default() -> Self {
        Self::base10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sided_log_signs() {
        let scale = LogScale::base10();
        assert!((scale.apply(100.0) - 2.0).abs() < 1e-12);
        assert!((scale.apply(-1000.0) + 3.0).abs() < 1e-12);
        assert_eq!(scale.apply(0.0), 0.0);
    }

    #[test]
    fn test_small_magnitudes_flip_sign() {
        // |v| < 1 has a negative log, so -0.1 lands at +1.
        let scale = LogScale::base10();
        assert!((scale.apply(0.1) + 1.0).abs() < 1e-12);
        assert!((scale.apply(-0.1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_custom_base() {
        let scale = LogScale::new(2.0).unwrap();
        assert!((scale.apply(8.0) - 3.0).abs() < 1e-12);
        assert_eq!(scale.apply_all(&[4.0, -4.0]), vec![2.0, -2.0]);
    }

    #[test]
    fn test_invalid_bases_rejected() {
        assert!(LogScale::new(0.0).is_err());
        assert!(LogScale::new(-2.0).is_err());
        assert!(LogScale::new(1.0).is_err());
        assert!(LogScale::new(f64::NAN).is_err());
    }
}
