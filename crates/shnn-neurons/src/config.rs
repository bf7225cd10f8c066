//! Build configuration

use crate::error::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Numeric precision that allocated state arrays are rounded to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dtype {
    /// Single precision
    F32,
    /// Double precision
    #[default]
    F64,
}

impl Dtype {
    /// Round a value to this precision
    #[inline]
    pub fn round(self, value: f64) -> f64 {
        match self {
            Dtype::F32 => value as f32 as f64,
            Dtype::F64 => value,
        }
    }
}

/// Parameters shared by every population built in one pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildConfig {
    /// Simulation step size (s)
    pub dt: f64,
    /// Target precision for state arrays
    pub dtype: Dtype,
    /// Seed for initial-state sampling and stochastic operators
    pub seed: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dt: 0.001, // 1ms step
            dtype: Dtype::F64,
            seed: None,
        }
    }
}

impl BuildConfig {
    /// Create a configuration with the given step size
    pub fn new(dt: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(NeuronError::invalid_parameter("dt", dt.to_string(), "> 0.0"));
        }

        Ok(Self {
            dt,
            ..Default::default()
        })
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the target precision
    pub fn with_dtype(mut self, dtype: Dtype) -> Self {
        self.dtype = dtype;
        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.dt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_default() {
        let config = BuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dtype, Dtype::F64);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_build_config_validation() {
        assert!(BuildConfig::new(0.0).is_err());
        assert!(BuildConfig::new(-0.001).is_err());
        assert!(BuildConfig::new(f64::NAN).is_err());

        let config = BuildConfig::new(0.0005).unwrap().with_seed(7);
        assert_eq!(config.dt, 0.0005);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_dtype_round() {
        let x = 0.1_f64;
        assert_eq!(Dtype::F64.round(x), x);
        assert_eq!(Dtype::F32.round(x), 0.1_f32 as f64);
        assert_ne!(Dtype::F32.round(x), x);
    }
}
