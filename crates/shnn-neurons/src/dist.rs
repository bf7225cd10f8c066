//! Distributions used to draw initial state values
//!
//! A distribution turns a count into a 1-D array of samples, consuming
//! randomness from a caller-supplied generator so seeded builds reproduce.

use crate::error::*;
use ndarray::Array1;
use rand::{Rng, RngCore};
use std::fmt;

/// Source of random per-neuron values
pub trait Distribution: fmt::Debug + Send + Sync {
    /// Draw `n` samples
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Array1<f64>;
}

/// One standard normal draw (Box-Muller)
pub(crate) fn standard_normal(rng: &mut dyn RngCore) -> f64 {
    // u1 in (0, 1] keeps ln finite
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Uniform distribution over `[low, high)`
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    low: f64,
    high: f64,
    integer: bool,
}

impl Uniform {
    /// Create a new uniform distribution
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() {
            return Err(NeuronError::invalid_parameter("low", low.to_string(), "finite"));
        }
        if !high.is_finite() {
            return Err(NeuronError::invalid_parameter("high", high.to_string(), "finite"));
        }
        if !(low < high) {
            return Err(NeuronError::invalid_parameter(
                "high",
                format!("{} (with low={})", high, low),
                "> low",
            ));
        }
        Ok(Self {
            low,
            high,
            integer: false,
        })
    }

    /// Uniform over `[0, 1)`
    pub fn unit() -> Self {
        Self {
            low: 0.0,
            high: 1.0,
            integer: false,
        }
    }

    /// Draw integers instead of reals
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Lower bound (inclusive)
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound (exclusive)
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Whether samples are rounded down to integers
    pub fn is_integer(&self) -> bool {
        self.integer
    }
}

impl Distribution for Uniform {
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Array1<f64> {
        Array1::from_shape_fn(n, |_| {
            let x = self.low + (self.high - self.low) * rng.gen::<f64>();
            if self.integer {
                x.floor()
            } else {
                x
            }
        })
    }
}

/// Normal distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mean: f64,
    std: f64,
}

impl Gaussian {
    /// Create a new gaussian distribution
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(NeuronError::invalid_parameter("mean", mean.to_string(), "finite"));
        }
        if !(std >= 0.0) || !std.is_finite() {
            return Err(NeuronError::invalid_parameter("std", std.to_string(), ">= 0.0"));
        }
        Ok(Self { mean, std })
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation
    pub fn std(&self) -> f64 {
        self.std
    }
}

impl Distribution for Gaussian {
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Array1<f64> {
        Array1::from_shape_fn(n, |_| self.mean + self.std * standard_normal(rng))
    }
}

/// Discrete choice among fixed options
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    options: Vec<f64>,
    cumulative: Vec<f64>,
}

impl Choice {
    /// Choose uniformly among `options`
    pub fn new(options: Vec<f64>) -> Result<Self> {
        let weights = vec![1.0; options.len()];
        Self::weighted(options, weights)
    }

    /// Choose among `options` with the given relative weights
    pub fn weighted(options: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if options.is_empty() {
            return Err(NeuronError::invalid_parameter("options", "[]", "non-empty"));
        }
        if weights.len() != options.len() {
            return Err(NeuronError::invalid_parameter(
                "weights",
                format!("{} weights for {} options", weights.len(), options.len()),
                "one weight per option",
            ));
        }
        if let Some(w) = weights.iter().find(|w| !(**w >= 0.0)) {
            return Err(NeuronError::invalid_parameter("weights", w.to_string(), ">= 0.0"));
        }

        let mut total = 0.0;
        let cumulative: Vec<f64> = weights
            .iter()
            .map(|w| {
                total += w;
                total
            })
            .collect();
        if total <= 0.0 {
            return Err(NeuronError::invalid_parameter(
                "weights",
                total.to_string(),
                "positive sum",
            ));
        }

        Ok(Self {
            options,
            cumulative,
        })
    }

    /// The options this distribution draws from
    pub fn options(&self) -> &[f64] {
        &self.options
    }
}

impl Distribution for Choice {
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Array1<f64> {
        let total = self.cumulative[self.cumulative.len() - 1];
        Array1::from_shape_fn(n, |_| {
            let u = rng.gen::<f64>() * total;
            let idx = self
                .cumulative
                .iter()
                .position(|c| u < *c)
                .unwrap_or(self.options.len() - 1);
            self.options[idx]
        })
    }
}
