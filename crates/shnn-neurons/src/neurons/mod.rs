//! Neuron model capability and the built-in model catalogue
//!
//! A model does two things: at build time it describes the per-neuron state
//! arrays it needs ([`NeuronType::make_neuron_state`]), and at run time it
//! advances those arrays by one step ([`NeuronType::step`]). The operator
//! owns the arrays; the model only sees views of them.

use crate::{config::Dtype, error::*, state::NeuronState};
use ndarray::{ArrayView1, ArrayViewMut1};
use rand::RngCore;
use std::fmt;

pub mod rate;
pub mod spiking;
pub mod wrapper;

pub use rate::{AdaptiveLIFRate, LIFRate, RectifiedLinear, Sigmoid, Tanh};
pub use spiking::{AdaptiveLIF, Izhikevich, SpikingRectifiedLinear, LIF};
pub use wrapper::{PoissonSpiking, RegularSpiking, StochasticSpiking};

/// Contract every neuron model implements
pub trait NeuronType: fmt::Debug + Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &'static str;

    /// Whether `step` writes spikes (`amplitude / dt` per spike) rather than rates
    fn spiking(&self) -> bool {
        false
    }

    /// Describe the state arrays this model needs
    ///
    /// `phases` is the population's resolved initial phase, one entry per
    /// neuron. The default is stateless.
    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        dt: f64,
        dtype: Dtype,
    ) -> Result<NeuronState> {
        let _ = (phases, dt, dtype);
        Ok(NeuronState::new())
    }

    /// Advance the model by `dt`
    ///
    /// Reads the per-neuron drive from `input`, updates the states it takes
    /// from `state` in place and writes the per-neuron output.
    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<()>;
}

/// Mutable views of an operator's states for one step
///
/// Each view can be taken once, so a wrapper and its base borrow disjoint
/// states without aliasing.
#[derive(Debug, Default)]
pub struct StepState<'a> {
    views: Vec<(&'a str, ArrayViewMut1<'a, f64>)>,
}

impl<'a> StepState<'a> {
    /// Collect named views
    pub fn new(views: impl IntoIterator<Item = (&'a str, ArrayViewMut1<'a, f64>)>) -> Self {
        Self {
            views: views.into_iter().collect(),
        }
    }

    /// Move the view for `name` out
    pub fn take(&mut self, name: &str) -> Result<ArrayViewMut1<'a, f64>> {
        let idx = self
            .views
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or_else(|| NeuronError::missing_state(name))?;
        Ok(self.views.swap_remove(idx).1)
    }

    /// Names of views not yet taken
    pub fn remaining(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.views.iter().map(|(n, _)| *n)
    }
}

pub(crate) fn check_positive(parameter: &str, value: f64) -> Result<()> {
    if !(value > 0.0) {
        return Err(NeuronError::invalid_parameter(parameter, value.to_string(), "> 0.0"));
    }
    Ok(())
}

pub(crate) fn check_non_negative(parameter: &str, value: f64) -> Result<()> {
    if !(value >= 0.0) {
        return Err(NeuronError::invalid_parameter(parameter, value.to_string(), ">= 0.0"));
    }
    Ok(())
}
