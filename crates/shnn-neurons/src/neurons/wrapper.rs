//! Spiking wrappers over rate models
//!
//! A wrapper owns a non-spiking base model. Its state is the base's state
//! merged with its own, under the same collision rule the namespace applies,
//! and each step runs the base first to get rates, then turns those rates
//! into spikes.

use super::{check_positive, NeuronType, StepState};
use crate::{config::Dtype, dist::standard_normal, error::*, state::NeuronState};
use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use rand::{Rng, RngCore};
use std::sync::Arc;

fn spiking_base(wrapper: &str, base: Arc<dyn NeuronType>) -> Result<Arc<dyn NeuronType>> {
    if base.spiking() {
        return Err(NeuronError::invalid_config(format!(
            "{} base type `{}` must be a rate model, not a spiking one",
            wrapper,
            base.name()
        )));
    }
    Ok(base)
}

/// Run the base model into a scratch rate buffer
fn base_rates(
    base: &dyn NeuronType,
    dt: f64,
    input: ArrayView1<'_, f64>,
    state: &mut StepState<'_>,
    rng: &mut dyn RngCore,
) -> Result<Array1<f64>> {
    let mut rates = Array1::zeros(input.len());
    base.step(dt, input, rates.view_mut(), state, rng)?;
    Ok(rates)
}

/// Spike count drawn from Poisson(`lambda`)
///
/// Exact below `POISSON_EXACT_LIMIT`, normal approximation above it.
fn poisson(lambda: f64, rng: &mut dyn RngCore) -> Result<f64> {
    // Knuth's method loses precision for large lambda; split into chunks
    const CHUNK: f64 = 30.0;
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(NeuronError::invalid_parameter(
            "lambda",
            lambda.to_string(),
            "finite and >= 0.0",
        ));
    }
    if lambda > POISSON_EXACT_LIMIT {
        let count = (lambda + lambda.sqrt() * standard_normal(rng)).round();
        return Ok(count.max(0.0));
    }

    let chunks = (lambda / CHUNK).ceil() as u64;
    let mut count = 0u64;
    for k in 0..chunks {
        let step = (lambda - k as f64 * CHUNK).min(CHUNK);
        let limit = (-step).exp();
        let mut p = rng.gen::<f64>();
        while p > limit {
            count += 1;
            p *= rng.gen::<f64>();
        }
    }
    Ok(count as f64)
}

/// Largest expected count sampled exactly by `poisson`
const POISSON_EXACT_LIMIT: f64 = 1.0e4;

/// Spikes at regular intervals whose frequency follows the base rate
#[derive(Debug, Clone)]
pub struct RegularSpiking {
    base: Arc<dyn NeuronType>,
    /// Output scale, applied on top of the base model's
    pub amplitude: f64,
}

impl RegularSpiking {
    /// Wrap a rate model
    pub fn new(base: impl NeuronType + 'static) -> Result<Self> {
        Self::from_arc(Arc::new(base))
    }

    /// Wrap a shared rate model
    pub fn from_arc(base: Arc<dyn NeuronType>) -> Result<Self> {
        Ok(Self {
            base: spiking_base("RegularSpiking", base)?,
            amplitude: 1.0,
        })
    }

    /// Set the output scale
    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        check_positive("amplitude", amplitude)?;
        self.amplitude = amplitude;
        Ok(self)
    }

    /// The wrapped rate model
    pub fn base(&self) -> &dyn NeuronType {
        self.base.as_ref()
    }
}

impl NeuronType for RegularSpiking {
    fn name(&self) -> &'static str {
        "RegularSpiking"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        dt: f64,
        dtype: Dtype,
    ) -> Result<NeuronState> {
        let base = self.base.make_neuron_state(phases, dt, dtype)?;
        let own = NeuronState::new().with("voltage", phases.to_owned())?;
        base.merge(own)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let rates = base_rates(self.base.as_ref(), dt, input, state, rng)?;
        let mut voltage = state.take("voltage")?;
        let scale = self.amplitude / dt;
        Zip::from(&mut output)
            .and(&rates)
            .and(&mut voltage)
            .for_each(|out, &rate, v| {
                *v += rate * dt;
                let n_spikes = v.floor();
                *out = scale * n_spikes;
                *v -= n_spikes;
            });
        Ok(())
    }
}

/// Spike counts drawn from a Poisson process with the base rate
#[derive(Debug, Clone)]
pub struct PoissonSpiking {
    base: Arc<dyn NeuronType>,
    /// Output scale, applied on top of the base model's
    pub amplitude: f64,
}

impl PoissonSpiking {
    /// Wrap a rate model
    pub fn new(base: impl NeuronType + 'static) -> Result<Self> {
        Self::from_arc(Arc::new(base))
    }

    /// Wrap a shared rate model
    pub fn from_arc(base: Arc<dyn NeuronType>) -> Result<Self> {
        Ok(Self {
            base: spiking_base("PoissonSpiking", base)?,
            amplitude: 1.0,
        })
    }

    /// Set the output scale
    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        check_positive("amplitude", amplitude)?;
        self.amplitude = amplitude;
        Ok(self)
    }

    /// The wrapped rate model
    pub fn base(&self) -> &dyn NeuronType {
        self.base.as_ref()
    }
}

impl NeuronType for PoissonSpiking {
    fn name(&self) -> &'static str {
        "PoissonSpiking"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        dt: f64,
        dtype: Dtype,
    ) -> Result<NeuronState> {
        self.base.make_neuron_state(phases, dt, dtype)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let rates = base_rates(self.base.as_ref(), dt, input, state, rng)?;
        let scale = self.amplitude / dt;
        for (out, &rate) in output.iter_mut().zip(rates.iter()) {
            *out = scale * rate.signum() * poisson(rate.abs() * dt, rng)?;
        }
        Ok(())
    }
}

/// Spikes whenever the integer part of `rate * dt` is reached, plus one
/// more with probability equal to the fractional part
#[derive(Debug, Clone)]
pub struct StochasticSpiking {
    base: Arc<dyn NeuronType>,
    /// Output scale, applied on top of the base model's
    pub amplitude: f64,
}

impl StochasticSpiking {
    /// Wrap a rate model
    pub fn new(base: impl NeuronType + 'static) -> Result<Self> {
        Self::from_arc(Arc::new(base))
    }

    /// Wrap a shared rate model
    pub fn from_arc(base: Arc<dyn NeuronType>) -> Result<Self> {
        Ok(Self {
            base: spiking_base("StochasticSpiking", base)?,
            amplitude: 1.0,
        })
    }

    /// Set the output scale
    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        check_positive("amplitude", amplitude)?;
        self.amplitude = amplitude;
        Ok(self)
    }

    /// The wrapped rate model
    pub fn base(&self) -> &dyn NeuronType {
        self.base.as_ref()
    }
}

impl NeuronType for StochasticSpiking {
    fn name(&self) -> &'static str {
        "StochasticSpiking"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        dt: f64,
        dtype: Dtype,
    ) -> Result<NeuronState> {
        self.base.make_neuron_state(phases, dt, dtype)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let rates = base_rates(self.base.as_ref(), dt, input, state, rng)?;
        let scale = self.amplitude / dt;
        for (out, &rate) in output.iter_mut().zip(rates.iter()) {
            let expected = rate.abs() * dt;
            let whole = expected.trunc();
            let extra = if rng.gen::<f64>() < expected - whole { 1.0 } else { 0.0 };
            *out = scale * rate.signum() * (whole + extra);
        }
        Ok(())
    }
}
