//! Non-spiking (rate) neuron models

use super::{check_non_negative, check_positive, NeuronType, StepState};
use crate::{config::Dtype, error::*, state::NeuronState};
use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use rand::RngCore;

/// Rectified linear rate: `amplitude * max(J, 0)`
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedLinear {
    /// Output scale
    pub amplitude: f64,
}

impl Default for RectifiedLinear {
    fn default() -> Self {
        Self { amplitude: 1.0 }
    }
}

impl RectifiedLinear {
    /// Create a new rectified linear model
    pub fn new(amplitude: f64) -> Result<Self> {
        check_positive("amplitude", amplitude)?;
        Ok(Self { amplitude })
    }
}

impl NeuronType for RectifiedLinear {
    fn name(&self) -> &'static str {
        "RectifiedLinear"
    }

    fn step(
        &self,
        _dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        _state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        Zip::from(&mut output)
            .and(&input)
            .for_each(|out, &j| *out = self.amplitude * j.max(0.0));
        Ok(())
    }
}

/// Logistic rate saturating at `1 / tau_ref`
#[derive(Debug, Clone, PartialEq)]
pub struct Sigmoid {
    /// Refractory period (s); sets the maximum rate
    pub tau_ref: f64,
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self { tau_ref: 0.0025 }
    }
}

impl Sigmoid {
    /// Create a new sigmoid model
    pub fn new(tau_ref: f64) -> Result<Self> {
        check_positive("tau_ref", tau_ref)?;
        Ok(Self { tau_ref })
    }
}

impl NeuronType for Sigmoid {
    fn name(&self) -> &'static str {
        "Sigmoid"
    }

    fn step(
        &self,
        _dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        _state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let max_rate = 1.0 / self.tau_ref;
        Zip::from(&mut output)
            .and(&input)
            .for_each(|out, &j| *out = max_rate / (1.0 + (-j).exp()));
        Ok(())
    }
}

/// Hyperbolic tangent rate in `(-1/tau_ref, 1/tau_ref)`
#[derive(Debug, Clone, PartialEq)]
pub struct Tanh {
    /// Refractory period (s); sets the maximum rate
    pub tau_ref: f64,
}

impl Default for Tanh {
    fn default() -> Self {
        Self { tau_ref: 0.0025 }
    }
}

impl Tanh {
    /// Create a new tanh model
    pub fn new(tau_ref: f64) -> Result<Self> {
        check_positive("tau_ref", tau_ref)?;
        Ok(Self { tau_ref })
    }
}

impl NeuronType for Tanh {
    fn name(&self) -> &'static str {
        "Tanh"
    }

    fn step(
        &self,
        _dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        _state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let max_rate = 1.0 / self.tau_ref;
        Zip::from(&mut output)
            .and(&input)
            .for_each(|out, &j| *out = max_rate * j.tanh());
        Ok(())
    }
}

/// Steady-state firing rate of a leaky integrate-and-fire neuron
#[derive(Debug, Clone, PartialEq)]
pub struct LIFRate {
    /// Membrane RC time constant (s)
    pub tau_rc: f64,
    /// Absolute refractory period (s)
    pub tau_ref: f64,
    /// Output scale
    pub amplitude: f64,
}

impl Default for LIFRate {
    fn default() -> Self {
        Self {
            tau_rc: 0.02,   // 20ms membrane time constant
            tau_ref: 0.002, // 2ms refractory period
            amplitude: 1.0,
        }
    }
}

impl LIFRate {
    /// Create new LIF rate parameters with validation
    pub fn new(tau_rc: f64, tau_ref: f64, amplitude: f64) -> Result<Self> {
        check_positive("tau_rc", tau_rc)?;
        check_non_negative("tau_ref", tau_ref)?;
        check_positive("amplitude", amplitude)?;
        Ok(Self {
            tau_rc,
            tau_ref,
            amplitude,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.tau_rc, self.tau_ref, self.amplitude)?;
        Ok(())
    }

    /// Rate for a single input current; zero at or below threshold (`J <= 1`)
    #[inline]
    pub fn rate(&self, j: f64) -> f64 {
        let j = j - 1.0;
        if j > 0.0 {
            self.amplitude / (self.tau_ref + self.tau_rc * (1.0 / j).ln_1p())
        } else {
            0.0
        }
    }
}

impl NeuronType for LIFRate {
    fn name(&self) -> &'static str {
        "LIFRate"
    }

    fn step(
        &self,
        _dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        _state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        Zip::from(&mut output)
            .and(&input)
            .for_each(|out, &j| *out = self.rate(j));
        Ok(())
    }
}

/// LIF rate model with a slow adaptation current subtracted from the input
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveLIFRate {
    /// Underlying rate parameters
    pub lif: LIFRate,
    /// Adaptation time constant (s)
    pub tau_n: f64,
    /// Adaptation increment per unit of output
    pub inc_n: f64,
}

impl Default for AdaptiveLIFRate {
    fn default() -> Self {
        Self {
            lif: LIFRate::default(),
            tau_n: 1.0,
            inc_n: 0.01,
        }
    }
}

impl AdaptiveLIFRate {
    /// Create new adaptive LIF rate parameters with validation
    pub fn new(lif: LIFRate, tau_n: f64, inc_n: f64) -> Result<Self> {
        lif.validate()?;
        check_positive("tau_n", tau_n)?;
        check_non_negative("inc_n", inc_n)?;
        Ok(Self { lif, tau_n, inc_n })
    }
}

impl NeuronType for AdaptiveLIFRate {
    fn name(&self) -> &'static str {
        "AdaptiveLIFRate"
    }

    fn make_neuron_state(
        &self,
        _phases: ArrayView1<'_, f64>,
        _dt: f64,
        _dtype: Dtype,
    ) -> Result<NeuronState> {
        NeuronState::new().with("adaptation", 0.0)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut adaptation = state.take("adaptation")?;
        let k = dt / self.tau_n;
        Zip::from(&mut output)
            .and(&input)
            .and(&mut adaptation)
            .for_each(|out, &j, n| {
                *out = self.lif.rate(j - *n);
                *n += k * (self.inc_n * *out - *n);
            });
        Ok(())
    }
}
