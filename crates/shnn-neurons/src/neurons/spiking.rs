//! Spiking neuron models
//!
//! Spiking models write `amplitude / dt` for every spike emitted in a step,
//! so the output integrates to the same value as the matching rate model.

use super::{check_non_negative, check_positive, NeuronType, StepState};
use crate::{config::Dtype, error::*, state::NeuronState};
use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use rand::RngCore;

/// Integrate-and-fire counterpart of [`RectifiedLinear`](super::RectifiedLinear)
#[derive(Debug, Clone, PartialEq)]
pub struct SpikingRectifiedLinear {
    /// Output scale
    pub amplitude: f64,
}

impl Default for SpikingRectifiedLinear {
    fn default() -> Self {
        Self { amplitude: 1.0 }
    }
}

impl SpikingRectifiedLinear {
    /// Create a new spiking rectified linear model
    pub fn new(amplitude: f64) -> Result<Self> {
        check_positive("amplitude", amplitude)?;
        Ok(Self { amplitude })
    }
}

impl NeuronType for SpikingRectifiedLinear {
    fn name(&self) -> &'static str {
        "SpikingRectifiedLinear"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        _dt: f64,
        _dtype: Dtype,
    ) -> Result<NeuronState> {
        NeuronState::new().with("voltage", phases.to_owned())
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut voltage = state.take("voltage")?;
        let scale = self.amplitude / dt;
        Zip::from(&mut output)
            .and(&input)
            .and(&mut voltage)
            .for_each(|out, &j, v| {
                *v += j.max(0.0) * dt;
                let n_spikes = v.floor();
                *out = scale * n_spikes;
                *v -= n_spikes;
            });
        Ok(())
    }
}

/// Leaky integrate-and-fire neuron
///
/// Voltage is normalized so threshold is 1 and reset is 0. Integration is
/// exact over the non-refractory part of each step, and the refractory
/// period starts at the interpolated spike time inside the step.
#[derive(Debug, Clone, PartialEq)]
pub struct LIF {
    /// Membrane RC time constant (s)
    pub tau_rc: f64,
    /// Absolute refractory period (s)
    pub tau_ref: f64,
    /// Lower bound on voltage
    pub min_voltage: f64,
    /// Output scale
    pub amplitude: f64,
}

impl Default for LIF {
    fn default() -> Self {
        Self {
            tau_rc: 0.02,   // 20ms membrane time constant
            tau_ref: 0.002, // 2ms refractory period
            min_voltage: 0.0,
            amplitude: 1.0,
        }
    }
}

impl LIF {
    /// Create new LIF parameters with validation
    pub fn new(tau_rc: f64, tau_ref: f64, min_voltage: f64, amplitude: f64) -> Result<Self> {
        check_positive("tau_rc", tau_rc)?;
        check_non_negative("tau_ref", tau_ref)?;
        check_positive("amplitude", amplitude)?;
        if min_voltage.is_nan() || min_voltage >= 1.0 {
            return Err(NeuronError::invalid_parameter(
                "min_voltage",
                min_voltage.to_string(),
                "< 1.0",
            ));
        }
        Ok(Self {
            tau_rc,
            tau_ref,
            min_voltage,
            amplitude,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.tau_rc, self.tau_ref, self.min_voltage, self.amplitude)?;
        Ok(())
    }

    /// Advance one neuron; returns its output for the step
    #[inline]
    fn advance(&self, dt: f64, j: f64, voltage: &mut f64, refractory_time: &mut f64) -> f64 {
        *refractory_time -= dt;
        let delta_t = (dt - *refractory_time).clamp(0.0, dt);
        *voltage -= (j - *voltage) * (-delta_t / self.tau_rc).exp_m1();

        if *voltage > 1.0 {
            let overshoot = (*voltage - 1.0) / (j - 1.0);
            let t_spike = dt + self.tau_rc * (-overshoot).ln_1p();
            *voltage = 0.0;
            *refractory_time = self.tau_ref + t_spike;
            self.amplitude / dt
        } else {
            if *voltage < self.min_voltage {
                *voltage = self.min_voltage;
            }
            0.0
        }
    }

    fn lif_state(&self, phases: ArrayView1<'_, f64>) -> Result<NeuronState> {
        NeuronState::new()
            .with("voltage", phases.to_owned())?
            .with("refractory_time", 0.0)
    }
}

impl NeuronType for LIF {
    fn name(&self) -> &'static str {
        "LIF"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        _dt: f64,
        _dtype: Dtype,
    ) -> Result<NeuronState> {
        self.lif_state(phases)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut voltage = state.take("voltage")?;
        let mut refractory_time = state.take("refractory_time")?;
        Zip::from(&mut output)
            .and(&input)
            .and(&mut voltage)
            .and(&mut refractory_time)
            .for_each(|out, &j, v, r| *out = self.advance(dt, j, v, r));
        Ok(())
    }
}

/// LIF neuron with spike-frequency adaptation
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveLIF {
    /// Underlying LIF parameters
    pub lif: LIF,
    /// Adaptation time constant (s)
    pub tau_n: f64,
    /// Adaptation increment per spike
    pub inc_n: f64,
}

impl Default for AdaptiveLIF {
    fn default() -> Self {
        Self {
            lif: LIF::default(),
            tau_n: 1.0,
            inc_n: 0.01,
        }
    }
}

impl AdaptiveLIF {
    /// Create new adaptive LIF parameters with validation
    pub fn new(lif: LIF, tau_n: f64, inc_n: f64) -> Result<Self> {
        lif.validate()?;
        check_positive("tau_n", tau_n)?;
        check_non_negative("inc_n", inc_n)?;
        Ok(Self { lif, tau_n, inc_n })
    }
}

impl NeuronType for AdaptiveLIF {
    fn name(&self) -> &'static str {
        "AdaptiveLIF"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        phases: ArrayView1<'_, f64>,
        _dt: f64,
        _dtype: Dtype,
    ) -> Result<NeuronState> {
        self.lif.lif_state(phases)?.with("adaptation", 0.0)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut voltage = state.take("voltage")?;
        let mut refractory_time = state.take("refractory_time")?;
        let mut adaptation = state.take("adaptation")?;
        let k = dt / self.tau_n;
        Zip::from(&mut output)
            .and(&input)
            .and(&mut voltage)
            .and(&mut refractory_time)
            .and(&mut adaptation)
            .for_each(|out, &j, v, r, n| {
                *out = self.lif.advance(dt, j - *n, v, r);
                *n += k * (self.inc_n * *out - *n);
            });
        Ok(())
    }
}

/// Izhikevich two-variable spiking neuron (voltage in mV, time in ms)
#[derive(Debug, Clone, PartialEq)]
pub struct Izhikevich {
    /// Recovery time scale (`a`)
    pub tau_recovery: f64,
    /// Recovery sensitivity to voltage (`b`)
    pub coupling: f64,
    /// Post-spike voltage (`c`, mV)
    pub reset_voltage: f64,
    /// Post-spike recovery increment (`d`)
    pub reset_recovery: f64,
    /// Output scale
    pub amplitude: f64,
}

impl Default for Izhikevich {
    fn default() -> Self {
        // Regular spiking cortical cell
        Self {
            tau_recovery: 0.02,
            coupling: 0.2,
            reset_voltage: -65.0,
            reset_recovery: 8.0,
            amplitude: 1.0,
        }
    }
}

impl Izhikevich {
    /// Threshold at which a spike is registered (mV)
    pub const SPIKE_VOLTAGE: f64 = 30.0;

    /// Create new Izhikevich parameters with validation
    pub fn new(
        tau_recovery: f64,
        coupling: f64,
        reset_voltage: f64,
        reset_recovery: f64,
        amplitude: f64,
    ) -> Result<Self> {
        check_positive("tau_recovery", tau_recovery)?;
        check_non_negative("coupling", coupling)?;
        check_non_negative("reset_recovery", reset_recovery)?;
        check_positive("amplitude", amplitude)?;
        if !(reset_voltage < Self::SPIKE_VOLTAGE) {
            return Err(NeuronError::invalid_parameter(
                "reset_voltage",
                reset_voltage.to_string(),
                "< 30.0",
            ));
        }
        Ok(Self {
            tau_recovery,
            coupling,
            reset_voltage,
            reset_recovery,
            amplitude,
        })
    }
}

impl NeuronType for Izhikevich {
    fn name(&self) -> &'static str {
        "Izhikevich"
    }

    fn spiking(&self) -> bool {
        true
    }

    fn make_neuron_state(
        &self,
        _phases: ArrayView1<'_, f64>,
        _dt: f64,
        _dtype: Dtype,
    ) -> Result<NeuronState> {
        NeuronState::new()
            .with("voltage", self.reset_voltage)?
            .with("recovery", self.coupling * self.reset_voltage)
    }

    fn step(
        &self,
        dt: f64,
        input: ArrayView1<'_, f64>,
        mut output: ArrayViewMut1<'_, f64>,
        state: &mut StepState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut voltage = state.take("voltage")?;
        let mut recovery = state.take("recovery")?;
        let scale = self.amplitude / dt;
        Zip::from(&mut output)
            .and(&input)
            .and(&mut voltage)
            .and(&mut recovery)
            .for_each(|out, &j, v, u| {
                let j = j.max(-30.0);
                let dv = (0.04 * *v * *v + 5.0 * *v + 140.0 - *u + j) * 1000.0;
                *v += dv * dt;
                let spiked = *v >= Self::SPIKE_VOLTAGE;
                *out = if spiked { scale } else { 0.0 };
                if spiked {
                    *v = self.reset_voltage;
                }
                let du = self.tau_recovery * (self.coupling * *v - *u) * 1000.0;
                *u += du * dt;
                if spiked {
                    *u += self.reset_recovery;
                }
            });
        Ok(())
    }
}
