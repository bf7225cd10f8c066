//! Per-step neuron update operator

use crate::{
    error::*,
    neurons::{NeuronType, StepState},
    signal::Signal,
};
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;

/// Advances one population's neuron model once per step
///
/// Holds the population's allocated state signals (the same storage the
/// namespace exposes to probes), reads the input signal and writes the
/// output signal.
pub struct SimNeurons {
    neuron_type: Arc<dyn NeuronType>,
    input: Signal,
    output: Signal,
    states: Vec<(String, Signal)>,
    rng: StdRng,
}

impl SimNeurons {
    /// Create an operator over already-allocated signals
    pub fn new(
        neuron_type: Arc<dyn NeuronType>,
        input: Signal,
        output: Signal,
        states: Vec<(String, Signal)>,
        rng: StdRng,
    ) -> Result<Self> {
        if input.len() != output.len() {
            return Err(NeuronError::invalid_config(format!(
                "input has {} elements but output has {}",
                input.len(),
                output.len()
            )));
        }
        if input.ptr_eq(&output) {
            return Err(NeuronError::invalid_config(format!(
                "input and output are the same signal `{}`",
                input.name()
            )));
        }
        for (i, (name, signal)) in states.iter().enumerate() {
            if signal.len() != input.len() {
                return Err(NeuronError::StateShape {
                    name: name.clone(),
                    shape: vec![signal.len()],
                    n_neurons: input.len(),
                });
            }
            if signal.ptr_eq(&input) || signal.ptr_eq(&output) {
                return Err(NeuronError::name_collision(name.clone()));
            }
            // Each state is write-locked for the step; no two may share storage
            let earlier = &states[..i];
            if earlier.iter().any(|(n, s)| n == name || s.ptr_eq(signal)) {
                return Err(NeuronError::name_collision(name.clone()));
            }
        }
        Ok(Self {
            neuron_type,
            input,
            output,
            states,
            rng,
        })
    }

    /// The model this operator steps
    pub fn neuron_type(&self) -> &Arc<dyn NeuronType> {
        &self.neuron_type
    }

    /// Owned states in allocation order
    pub fn states(&self) -> impl Iterator<Item = (&str, &Signal)> {
        self.states.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Look up an owned state
    pub fn state(&self, name: &str) -> Option<&Signal> {
        self.states.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Signals read each step
    pub fn reads(&self) -> Vec<&Signal> {
        vec![&self.input]
    }

    /// Signals overwritten each step
    pub fn sets(&self) -> Vec<&Signal> {
        vec![&self.output]
    }

    /// Signals updated in place each step
    pub fn updates(&self) -> Vec<&Signal> {
        self.states.iter().map(|(_, s)| s).collect()
    }

    /// Run the model for one step of size `dt`
    pub fn step(&mut self, dt: f64) -> Result<()> {
        let input = self.input.read();
        let mut output = self.output.write();
        let mut guards: Vec<_> = self
            .states
            .iter()
            .map(|(name, signal)| (name.as_str(), signal.write()))
            .collect();
        let mut state = StepState::new(
            guards
                .iter_mut()
                .map(|(name, guard)| (*name, guard.view_mut())),
        );

        self.neuron_type
            .step(dt, input.view(), output.view_mut(), &mut state, &mut self.rng)?;
        Ok(())
    }
}

impl fmt::Debug for SimNeurons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimNeurons")
            .field("neuron_type", &self.neuron_type.name())
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .field("states", &self.states.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neurons::{RectifiedLinear, SpikingRectifiedLinear};
    use ndarray::array;
    use rand::SeedableRng;

    fn signals(n: usize) -> (Signal, Signal) {
        (Signal::zeros("in", n), Signal::zeros("out", n))
    }

    #[test]
    fn test_stateless_step() {
        let (input, output) = signals(3);
        *input.write() = array![-1.0, 0.5, 2.0];
        let mut op = SimNeurons::new(
            Arc::new(RectifiedLinear::default()),
            input,
            output.clone(),
            Vec::new(),
            StdRng::seed_from_u64(0),
        )
        .unwrap();

        op.step(0.001).unwrap();
        assert_eq!(output.to_vec(), vec![0.0, 0.5, 2.0]);
        assert!(op.updates().is_empty());
    }

    #[test]
    fn test_state_mutated_in_place() {
        let (input, output) = signals(2);
        *input.write() = array![600.0, 0.0];
        let voltage = Signal::new("voltage", array![0.5, 0.5]);
        let mut op = SimNeurons::new(
            Arc::new(SpikingRectifiedLinear::default()),
            input.clone(),
            output.clone(),
            vec![("voltage".to_string(), voltage.clone())],
            StdRng::seed_from_u64(0),
        )
        .unwrap();

        op.step(0.001).unwrap();
        assert_eq!(output.to_vec(), vec![1000.0, 0.0]);
        let v = voltage.to_vec();
        assert!((v[0] - 0.1).abs() < 1e-12);
        assert_eq!(v[1], 0.5);

        assert!(op.state("voltage").unwrap().ptr_eq(&voltage));
        assert!(op.reads()[0].ptr_eq(&input));
        assert!(op.sets()[0].ptr_eq(&output));
    }

    #[test]
    fn test_missing_state_surfaces() {
        let (input, output) = signals(1);
        let mut op = SimNeurons::new(
            Arc::new(SpikingRectifiedLinear::default()),
            input,
            output,
            Vec::new(),
            StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(op.step(0.001).unwrap_err(), NeuronError::missing_state("voltage"));
    }

    #[test]
    fn test_rejects_mismatched_signals() {
        let (input, _) = signals(2);
        let err = SimNeurons::new(
            Arc::new(RectifiedLinear::default()),
            input.clone(),
            Signal::zeros("out", 3),
            Vec::new(),
            StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, NeuronError::InvalidConfiguration { .. }));

        let output = Signal::zeros("out", 2);
        let err = SimNeurons::new(
            Arc::new(RectifiedLinear::default()),
            input.clone(),
            output,
            vec![("alias".to_string(), input)],
            StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert_eq!(err, NeuronError::name_collision("alias"));
    }

    #[test]
    fn test_rejects_aliased_signals() {
        let relu = || -> Arc<dyn NeuronType> { Arc::new(RectifiedLinear::default()) };
        let shared = Signal::zeros("io", 2);
        let err = SimNeurons::new(
            relu(),
            shared.clone(),
            shared,
            Vec::new(),
            StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, NeuronError::InvalidConfiguration { .. }));

        let (input, output) = signals(2);
        let voltage = Signal::zeros("voltage", 2);
        let err = SimNeurons::new(
            relu(),
            input.clone(),
            output.clone(),
            vec![
                ("voltage".to_string(), voltage.clone()),
                ("adaptation".to_string(), voltage),
            ],
            StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert_eq!(err, NeuronError::name_collision("adaptation"));

        let err = SimNeurons::new(
            relu(),
            input,
            output,
            vec![
                ("voltage".to_string(), Signal::zeros("voltage", 2)),
                ("voltage".to_string(), Signal::zeros("voltage", 2)),
            ],
            StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert_eq!(err, NeuronError::name_collision("voltage"));
    }
}
