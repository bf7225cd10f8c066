//! Minimal step loop over built neuron operators

use crate::{
    builder::{Model, INPUT_SIGNAL, OUTPUT_SIGNAL},
    config::BuildConfig,
    error::*,
    network::{Network, PopulationId},
    signal::Signal,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Owns a built model and advances all of its operators each step
#[derive(Debug)]
pub struct Simulator {
    model: Model,
    n_steps: u64,
}

impl Simulator {
    /// Build `network` and prepare to run it
    pub fn new(network: &Network, config: BuildConfig) -> Result<Self> {
        let model = Model::build(network, config)?;
        Ok(Self { model, n_steps: 0 })
    }

    /// The built model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Step size (s)
    pub fn dt(&self) -> f64 {
        self.model.config().dt
    }

    /// Steps executed so far
    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    /// Simulated time (s)
    pub fn time(&self) -> f64 {
        self.n_steps as f64 * self.dt()
    }

    /// Look up a population's signal by name (`in`, `out` or a state)
    pub fn signal(&self, id: PopulationId, name: &str) -> Option<&Signal> {
        self.model.sig(id)?.get(name)
    }

    /// Per-neuron output of a population from the last step
    pub fn output(&self, id: PopulationId) -> Option<Vec<f64>> {
        self.signal(id, OUTPUT_SIGNAL).map(Signal::to_vec)
    }

    /// Set the drive applied to a population on subsequent steps
    pub fn set_input(&mut self, id: PopulationId, values: &[f64]) -> Result<()> {
        let input = self.signal(id, INPUT_SIGNAL).ok_or_else(|| {
            NeuronError::invalid_config(format!("Population {} was not built", id.raw()))
        })?;
        let mut data = input.write();
        if values.len() != data.len() {
            return Err(NeuronError::invalid_parameter(
                "values",
                format!("{} elements", values.len()),
                format!("{} elements", data.len()),
            ));
        }
        data.iter_mut().zip(values).for_each(|(d, v)| *d = *v);
        Ok(())
    }

    /// Advance every operator by one step
    pub fn step(&mut self) -> Result<()> {
        let dt = self.dt();
        let step = self.n_steps;
        let operators = self.model.operators_mut();

        #[cfg(feature = "parallel")]
        let result: Result<()> = operators.par_iter_mut().try_for_each(|op| op.step(dt));

        #[cfg(not(feature = "parallel"))]
        let result: Result<()> = operators.iter_mut().try_for_each(|op| op.step(dt));

        result.map_err(|e| NeuronError::simulation_step(step, e.to_string()))?;
        self.n_steps += 1;
        Ok(())
    }

    /// Advance `steps` times
    pub fn run_steps(&mut self, steps: u64) -> Result<()> {
        log::info!("Running {} steps with dt={}s", steps, self.dt());
        for i in 0..steps {
            self.step()?;
            if i % (steps / 10).max(1) == 0 {
                log::debug!("Simulation progress: {:.1}%", i as f64 / steps as f64 * 100.0);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use crate::neurons::{RectifiedLinear, LIF};

    #[test]
    fn test_simulator_steps() {
        let net = NetworkBuilder::new()
            .population("relu", 2, RectifiedLinear::default())
            .build()
            .unwrap();
        let id = PopulationId::new(0);
        let mut sim = Simulator::new(&net, BuildConfig::default().with_seed(0)).unwrap();

        sim.set_input(id, &[1.5, -1.0]).unwrap();
        sim.run_steps(3).unwrap();

        assert_eq!(sim.n_steps(), 3);
        assert!((sim.time() - 0.003).abs() < 1e-12);
        assert_eq!(sim.output(id).unwrap(), vec![1.5, 0.0]);
    }

    #[test]
    fn test_set_input_validation() {
        let net = NetworkBuilder::new()
            .population("lif", 2, LIF::default())
            .build()
            .unwrap();
        let mut sim = Simulator::new(&net, BuildConfig::default()).unwrap();

        assert!(sim.set_input(PopulationId::new(0), &[1.0]).is_err());
        assert!(sim.set_input(PopulationId::new(5), &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_lif_population_spikes() {
        let net = NetworkBuilder::new()
            .population_with_phase("lif", 3, LIF::default(), 0.0)
            .build()
            .unwrap();
        let id = PopulationId::new(0);
        let mut sim = Simulator::new(&net, BuildConfig::default()).unwrap();
        sim.set_input(id, &[0.0, 2.0, 5.0]).unwrap();

        let mut counts = [0.0; 3];
        for _ in 0..1000 {
            sim.step().unwrap();
            for (c, out) in counts.iter_mut().zip(sim.output(id).unwrap()) {
                *c += out * sim.dt();
            }
        }
        assert_eq!(counts[0], 0.0);
        assert!(counts[1] > 0.0);
        assert!(counts[2] > counts[1]);
    }
}
