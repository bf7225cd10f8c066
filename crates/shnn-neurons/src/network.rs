//! Populations and the network that groups them

use crate::{
    dist::{Distribution, Uniform},
    error::*,
    neurons::NeuronType,
    state::broadcast_1d,
};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Population identifier, the index of the population in its network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopulationId(pub usize);

impl PopulationId {
    /// Create a new population ID
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> usize {
        self.0
    }
}

/// Per-neuron phase used by models to offset their initial state
#[derive(Clone)]
pub enum InitialPhase {
    /// 0-D (uniform) or 1-D (per-neuron) literal
    Array(ArrayD<f64>),
    /// Sampled once per neuron at build time
    Distribution(Arc<dyn Distribution>),
}

impl InitialPhase {
    /// Wrap a distribution
    pub fn distribution<D: Distribution + 'static>(dist: D) -> Self {
        Self::Distribution(Arc::new(dist))
    }

    /// Check the 0-D-or-1-D-of-length-N rule without sampling
    pub fn check(&self, n_neurons: usize) -> Result<()> {
        match self {
            Self::Array(a) if a.ndim() == 0 || (a.ndim() == 1 && a.len() == n_neurons) => Ok(()),
            Self::Array(a) => Err(NeuronError::InitialPhase {
                shape: a.shape().to_vec(),
                n_neurons,
            }),
            Self::Distribution(_) => Ok(()),
        }
    }

    /// Produce one phase per neuron
    pub fn resolve(&self, n_neurons: usize, rng: &mut dyn RngCore) -> Result<Array1<f64>> {
        match self {
            Self::Array(a) => broadcast_1d(a, n_neurons).ok_or_else(|| NeuronError::InitialPhase {
                shape: a.shape().to_vec(),
                n_neurons,
            }),
            Self::Distribution(dist) => {
                let phases = dist.sample(n_neurons, rng);
                if phases.len() != n_neurons {
                    return Err(NeuronError::InitialPhase {
                        shape: vec![phases.len()],
                        n_neurons,
                    });
                }
                Ok(phases)
            }
        }
    }
}

impl Default for InitialPhase {
    fn default() -> Self {
        Self::Distribution(Arc::new(Uniform::unit()))
    }
}

impl fmt::Debug for InitialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(a) => f.debug_tuple("Array").field(&a.shape()).finish(),
            Self::Distribution(d) => f.debug_tuple("Distribution").field(d).finish(),
        }
    }
}

impl From<f64> for InitialPhase {
    fn from(value: f64) -> Self {
        Self::Array(ArrayD::from_elem(IxDyn(&[]), value))
    }
}

impl From<Vec<f64>> for InitialPhase {
    fn from(values: Vec<f64>) -> Self {
        Self::Array(Array1::from(values).into_dyn())
    }
}

impl From<Array1<f64>> for InitialPhase {
    fn from(array: Array1<f64>) -> Self {
        Self::Array(array.into_dyn())
    }
}

impl From<Array2<f64>> for InitialPhase {
    fn from(array: Array2<f64>) -> Self {
        Self::Array(array.into_dyn())
    }
}

impl From<ArrayD<f64>> for InitialPhase {
    fn from(array: ArrayD<f64>) -> Self {
        Self::Array(array)
    }
}

impl From<Arc<dyn Distribution>> for InitialPhase {
    fn from(dist: Arc<dyn Distribution>) -> Self {
        Self::Distribution(dist)
    }
}

/// Fixed-size group of neurons sharing one model
#[derive(Debug, Clone)]
pub struct Population {
    label: String,
    n_neurons: usize,
    neuron_type: Arc<dyn NeuronType>,
    pub(crate) initial_phase: InitialPhase,
}

impl Population {
    /// Create a population with the default `Uniform(0, 1)` initial phase
    pub fn new(
        label: impl Into<String>,
        n_neurons: usize,
        neuron_type: impl NeuronType + 'static,
    ) -> Result<Self> {
        Self::from_arc(label, n_neurons, Arc::new(neuron_type))
    }

    /// Create a population sharing an existing model instance
    pub fn from_arc(
        label: impl Into<String>,
        n_neurons: usize,
        neuron_type: Arc<dyn NeuronType>,
    ) -> Result<Self> {
        if n_neurons == 0 {
            return Err(NeuronError::invalid_parameter("n_neurons", "0", "> 0"));
        }
        Ok(Self {
            label: label.into(),
            n_neurons,
            neuron_type,
            initial_phase: InitialPhase::default(),
        })
    }

    /// Set the initial phase, validating its shape
    pub fn with_initial_phase(mut self, phase: impl Into<InitialPhase>) -> Result<Self> {
        self.set_initial_phase(phase)?;
        Ok(self)
    }

    /// Set the initial phase, validating its shape
    pub fn set_initial_phase(&mut self, phase: impl Into<InitialPhase>) -> Result<()> {
        let phase = phase.into();
        phase.check(self.n_neurons)?;
        self.initial_phase = phase;
        Ok(())
    }

    /// Population label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of neurons
    pub fn n_neurons(&self) -> usize {
        self.n_neurons
    }

    /// Shared model instance
    pub fn neuron_type(&self) -> &Arc<dyn NeuronType> {
        &self.neuron_type
    }

    /// Current initial phase parameter
    pub fn initial_phase(&self) -> &InitialPhase {
        &self.initial_phase
    }
}

/// Collection of populations to be built together
#[derive(Debug, Clone, Default)]
pub struct Network {
    populations: Vec<Population>,
}

impl Network {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a population; labels must be unique
    pub fn add(&mut self, population: Population) -> Result<PopulationId> {
        if self.populations.iter().any(|p| p.label == population.label) {
            return Err(NeuronError::invalid_config(format!(
                "Population `{}` already exists",
                population.label
            )));
        }
        self.populations.push(population);
        Ok(PopulationId::new(self.populations.len() - 1))
    }

    /// Look up a population
    pub fn get(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get(id.raw())
    }

    /// Find a population by label
    pub fn find(&self, label: &str) -> Option<PopulationId> {
        self.populations
            .iter()
            .position(|p| p.label == label)
            .map(PopulationId::new)
    }

    /// Populations with their IDs, in insertion order
    pub fn populations(&self) -> impl Iterator<Item = (PopulationId, &Population)> {
        self.populations
            .iter()
            .enumerate()
            .map(|(i, p)| (PopulationId::new(i), p))
    }

    /// Number of populations
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    /// Whether the network has no populations
    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn population_mut(&mut self, id: PopulationId) -> Option<&mut Population> {
        self.populations.get_mut(id.raw())
    }
}

/// Builder for constructing networks
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    populations: Vec<(String, usize, Arc<dyn NeuronType>, Option<InitialPhase>)>,
}

impl NetworkBuilder {
    /// Create a new network builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a population with the default initial phase
    pub fn population(
        mut self,
        label: impl Into<String>,
        n_neurons: usize,
        neuron_type: impl NeuronType + 'static,
    ) -> Self {
        self.populations
            .push((label.into(), n_neurons, Arc::new(neuron_type), None));
        self
    }

    /// Add a population with an explicit initial phase
    pub fn population_with_phase(
        mut self,
        label: impl Into<String>,
        n_neurons: usize,
        neuron_type: impl NeuronType + 'static,
        phase: impl Into<InitialPhase>,
    ) -> Self {
        self.populations.push((
            label.into(),
            n_neurons,
            Arc::new(neuron_type),
            Some(phase.into()),
        ));
        self
    }

    /// Build the network, validating every population
    pub fn build(self) -> Result<Network> {
        let mut network = Network::new();
        for (label, n_neurons, neuron_type, phase) in self.populations {
            let mut population = Population::from_arc(label, n_neurons, neuron_type)?;
            if let Some(phase) = phase {
                population.set_initial_phase(phase)?;
            }
            network.add(population)?;
        }
        Ok(network)
    }
}
