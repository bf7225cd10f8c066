//! Build pass: populations in, signal namespaces and operators out
//!
//! For each population the pass creates a fresh namespace holding the
//! reserved `in`/`out` signals, resolves the initial phase, asks the model
//! for its state descriptors, normalizes each one and allocates it, then
//! constructs one [`SimNeurons`] operator over exactly those allocations.
//! Nothing is committed until every step for the population succeeded.

use crate::{
    config::BuildConfig,
    error::*,
    network::{Network, Population, PopulationId},
    operator::SimNeurons,
    signal::{Signal, SignalNamespace},
    state::normalize_state,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Name of the per-neuron input (drive) signal
pub const INPUT_SIGNAL: &str = "in";
/// Name of the per-neuron output (rate or spike) signal
pub const OUTPUT_SIGNAL: &str = "out";

/// Result of building a network
#[derive(Debug)]
pub struct Model {
    config: BuildConfig,
    sig: HashMap<PopulationId, SignalNamespace>,
    operators: Vec<SimNeurons>,
    op_index: HashMap<PopulationId, usize>,
    rng: StdRng,
}

impl Model {
    /// Create an empty model
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            sig: HashMap::new(),
            operators: Vec::new(),
            op_index: HashMap::new(),
            rng,
        })
    }

    /// Build every population in `network`; any failure fails the whole build
    pub fn build(network: &Network, config: BuildConfig) -> Result<Self> {
        let mut model = Self::new(config)?;
        log::info!("Building network: {} populations", network.len());

        for (id, population) in network.populations() {
            model.build_population(id, population)?;
        }

        log::info!(
            "Build completed: {} operators, {} state signals",
            model.operators.len(),
            model
                .operators
                .iter()
                .map(|op| op.updates().len())
                .sum::<usize>()
        );
        Ok(model)
    }

    /// Build one population and add its operator
    pub fn build_population(&mut self, id: PopulationId, population: &Population) -> Result<()> {
        if self.sig.contains_key(&id) {
            return Err(NeuronError::invalid_config(format!(
                "Population {} has already been built",
                id.raw()
            )));
        }

        // Seeds are drawn up front so a population's values do not depend on
        // how much randomness earlier populations consumed
        let mut build_rng = StdRng::seed_from_u64(self.rng.gen());
        let op_rng = StdRng::seed_from_u64(self.rng.gen());

        let n = population.n_neurons();
        let neuron_type = population.neuron_type();
        let dt = self.config.dt;
        let dtype = self.config.dtype;

        let mut namespace = SignalNamespace::new();
        let input = Signal::zeros(INPUT_SIGNAL, n);
        let output = Signal::zeros(OUTPUT_SIGNAL, n);
        namespace.insert(input.clone())?;
        namespace.insert(output.clone())?;

        let phases = population.initial_phase().resolve(n, &mut build_rng)?;
        let descriptors = neuron_type.make_neuron_state(phases.view(), dt, dtype)?;

        let mut states = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let array = normalize_state(&descriptor.name, &descriptor.init, n, dtype, &mut build_rng)?;
            let signal = namespace.allocate(&descriptor.name, array)?;
            states.push((descriptor.name, signal));
        }

        log::debug!(
            "Built population `{}` ({} x {}): states [{}]",
            population.label(),
            n,
            neuron_type.name(),
            states
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let op = SimNeurons::new(neuron_type.clone(), input, output, states, op_rng)?;
        self.op_index.insert(id, self.operators.len());
        self.operators.push(op);
        self.sig.insert(id, namespace);
        Ok(())
    }

    /// Build configuration
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Signal namespace of a built population
    pub fn sig(&self, id: PopulationId) -> Option<&SignalNamespace> {
        self.sig.get(&id)
    }

    /// All operators, in build order
    pub fn operators(&self) -> &[SimNeurons] {
        &self.operators
    }

    /// Operator of a built population
    pub fn operator(&self, id: PopulationId) -> Option<&SimNeurons> {
        self.op_index.get(&id).map(|&i| &self.operators[i])
    }

    pub(crate) fn operators_mut(&mut self) -> &mut [SimNeurons] {
        &mut self.operators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dtype;
    use crate::network::{InitialPhase, NetworkBuilder};
    use crate::neurons::{
        AdaptiveLIF, AdaptiveLIFRate, Izhikevich, LIFRate, NeuronType, PoissonSpiking,
        RectifiedLinear, RegularSpiking, Sigmoid, SpikingRectifiedLinear, StochasticSpiking, Tanh,
        LIF,
    };
    use ndarray::{array, Array1, Array2};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn seeded() -> BuildConfig {
        BuildConfig::default().with_seed(1)
    }

    #[test]
    fn test_build_single_population() {
        let net = NetworkBuilder::new()
            .population_with_phase("ens", 4, LIF::default(), vec![0.0, 0.25, 0.5, 0.75])
            .build()
            .unwrap();
        let model = Model::build(&net, seeded()).unwrap();
        let id = PopulationId::new(0);

        assert_eq!(model.operators().len(), 1);
        let ns = model.sig(id).unwrap();
        assert_eq!(ns.names(), vec!["in", "out", "refractory_time", "voltage"]);
        assert_eq!(ns.get("voltage").unwrap().to_vec(), vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(ns.get("refractory_time").unwrap().to_vec(), vec![0.0; 4]);

        let op = model.operator(id).unwrap();
        let names: Vec<_> = op.states().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["voltage", "refractory_time"]);
        for (name, signal) in op.states() {
            assert!(ns.get(name).unwrap().ptr_eq(signal));
        }
    }

    #[test]
    fn test_stateless_population() {
        let net = NetworkBuilder::new()
            .population("relu", 3, RectifiedLinear::default())
            .build()
            .unwrap();
        let model = Model::build(&net, seeded()).unwrap();
        assert_eq!(model.operators()[0].states().count(), 0);
        assert_eq!(model.sig(PopulationId::new(0)).unwrap().len(), 2);
    }

    #[test]
    fn test_scalar_state_broadcast() {
        let net = NetworkBuilder::new()
            .population("alif", 5, AdaptiveLIFRate::default())
            .build()
            .unwrap();
        let model = Model::build(&net, seeded()).unwrap();
        let adaptation = model.sig(PopulationId::new(0)).unwrap().get("adaptation").unwrap();
        assert_eq!(adaptation.to_vec(), vec![0.0; 5]);
    }

    #[test]
    fn test_rebuilding_population_rejected() {
        let net = NetworkBuilder::new()
            .population("relu", 3, RectifiedLinear::default())
            .build()
            .unwrap();
        let mut model = Model::build(&net, seeded()).unwrap();
        let (id, pop) = net.populations().next().unwrap();
        assert!(matches!(
            model.build_population(id, pop),
            Err(NeuronError::InvalidConfiguration { .. })
        ));
    }

    // `set_initial_phase` rejects these shapes; write the field directly to
    // check that the build re-validates it
    #[test]
    fn test_bad_initial_phase_fails_build() {
        let mut net = Network::new();
        let id = net.add(Population::new("ens", 2, LIF::default()).unwrap()).unwrap();

        net.population_mut(id).unwrap().initial_phase = InitialPhase::from(array![0.1, 0.2, 0.3]);
        let err = Model::build(&net, seeded()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("`initial_phase` array must be 0-D, or 1-D"));

        net.population_mut(id).unwrap().initial_phase =
            InitialPhase::from(Array2::from_shape_vec((1, 2), vec![0.1, 0.2]).unwrap());
        let err = Model::build(&net, seeded()).unwrap_err();
        assert!(matches!(err, NeuronError::InitialPhase { ref shape, n_neurons: 2 } if shape == &vec![1, 2]));
    }

    #[test]
    fn test_seeded_builds_reproducible() {
        let net = NetworkBuilder::new()
            .population("a", 6, LIF::default())
            .population("b", 6, LIF::default())
            .build()
            .unwrap();
        let m1 = Model::build(&net, seeded()).unwrap();
        let m2 = Model::build(&net, seeded()).unwrap();
        for (id, _) in net.populations() {
            let v1 = m1.sig(id).unwrap().get("voltage").unwrap().to_vec();
            let v2 = m2.sig(id).unwrap().get("voltage").unwrap().to_vec();
            assert_eq!(v1, v2);
        }
        let a = m1.sig(PopulationId::new(0)).unwrap().get("voltage").unwrap().to_vec();
        let b = m1.sig(PopulationId::new(1)).unwrap().get("voltage").unwrap().to_vec();
        assert_ne!(a, b);
    }

    fn catalogue(which: usize) -> Arc<dyn NeuronType> {
        match which {
            0 => Arc::new(RectifiedLinear::default()),
            1 => Arc::new(Sigmoid::default()),
            2 => Arc::new(Tanh::default()),
            3 => Arc::new(LIFRate::default()),
            4 => Arc::new(AdaptiveLIFRate::default()),
            5 => Arc::new(SpikingRectifiedLinear::default()),
            6 => Arc::new(LIF::default()),
            7 => Arc::new(AdaptiveLIF::default()),
            8 => Arc::new(Izhikevich::default()),
            9 => Arc::new(RegularSpiking::new(AdaptiveLIFRate::default()).unwrap()),
            10 => Arc::new(PoissonSpiking::new(AdaptiveLIFRate::default()).unwrap()),
            _ => Arc::new(StochasticSpiking::new(LIFRate::default()).unwrap()),
        }
    }

    proptest! {
        #[test]
        fn prop_every_declared_state_allocated_per_neuron(
            n in 1usize..64,
            which in 0usize..12,
            seed in any::<u64>(),
        ) {
            let neuron_type = catalogue(which);
            let declared: Vec<String> = neuron_type
                .make_neuron_state(Array1::<f64>::zeros(n).view(), 0.001, Dtype::F64)
                .unwrap()
                .names()
                .map(String::from)
                .collect();

            let mut net = Network::new();
            let id = net
                .add(Population::from_arc("ens", n, neuron_type).unwrap())
                .unwrap();
            let model = Model::build(&net, BuildConfig::default().with_seed(seed)).unwrap();

            let ns = model.sig(id).unwrap();
            prop_assert_eq!(ns.len(), declared.len() + 2);
            let op = model.operator(id).unwrap();
            let owned: Vec<&str> = op.states().map(|(name, _)| name).collect();
            prop_assert_eq!(owned, declared.iter().map(String::as_str).collect::<Vec<_>>());
            for name in &declared {
                let signal = ns.get(name).unwrap();
                prop_assert_eq!(signal.len(), n);
                prop_assert!(op.state(name).unwrap().ptr_eq(signal));
            }
        }
    }
}
