//! End-to-end stepping of built populations through the simulator.

use shnn_neurons::{
    BuildConfig, NetworkBuilder, PoissonSpiking, PopulationId, RectifiedLinear, RegularSpiking,
    Simulator, StochasticSpiking,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Total spikes per neuron over `steps` steps of constant drive
fn spike_counts(sim: &mut Simulator, id: PopulationId, drive: f64, steps: usize) -> Vec<f64> {
    let n = sim.model().sig(id).unwrap().get("in").unwrap().len();
    sim.set_input(id, &vec![drive; n]).unwrap();
    let mut counts = vec![0.0; n];
    for _ in 0..steps {
        sim.step().unwrap();
        for (c, out) in counts.iter_mut().zip(sim.output(id).unwrap()) {
            *c += out * sim.dt();
        }
    }
    counts
}

#[test]
fn regular_spiking_tracks_base_rate() {
    init_logging();
    let net = NetworkBuilder::new()
        .population(
            "ens",
            5,
            RegularSpiking::new(RectifiedLinear::default()).unwrap(),
        )
        .build()
        .unwrap();
    let mut sim = Simulator::new(&net, BuildConfig::default().with_seed(7)).unwrap();

    let counts = spike_counts(&mut sim, PopulationId::new(0), 50.0, 1000);
    for c in counts {
        assert!((c - 50.0).abs() <= 1.0 + 1e-9, "count {c}");
    }
}

#[test]
fn poisson_spiking_mean_matches_rate() {
    let net = NetworkBuilder::new()
        .population(
            "ens",
            40,
            PoissonSpiking::new(RectifiedLinear::default()).unwrap(),
        )
        .build()
        .unwrap();
    let mut sim = Simulator::new(&net, BuildConfig::default().with_seed(7)).unwrap();

    let counts = spike_counts(&mut sim, PopulationId::new(0), 50.0, 1000);
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    assert!((mean - 50.0).abs() < 5.0, "mean {mean}");
}

#[test]
fn stochastic_spiking_mean_matches_rate() {
    let net = NetworkBuilder::new()
        .population(
            "ens",
            40,
            StochasticSpiking::new(RectifiedLinear::default()).unwrap(),
        )
        .build()
        .unwrap();
    let mut sim = Simulator::new(&net, BuildConfig::default().with_seed(7)).unwrap();

    let counts = spike_counts(&mut sim, PopulationId::new(0), 50.0, 1000);
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    assert!((mean - 50.0).abs() < 5.0, "mean {mean}");
}

#[test]
fn namespace_sees_operator_updates() {
    let net = NetworkBuilder::new()
        .population_with_phase(
            "ens",
            3,
            RegularSpiking::new(RectifiedLinear::default()).unwrap(),
            0.0,
        )
        .build()
        .unwrap();
    let id = PopulationId::new(0);
    let mut sim = Simulator::new(&net, BuildConfig::default()).unwrap();
    sim.set_input(id, &[100.0, 200.0, 0.0]).unwrap();
    sim.step().unwrap();

    let voltage = sim.signal(id, "voltage").unwrap().to_vec();
    assert!((voltage[0] - 0.1).abs() < 1e-12);
    assert!((voltage[1] - 0.2).abs() < 1e-12);
    assert_eq!(voltage[2], 0.0);
}
