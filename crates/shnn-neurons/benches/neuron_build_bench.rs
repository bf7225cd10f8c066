use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use shnn_neurons::{
    AdaptiveLIFRate, BuildConfig, Model, Network, NetworkBuilder, PopulationId, RegularSpiking,
    Simulator, LIF,
};

fn build_network(neurons: usize, populations: usize) -> Network {
    let mut builder = NetworkBuilder::new();
    for p in 0..populations {
        let wrapped = RegularSpiking::new(AdaptiveLIFRate::default()).expect("bench wrapper");
        builder = builder
            .population(format!("lif_{p}"), neurons, LIF::default())
            .population(format!("alif_{p}"), neurons, wrapped);
    }
    builder.build().expect("bench network build")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("neuron_state_build");

    for &n in &[16usize, 256, 4096] {
        group.throughput(Throughput::Elements(n as u64 * 4));
        group.bench_with_input(BenchmarkId::new("build", n), &n, |b, &n| {
            let net = build_network(n, 2);
            b.iter(|| Model::build(&net, BuildConfig::default().with_seed(1234)).unwrap());
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("neuron_step");
    // Short runs to keep benches fast in CI
    let steps = 100;

    for &n in &[16usize, 256, 4096] {
        group.throughput(Throughput::Elements(n as u64 * 2 * steps));
        group.bench_with_input(BenchmarkId::new("run_steps", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let net = build_network(n, 1);
                    let mut sim = Simulator::new(&net, BuildConfig::default().with_seed(1234))
                        .expect("bench simulator");
                    for id in 0..2 {
                        sim.set_input(PopulationId::new(id), &vec![2.0; n]).unwrap();
                    }
                    sim
                },
                |mut sim| {
                    sim.run_steps(steps).unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_step);
criterion_main!(benches);
