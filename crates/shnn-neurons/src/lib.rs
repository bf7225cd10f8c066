//! Neuron population state construction for the hSNN simulator
//!
//! This crate turns a population size and a pluggable neuron model into
//! concrete, correctly-shaped state arrays, allocates them into a
//! collision-checked per-population namespace, and binds them to the
//! operator that advances the model once per simulation step.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod builder;
pub mod config;
pub mod dist;
pub mod error;
pub mod network;
pub mod neurons;
pub mod operator;
pub mod signal;
pub mod simulator;
pub mod state;

// Re-export essential types
pub use builder::{Model, INPUT_SIGNAL, OUTPUT_SIGNAL};
pub use config::{BuildConfig, Dtype};
pub use dist::{Choice, Distribution, Gaussian, Uniform};
pub use error::{NeuronError, Result};
pub use network::{InitialPhase, Network, NetworkBuilder, Population, PopulationId};
pub use neurons::{
    AdaptiveLIF, AdaptiveLIFRate, Izhikevich, LIFRate, NeuronType, PoissonSpiking,
    RectifiedLinear, RegularSpiking, Sigmoid, SpikingRectifiedLinear, StepState,
    StochasticSpiking, Tanh, LIF,
};
pub use operator::SimNeurons;
pub use signal::{Signal, SignalNamespace};
pub use simulator::Simulator;
pub use state::{normalize_state, NeuronState, StateDescriptor, StateInit};
