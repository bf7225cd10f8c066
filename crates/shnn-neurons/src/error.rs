//! Error types for neuron state construction and stepping

use thiserror::Error;

/// Result type for neuron operations
pub type Result<T> = std::result::Result<T, NeuronError>;

/// Errors that can occur while building or stepping neuron populations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeuronError {
    /// The population's `initial_phase` parameter has an invalid shape
    #[error(
        "`initial_phase` array must be 0-D, or 1-D of length equal to the number of neurons \
         (got shape {shape:?}, expected [] or [{n_neurons}])"
    )]
    InitialPhase {
        /// Observed shape
        shape: Vec<usize>,
        /// Population size
        n_neurons: usize,
    },

    /// A state init array has an invalid rank or length
    #[error(
        "State init array must be 0-D, or 1-D of length equal to the number of neurons \
         (state `{name}` has shape {shape:?}, expected [] or [{n_neurons}])"
    )]
    StateShape {
        /// State name
        name: String,
        /// Observed shape
        shape: Vec<usize>,
        /// Population size
        n_neurons: usize,
    },

    /// A state init value is neither an array nor a distribution
    #[error("State init must be a distribution or array-like (state `{name}` got `{type_name}`)")]
    StateType {
        /// State name
        name: String,
        /// Type of the rejected value
        type_name: String,
    },

    /// A state name is already taken in the target namespace
    #[error("State name `{name}` overlaps with existing signal")]
    NameCollision {
        /// Colliding name
        name: String,
    },

    /// A state name is not usable as a signal key
    #[error("State name must be non-empty (got {name:?})")]
    InvalidStateName {
        /// Rejected name
        name: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Invalid model or network configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// A step function asked for a state the operator does not own
    #[error("State `{name}` is not owned by this operator")]
    MissingState {
        /// Requested state name
        name: String,
    },

    /// Simulation step failed
    #[error("Simulation step {step} failed: {reason}")]
    SimulationStep {
        /// Step index
        step: u64,
        /// Reason for failure
        reason: String,
    },
}

impl NeuronError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a name collision error
    pub fn name_collision(name: impl Into<String>) -> Self {
        Self::NameCollision { name: name.into() }
    }

    /// Create a missing state error
    pub fn missing_state(name: impl Into<String>) -> Self {
        Self::MissingState { name: name.into() }
    }

    /// Create a simulation step error
    pub fn simulation_step(step: u64, reason: impl Into<String>) -> Self {
        Self::SimulationStep {
            step,
            reason: reason.into(),
        }
    }

    /// Whether this error can only arise while building a population
    pub fn is_build_error(&self) -> bool {
        !matches!(self, Self::MissingState { .. } | Self::SimulationStep { .. })
    }
}
