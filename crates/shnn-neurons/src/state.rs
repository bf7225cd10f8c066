//! State descriptors and the shape normalizer
//!
//! Models describe the per-neuron arrays they need as [`NeuronState`]
//! entries. Nothing a model returns is allocated directly: every entry goes
//! through [`normalize_state`], which either produces a `(N,)` array or a
//! diagnosable error naming the state.

use crate::{config::Dtype, dist::Distribution, error::*};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use rand::RngCore;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Initial value source for one state array
#[derive(Clone)]
pub enum StateInit {
    /// Literal array of any rank; only 0-D and 1-D of length N survive normalization
    Array(ArrayD<f64>),
    /// Sampled once per neuron at build time
    Distribution(Arc<dyn Distribution>),
    /// A value that is neither array-like nor a distribution
    Unsupported {
        /// Rust type name of the rejected value
        type_name: &'static str,
    },
}

impl StateInit {
    /// Convert an arbitrary value supplied by a model author
    ///
    /// Known array-likes and distribution handles convert to their variant;
    /// anything else is kept as [`StateInit::Unsupported`] so normalization
    /// can report it against the state's name.
    pub fn from_value<T: Any>(value: T) -> Self {
        let any = &value as &dyn Any;
        if let Some(init) = any.downcast_ref::<StateInit>() {
            return init.clone();
        }
        if let Some(x) = any.downcast_ref::<f64>() {
            return Self::scalar(*x);
        }
        if let Some(x) = any.downcast_ref::<f32>() {
            return Self::scalar(*x as f64);
        }
        if let Some(v) = any.downcast_ref::<Vec<f64>>() {
            return Self::Array(Array1::from(v.clone()).into_dyn());
        }
        if let Some(a) = any.downcast_ref::<Array1<f64>>() {
            return Self::Array(a.clone().into_dyn());
        }
        if let Some(a) = any.downcast_ref::<Array2<f64>>() {
            return Self::Array(a.clone().into_dyn());
        }
        if let Some(a) = any.downcast_ref::<ArrayD<f64>>() {
            return Self::Array(a.clone());
        }
        if let Some(d) = any.downcast_ref::<Arc<dyn Distribution>>() {
            return Self::Distribution(Arc::clone(d));
        }
        Self::Unsupported {
            type_name: type_name::<T>(),
        }
    }

    /// A 0-D value broadcast to every neuron
    pub fn scalar(value: f64) -> Self {
        Self::Array(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Wrap a distribution
    pub fn distribution<D: Distribution + 'static>(dist: D) -> Self {
        Self::Distribution(Arc::new(dist))
    }
}

impl fmt::Debug for StateInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(a) => f.debug_tuple("Array").field(&a.shape()).finish(),
            Self::Distribution(d) => f.debug_tuple("Distribution").field(d).finish(),
            Self::Unsupported { type_name } => f
                .debug_struct("Unsupported")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

impl From<f64> for StateInit {
    fn from(value: f64) -> Self {
        Self::scalar(value)
    }
}

impl From<Vec<f64>> for StateInit {
    fn from(values: Vec<f64>) -> Self {
        Self::Array(Array1::from(values).into_dyn())
    }
}

impl From<Array1<f64>> for StateInit {
    fn from(array: Array1<f64>) -> Self {
        Self::Array(array.into_dyn())
    }
}

impl From<Array2<f64>> for StateInit {
    fn from(array: Array2<f64>) -> Self {
        Self::Array(array.into_dyn())
    }
}

impl From<ArrayD<f64>> for StateInit {
    fn from(array: ArrayD<f64>) -> Self {
        Self::Array(array)
    }
}

impl From<Arc<dyn Distribution>> for StateInit {
    fn from(dist: Arc<dyn Distribution>) -> Self {
        Self::Distribution(dist)
    }
}

/// One named initial-value request produced by a model
#[derive(Debug, Clone)]
pub struct StateDescriptor {
    /// Signal name the state is allocated under
    pub name: String,
    /// Initial value source
    pub init: StateInit,
}

/// Ordered set of state descriptors with unique, non-empty names
#[derive(Debug, Clone, Default)]
pub struct NeuronState {
    entries: Vec<StateDescriptor>,
}

impl NeuronState {
    /// Create an empty (stateless) set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, rejecting empty or already-declared names
    pub fn insert(&mut self, name: impl Into<String>, init: impl Into<StateInit>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(NeuronError::InvalidStateName { name });
        }
        if self.contains(&name) {
            return Err(NeuronError::name_collision(name));
        }
        self.entries.push(StateDescriptor {
            name,
            init: init.into(),
        });
        Ok(())
    }

    /// Chainable form of [`NeuronState::insert`]
    pub fn with(mut self, name: impl Into<String>, init: impl Into<StateInit>) -> Result<Self> {
        self.insert(name, init)?;
        Ok(self)
    }

    /// Append every descriptor of `other`, with the same collision rule as `insert`
    pub fn merge(mut self, other: NeuronState) -> Result<Self> {
        for StateDescriptor { name, init } in other.entries {
            self.insert(name, init)?;
        }
        Ok(self)
    }

    /// Whether a descriptor with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&StateInit> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.init)
    }

    /// Names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &StateDescriptor> {
        self.entries.iter()
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no states are declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for NeuronState {
    type Item = StateDescriptor;
    type IntoIter = std::vec::IntoIter<StateDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Resolve one state init into a concrete `(n_neurons,)` array
pub fn normalize_state(
    name: &str,
    init: &StateInit,
    n_neurons: usize,
    dtype: Dtype,
    rng: &mut dyn RngCore,
) -> Result<Array1<f64>> {
    let mut array = match init {
        StateInit::Distribution(dist) => {
            let samples = dist.sample(n_neurons, rng);
            // A distribution that ignores the requested count is a shape bug too
            if samples.len() != n_neurons {
                return Err(NeuronError::StateShape {
                    name: name.to_string(),
                    shape: vec![samples.len()],
                    n_neurons,
                });
            }
            samples
        }
        StateInit::Array(raw) => broadcast_1d(raw, n_neurons).ok_or_else(|| {
            NeuronError::StateShape {
                name: name.to_string(),
                shape: raw.shape().to_vec(),
                n_neurons,
            }
        })?,
        StateInit::Unsupported { type_name } => {
            return Err(NeuronError::StateType {
                name: name.to_string(),
                type_name: type_name.to_string(),
            })
        }
    };

    if dtype != Dtype::F64 {
        array.mapv_inplace(|v| dtype.round(v));
    }
    Ok(array)
}

/// Apply the 0-D-or-1-D-of-length-N rule, returning `None` on violation
pub(crate) fn broadcast_1d(raw: &ArrayD<f64>, n_neurons: usize) -> Option<Array1<f64>> {
    match raw.ndim() {
        0 => raw.iter().next().map(|v| Array1::from_elem(n_neurons, *v)),
        1 if raw.len() == n_neurons => Some(raw.iter().copied().collect()),
        _ => None,
    }
}
