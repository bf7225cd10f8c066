//! Named signals and the per-population namespace they are allocated in

use crate::error::*;
use ndarray::Array1;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to one allocated per-neuron array
///
/// Clones refer to the same storage; [`Signal::ptr_eq`] tests identity.
#[derive(Clone)]
pub struct Signal {
    name: Arc<str>,
    data: Arc<RwLock<Array1<f64>>>,
}

impl Signal {
    /// Wrap an array under a name
    pub fn new(name: impl Into<Arc<str>>, data: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Zero-filled signal of length `n`
    pub fn zeros(name: impl Into<Arc<str>>, n: usize) -> Self {
        Self::new(name, Array1::zeros(n))
    }

    /// Signal name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the signal holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, Array1<f64>> {
        self.data.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, Array1<f64>> {
        self.data.write()
    }

    /// Copy the current values out
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.read().to_vec()
    }

    /// Whether both handles refer to the same storage
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

/// Collision-checked name -> signal mapping scoped to one population build
#[derive(Debug, Default, Clone)]
pub struct SignalNamespace {
    signals: HashMap<String, Signal>,
}

impl SignalNamespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `array` under `name`
    ///
    /// An existing name is never overwritten; the returned handle is the
    /// canonical location other operators reference.
    pub fn allocate(&mut self, name: &str, array: Array1<f64>) -> Result<Signal> {
        if self.signals.contains_key(name) {
            return Err(NeuronError::name_collision(name));
        }
        let signal = Signal::new(name, array);
        log::trace!("Allocated signal `{}` ({} elements)", name, signal.len());
        self.signals.insert(name.to_string(), signal.clone());
        Ok(signal)
    }

    /// Register a signal created elsewhere, with the same collision rule
    pub fn insert(&mut self, signal: Signal) -> Result<()> {
        if self.signals.contains_key(signal.name()) {
            return Err(NeuronError::name_collision(signal.name()));
        }
        self.signals.insert(signal.name().to_string(), signal);
        Ok(())
    }

    /// Look up a signal
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// Whether a name is taken
    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    /// Names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.signals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the namespace is empty
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
