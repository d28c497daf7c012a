//! Registry of configured answer engines.
//!
//! Fan-out order is registration order, so results and degraded markers
//! are attributed consistently across runs.

use std::sync::Arc;

use tracing::info;

use aevis_core::{defaults, EngineAdapter, EngineId};

use crate::simulation::SimulationAdapter;

/// Ordered collection of engine adapters used for a check run.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    adapters: Vec<Arc<dyn EngineAdapter>>,
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the default simulated engine trio.
    pub fn with_default_engines() -> Self {
        let mut registry = Self::new();
        for engine in defaults::DEFAULT_ENGINES {
            registry.register(Arc::new(SimulationAdapter::new(engine)));
        }
        registry
    }

    /// Build from the `AEVIS_ENGINES` environment variable (comma-separated
    /// engine names, simulated). Falls back to the default trio.
    pub fn from_env() -> Self {
        match std::env::var("AEVIS_ENGINES") {
            Ok(list) => {
                let mut registry = Self::new();
                for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    registry.register(Arc::new(SimulationAdapter::new(name)));
                }
                if registry.is_empty() {
                    Self::with_default_engines()
                } else {
                    registry
                }
            }
            Err(_) => Self::with_default_engines(),
        }
    }

    /// Register an adapter at the end of the fan-out order.
    pub fn register(&mut self, adapter: Arc<dyn EngineAdapter>) {
        info!(engine = %adapter.engine(), "Registered engine adapter");
        self.adapters.push(adapter);
    }

    /// Adapters in registration order.
    pub fn adapters(&self) -> &[Arc<dyn EngineAdapter>] {
        &self.adapters
    }

    /// Engine ids in registration order.
    pub fn engine_ids(&self) -> Vec<EngineId> {
        self.adapters.iter().map(|a| a.engine().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
