//! Strategy registry for lookup and uniform iteration.

use crate::add::{AddStrategy, DynAddStrategy};
use std::sync::Arc;

/// Ordered collection of strategies.
///
/// Insertion order is execution order, and the first registered strategy is
/// the verification reference.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<DynAddStrategy>,
}

impl Clone for StrategyRegistry {
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
        }
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Registry with both host strategies, sequential first.
    pub fn with_host_strategies() -> Self {
        let mut registry = Self::new();
        registry.register(crate::add::SequentialAdd::new());
        registry.register(crate::add::ThreadedAdd::new());
        registry
    }

    pub fn register<S>(&mut self, strategy: S)
    where
        S: AddStrategy + 'static,
    {
        self.strategies.push(Arc::new(strategy));
    }

    pub fn strategies(&self) -> &[DynAddStrategy] {
        &self.strategies
    }

    pub fn find(&self, name: &str) -> Option<DynAddStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.name() == name)
            .map(Arc::clone)
    }
}
