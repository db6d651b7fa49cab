//! Connector-driven choice of signing strategy.

use std::sync::Arc;

use crate::config::SigningConfig;
use crate::signing::validator::RestrictionHeuristic;
use crate::signing::{
    Connector, RegularSigningStrategy, SafeWalletSigningStrategy, SigningStrategy,
};

/// Picks the first strategy that accepts the connector. The regular
/// strategy is always last and accepts everything.
pub struct StrategySelector {
    strategies: Vec<Arc<dyn SigningStrategy>>,
    fallback: Arc<dyn SigningStrategy>,
}

impl StrategySelector {
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            strategies: vec![Arc::new(SafeWalletSigningStrategy::new(config.clone()))],
            fallback: Arc::new(RegularSigningStrategy::new(config.clone())),
        }
    }

    /// Same as [`StrategySelector::new`] with a custom restricted-wallet
    /// predicate for the regular strategy.
    pub fn with_heuristic(config: &SigningConfig, restriction: RestrictionHeuristic) -> Self {
        Self {
            strategies: vec![Arc::new(SafeWalletSigningStrategy::new(config.clone()))],
            fallback: Arc::new(RegularSigningStrategy::with_heuristic(
                config.clone(),
                restriction,
            )),
        }
    }

    /// Register an additional strategy ahead of the built-in ones.
    pub fn prepend(mut self, strategy: Arc<dyn SigningStrategy>) -> Self {
        self.strategies.insert(0, strategy);
        self
    }

    pub fn select(&self, connector: Option<&Connector>) -> Arc<dyn SigningStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.can_handle(connector))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
