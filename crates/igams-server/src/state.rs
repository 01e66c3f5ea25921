use igams_core::advisory::{bridge_from_config, AdvisoryBridge};
use igams_core::config::Config;
use igams_core::store::LogStore;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub config: Arc<Config>,
    pub bridge: Arc<dyn AdvisoryBridge>,
}

impl AppState {
    /// Build state with the advisory bridge selected from `config.advisory`.
    pub fn new(store: Arc<dyn LogStore>, config: Config) -> Self {
        let bridge: Arc<dyn AdvisoryBridge> = Arc::from(bridge_from_config(&config.advisory));
        Self::with_bridge(store, config, bridge)
    }

    pub fn with_bridge(
        store: Arc<dyn LogStore>,
        config: Config,
        bridge: Arc<dyn AdvisoryBridge>,
    ) -> Self {
        Self {
            store,
            config: Arc::new(config),
            bridge,
        }
    }
}
