//! Shared application state for request handlers.

use std::sync::Arc;
use tera::Tera;

use crate::config::{AppConfig, BuildInfo};
use crate::runtime::RuntimeConnector;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the configuration and build metadata captured at startup, the Tera
/// template engine, and the connector used to open a daemon connection per
/// request. Nothing in here is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub build: Arc<BuildInfo>,
    pub tera: Arc<Tera>,
    pub runtime: Arc<dyn RuntimeConnector>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        build: BuildInfo,
        tera: Tera,
        runtime: Arc<dyn RuntimeConnector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            build: Arc::new(build),
            tera: Arc::new(tera),
            runtime,
        }
    }
}
