use std::time::Duration;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::views::Views;

/// State shared by every route
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub views: Views,
}

impl AppState {
    /// Builds the backend client and compiles the page templates
    ///
    /// # Arguments
    /// * `config` - Runtime settings loaded from the environment
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The state, or the first
    ///   template or client error
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = BackendClient::new(&config.api_url, Duration::from_secs(config.backend_timeout_secs))?;
        let views = Views::new()?;

        Ok(AppState { config, backend, views })
    }
}
