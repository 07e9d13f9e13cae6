pub mod analysis;
pub mod config;
pub mod errors;
pub mod overlay;
pub mod report;
pub mod session;
pub mod upload;

/// Install the tracing subscriber. RUST_LOG overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();
}

/// Load config.toml, falling back to built-in defaults (mock provider only)
/// so the engine comes up even without a config file.
pub fn load_config_or_default() -> config::AppConfig {
    match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config; using built-in defaults");
            config::AppConfig::default()
        }
    }
}
