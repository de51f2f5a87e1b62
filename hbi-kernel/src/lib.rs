pub mod config;
pub mod health;
pub mod http;

use tracing_subscriber::EnvFilter;

/// Installe le subscriber fmt ; RUST_LOG prime sur le filtre de la config.
/// Sans effet si un subscriber global existe déjà.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}
