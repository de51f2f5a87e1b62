/**
 * HBI KERNEL - Point d'entrée du serveur d'inventaire d'hôtes
 *
 * RÔLE : charge la config (.env, hbi.yaml, PORT), installe le tracing puis
 * expose l'API REST au-dessus d'un seul Inventory partagé.
 */

use hbi_core::Inventory;
use hbi_kernel::config::{load_config, ConfigSource};
use hbi_kernel::http::{build_router, AppState};
use hbi_kernel::init_tracing;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    let loaded = load_config().await;
    init_tracing(&loaded.config.log_filter);
    match &loaded.source {
        ConfigSource::File(path) => info!(path = %path.display(), "config loaded"),
        ConfigSource::Defaults { reason } => warn!("{reason}"),
    }
    if let Some(warning) = &loaded.port_warning {
        warn!("{warning}");
    }

    let app = build_router(AppState::new(Inventory::new()));

    let addr = loaded.config.socket_addr()?;
    info!(%addr, "listening on http://{addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
