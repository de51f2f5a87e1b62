use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub listen: ListenConf,
    /// Filtre tracing utilisé si RUST_LOG est absent (ex: "info,hbi_core=debug")
    pub log_filter: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ListenConf {
    pub host: String,
    pub port: u16,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            listen: ListenConf::default(),
            log_filter: "info".into(),
        }
    }
}

impl Default for ListenConf {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8080 }
    }
}

impl KernelConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let raw = format!("{}:{}", self.listen.host, self.listen.port);
        raw.parse().with_context(|| format!("invalid listen address {raw}"))
    }

    /// PORT (variable d'environnement) prend le pas sur listen.port
    fn apply_port_override(&mut self, port: Option<String>) -> Option<String> {
        let raw = port?;
        match raw.trim().parse::<u16>() {
            Ok(port) => {
                self.listen.port = port;
                None
            }
            Err(e) => Some(format!("ignoring PORT={raw}: {e}")),
        }
    }
}

/// D'où vient la config chargée, pour le log de démarrage
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults { reason: String },
}

/// Résultat du chargement ; le tracing n'est pas encore installé à ce stade,
/// les remarques sont loggées par l'appelant.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: KernelConfig,
    pub source: ConfigSource,
    pub port_warning: Option<String>,
}

/// Config du kernel : fichier HBI_KERNEL_CONFIG (défaut hbi.yaml) puis PORT
pub async fn load_config() -> LoadedConfig {
    let path = std::env::var("HBI_KERNEL_CONFIG").unwrap_or_else(|_| "hbi.yaml".into());
    let (mut config, source) = load_config_from(Path::new(&path)).await;
    let port_warning = config.apply_port_override(std::env::var("PORT").ok());
    LoadedConfig { config, source, port_warning }
}

pub async fn load_config_from(path: &Path) -> (KernelConfig, ConfigSource) {
    if !path.exists() {
        let reason = format!("no {}, using default config", path.display());
        return (KernelConfig::default(), ConfigSource::Defaults { reason });
    }

    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) => {
            let reason = format!("cannot read {}: {e}", path.display());
            return (KernelConfig::default(), ConfigSource::Defaults { reason });
        }
    };
    if txt.trim().is_empty() {
        let reason = format!("{} is empty, using default config", path.display());
        return (KernelConfig::default(), ConfigSource::Defaults { reason });
    }

    match serde_yaml::from_str(&txt) {
        Ok(cfg) => (cfg, ConfigSource::File(path.to_path_buf())),
        Err(e) => {
            let reason = format!("invalid config {}: {e}", path.display());
            (KernelConfig::default(), ConfigSource::Defaults { reason })
        }
    }
}
