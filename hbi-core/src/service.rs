/**
 * SERVICE HBI - Politique de résolution d'identité et algèbre des filtres
 *
 * RÔLE : create_or_update (match -> fusion, sinon création avec un id neuf)
 * et get (AND entre filtres, OR à l'intérieur d'un filtre) au-dessus d'un Index.
 *
 * CONCURRENCE : le Service n'est pas synchronisé. Les transports passent par
 * `Inventory`, qui sérialise chaque appel derrière un seul Mutex.
 */

use crate::error::{HbiError, Result};
use crate::index::Index;
use crate::models::{Filter, Host, HostId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Capacité exposée à tout adaptateur de transport (REST, gRPC...)
pub trait HostInventory: Send + Sync {
    fn create_or_update(&self, hosts: Vec<Host>) -> Result<Vec<Host>>;
    fn get(&self, filters: &[Filter]) -> Vec<Host>;
}

#[derive(Debug, Default)]
pub struct Service {
    index: Index,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repart d'un index vide (isolation des tests)
    pub fn reset(&mut self) {
        self.index = Index::new();
        info!("index reset");
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Résout chaque hôte contre l'index, dans l'ordre du lot.
    ///
    /// Tout le lot est validé avant la première écriture : un `InvalidHost`
    /// laisse l'index intact. Dans un lot, l'élément k voit les effets des
    /// éléments précédents.
    pub fn create_or_update(&mut self, hosts: Vec<Host>) -> Result<Vec<Host>> {
        if let Some(position) = hosts.iter().position(|h| !h.has_identity()) {
            return Err(HbiError::InvalidHost(format!(
                "host #{position} must provide at least one canonical fact or the ID"
            )));
        }

        let mut ret = Vec::with_capacity(hosts.len());
        for host in hosts {
            let existing = self.index.get(&host).and_then(|h| h.id.clone());
            let stored = match existing {
                Some(id) => {
                    debug!(host_id = %id, "matched existing host, merging");
                    self.index.merge(&id, host)?
                }
                None => {
                    let mut host = host;
                    let id = new_host_id();
                    info!(host_id = %id, display_name = ?host.display_name, "creating host");
                    host.id = Some(id);
                    self.index.add(host)?
                }
            };
            ret.push(stored.clone());
        }
        Ok(ret)
    }

    /// Sans filtre : tous les hôtes. Sinon intersection des filtres, de gauche
    /// à droite, avec arrêt dès que le résultat est vide. Ordre non spécifié.
    pub fn get(&self, filters: &[Filter]) -> Vec<Host> {
        if filters.is_empty() {
            return self.index.hosts().cloned().collect();
        }

        let mut restriction: Option<HashSet<HostId>> = None;
        for filter in filters {
            let matched: HashSet<HostId> = self
                .index
                .apply_filter(filter, restriction.as_ref())
                .filter_map(|h| h.id.clone())
                .collect();
            if matched.is_empty() {
                return Vec::new();
            }
            restriction = Some(matched);
        }

        restriction
            .into_iter()
            .flatten()
            .filter_map(|id| self.index.host(&id).cloned())
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Result<Host> {
        self.index
            .host(id)
            .cloned()
            .ok_or_else(|| HbiError::NotFound(id.to_string()))
    }
}

/// Identifiant hexadécimal de 32 caractères (UUID v4, forme simple)
fn new_host_id() -> HostId {
    Uuid::new_v4().simple().to_string()
}

/// Service partagé entre requêtes concurrentes : un appel à la fois
#[derive(Clone, Default)]
pub struct Inventory {
    service: Shared<Service>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            service: new_state(Service::new()),
        }
    }

    pub fn get_by_id(&self, id: &str) -> Result<Host> {
        self.service.lock().get_by_id(id)
    }

    pub fn reset(&self) {
        self.service.lock().reset();
    }

    pub fn len(&self) -> usize {
        self.service.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.service.lock().is_empty()
    }
}

impl HostInventory for Inventory {
    fn create_or_update(&self, hosts: Vec<Host>) -> Result<Vec<Host>> {
        self.service.lock().create_or_update(hosts)
    }

    fn get(&self, filters: &[Filter]) -> Vec<Host> {
        self.service.lock().get(filters)
    }
}
