/*!
# HBI Core - Résolution d'identité d'hôtes et requêtes multi-critères

Moteur en mémoire, sans I/O :
- `Index` : lookup inverse id / canonical fact / compte / fact-tag -> hôte(s)
- `Service` : create_or_update (match puis fusion, sinon création) et get (AND de filtres)
- `Inventory` : Service partagé derrière un Mutex, consommé par les transports
*/

pub mod error;
pub mod index;
pub mod models;
pub mod service;

pub use error::{HbiError, Result};
pub use index::Index;
pub use models::{decode_filters, decode_hosts, Filter, Host, HostId, Namespaced};
pub use service::{new_state, HostInventory, Inventory, Service, Shared};
