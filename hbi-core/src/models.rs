/**
 * MODÈLE HBI - Hôtes, filtres et faits à deux niveaux
 *
 * RÔLE : Types manipulés par l'index et le service, et leur forme JSON
 * (HostRecord / FilterRecord) telle que reçue par les transports.
 *
 * FUSION : canonical facts clé par clé (last-write-wins), facts/tags
 * namespace par namespace (remplacement complet du namespace reçu).
 */

use crate::error::{HbiError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type HostId = String;

/// Map ordonnée namespace -> (clé -> valeur), utilisée pour facts et tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaced(BTreeMap<String, BTreeMap<String, String>>);

impl Namespaced {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: &str) {
        self.0
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.0.get(namespace)?.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    /// Itère les triplets (namespace, clé, valeur) dans l'ordre des maps
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.0.iter().flat_map(|(ns, entries)| {
            entries
                .iter()
                .map(move |(k, v)| (ns.as_str(), k.as_str(), v.as_str()))
        })
    }

    /// Chaque namespace présent dans `other` remplace entièrement l'ancien ;
    /// les namespaces absents de `other` ne bougent pas.
    pub fn merge_from(&mut self, other: Namespaced) {
        for (namespace, entries) in other.0 {
            self.0.insert(namespace, entries);
        }
    }
}

impl<const N: usize> From<[(&str, &str, &str); N]> for Namespaced {
    fn from(triples: [(&str, &str, &str); N]) -> Self {
        let mut map = Namespaced::new();
        for (ns, k, v) in triples {
            map.insert(ns, k, v);
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    /// Attribué par le système à la création, jamais fourni par le client
    pub id: Option<HostId>,
    pub account_number: Option<String>,
    pub display_name: Option<String>,
    /// Ordre d'envoi du client conservé : il décide du premier match
    pub canonical_facts: IndexMap<String, String>,
    pub facts: Namespaced,
    pub tags: Namespaced,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_account(mut self, account_number: &str) -> Self {
        self.account_number = Some(account_number.to_string());
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn with_canonical_fact(mut self, key: &str, value: &str) -> Self {
        self.canonical_facts.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_fact(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.facts.insert(namespace, key, value);
        self
    }

    pub fn with_tag(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.tags.insert(namespace, key, value);
        self
    }

    /// Id fourni par l'appelant ; une chaîne vide compte comme absente
    pub fn given_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Vrai si l'hôte peut être créé ou retrouvé (id ou au moins un canonical fact)
    pub fn has_identity(&self) -> bool {
        self.given_id().is_some() || !self.canonical_facts.is_empty()
    }

    /// Replie `incoming` sur cet hôte. L'id ne change jamais ; display_name et
    /// account_number ne sont écrasés que si `incoming` en porte un.
    pub fn merge(&mut self, incoming: Host) {
        self.canonical_facts.extend(incoming.canonical_facts);
        self.facts.merge_from(incoming.facts);
        self.tags.merge_from(incoming.tags);
        if let Some(display_name) = incoming.display_name {
            self.display_name = Some(display_name);
        }
        if let Some(account_number) = incoming.account_number {
            self.account_number = Some(account_number);
        }
    }
}

/// Prédicat de requête : OR entre ses champs, AND entre plusieurs filtres
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Filter {
    pub ids: Vec<HostId>,
    pub account_numbers: Vec<String>,
    pub canonical_facts: IndexMap<String, String>,
    pub facts: Namespaced,
    pub tags: Namespaced,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.ids.push(id.to_string());
        self
    }

    pub fn with_account(mut self, account_number: &str) -> Self {
        self.account_numbers.push(account_number.to_string());
        self
    }

    pub fn with_canonical_fact(mut self, key: &str, value: &str) -> Self {
        self.canonical_facts.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_fact(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.facts.insert(namespace, key, value);
        self
    }

    pub fn with_tag(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.tags.insert(namespace, key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.account_numbers.is_empty()
            && self.canonical_facts.is_empty()
            && self.facts.is_empty()
            && self.tags.is_empty()
    }
}

/// Décode une liste de HostRecord reçue d'un transport
pub fn decode_hosts(value: serde_json::Value) -> Result<Vec<Host>> {
    serde_json::from_value(value)
        .map_err(|e| HbiError::InvalidHost(format!("Expected a list of host records: {e}")))
}

/// Décode une liste de FilterRecord ; `null` vaut "aucun filtre"
pub fn decode_filters(value: serde_json::Value) -> Result<Vec<Filter>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
        .map_err(|e| HbiError::InvalidQuery(format!("Query must be a list of Filter objects: {e}")))
}
