/**
 * INDEX INVERSE - Résolution d'un attribut d'identité vers l'hôte qui le porte
 *
 * STRUCTURE :
 * - hosts      : id -> Host (copie canonique, modifiée en place à la fusion)
 * - canonical  : (clé, valeur) -> id, un seul hôte par paire
 * - facts      : (namespace, clé, valeur) -> {id}, alimenté par facts ET tags
 * - accounts   : account_number -> {id}
 * - all_hosts  : univers des requêtes sans restriction
 *
 * Après une fusion, l'hôte est entièrement ré-indexé (paires canoniques,
 * triplets facts/tags, compte) : les filtres ne voient jamais d'attributs périmés.
 */

use crate::error::{HbiError, Result};
use crate::models::{Filter, Host, HostId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

type Pair = (String, String);
type Triple = (String, String, String);

#[derive(Debug, Default)]
pub struct Index {
    hosts: HashMap<HostId, Host>,
    canonical: HashMap<Pair, HostId>,
    facts: HashMap<Triple, HashSet<HostId>>,
    accounts: HashMap<String, HashSet<HostId>>,
    all_hosts: HashSet<HostId>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.all_hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_hosts.is_empty()
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> + '_ {
        self.all_hosts.iter().filter_map(move |id| self.hosts.get(id))
    }

    /// Enregistre un nouvel hôte sous toutes ses clés.
    ///
    /// Une paire canonique déjà prise est écrasée : l'appelant n'ajoute
    /// qu'après un `get` sans résultat.
    pub fn add(&mut self, host: Host) -> Result<&Host> {
        let id = host
            .given_id()
            .map(str::to_string)
            .ok_or_else(|| HbiError::InvalidHost("Index only stores hosts carrying an id".into()))?;

        self.register(&id, &host);
        self.all_hosts.insert(id.clone());
        self.hosts.insert(id.clone(), host);
        Ok(&self.hosts[&id])
    }

    /// Cherche l'hôte déjà indexé que `probe` décrit.
    ///
    /// Avec un id : lookup direct, un miss n'est pas une erreur. Sans id : le
    /// premier canonical fact (ordre d'envoi du client) qui pointe vers un hôte gagne.
    pub fn get(&self, probe: &Host) -> Option<&Host> {
        if let Some(id) = probe.given_id() {
            return self.hosts.get(id);
        }

        let mut found: Option<&HostId> = None;
        for (key, value) in &probe.canonical_facts {
            let Some(owner) = self.canonical.get(&(key.clone(), value.clone())) else {
                continue;
            };
            match found {
                None => found = Some(owner),
                Some(first) if first != owner => {
                    warn!(
                        kept = %first,
                        ignored = %owner,
                        key = %key,
                        "canonical facts resolve to several hosts, keeping the first match"
                    );
                }
                Some(_) => {}
            }
        }
        found.and_then(|id| self.hosts.get(id))
    }

    /// Évalue un filtre, éventuellement restreint à `candidates` (par défaut
    /// `all_hosts`). Les hôtes des account_numbers ne sont PAS restreints :
    /// un filtre par compte repart de l'univers complet. Peut produire des doublons.
    pub fn apply_filter<'a>(
        &'a self,
        filter: &'a Filter,
        candidates: Option<&'a HashSet<HostId>>,
    ) -> Box<dyn Iterator<Item = &'a Host> + 'a> {
        if candidates.is_some_and(HashSet::is_empty) {
            return Box::new(std::iter::empty());
        }

        let keep = move |id: &HostId| -> bool {
            match candidates {
                Some(restricted) => restricted.contains(id),
                None => self.all_hosts.contains(id),
            }
        };

        let by_account = filter
            .account_numbers
            .iter()
            .filter_map(move |account| self.accounts.get(account))
            .flatten();

        let by_id = filter.ids.iter().filter(move |id| keep(id));

        let by_canonical = filter
            .canonical_facts
            .iter()
            .filter_map(move |(k, v)| self.canonical.get(&(k.clone(), v.clone())))
            .filter(move |id| keep(id));

        let by_fact = filter
            .facts
            .triples()
            .chain(filter.tags.triples())
            .filter_map(move |(ns, k, v)| {
                self.facts.get(&(ns.to_string(), k.to_string(), v.to_string()))
            })
            .flatten()
            .filter(move |id| keep(id));

        Box::new(
            by_account
                .chain(by_id)
                .chain(by_canonical)
                .chain(by_fact)
                .filter_map(move |id| self.hosts.get(id)),
        )
    }

    /// Fusionne `incoming` dans l'hôte `id` obtenu par un `get` préalable,
    /// puis ré-indexe l'hôte fusionné.
    pub fn merge(&mut self, id: &str, incoming: Host) -> Result<&Host> {
        let mut host = self
            .hosts
            .remove(id)
            .ok_or_else(|| HbiError::NotFound(id.to_string()))?;

        self.unregister(id, &host);
        host.merge(incoming);
        self.register(id, &host);
        debug!(host_id = %id, "host re-indexed after merge");

        self.hosts.insert(id.to_string(), host);
        Ok(&self.hosts[id])
    }

    fn register(&mut self, id: &str, host: &Host) {
        for (key, value) in &host.canonical_facts {
            if let Some(previous) = self.canonical.insert((key.clone(), value.clone()), id.to_string()) {
                if previous != id {
                    warn!(
                        host_id = %id,
                        previous = %previous,
                        key = %key,
                        "canonical fact reassigned to another host"
                    );
                }
            }
        }

        if let Some(account) = &host.account_number {
            self.accounts
                .entry(account.clone())
                .or_default()
                .insert(id.to_string());
        }

        for (ns, k, v) in host.facts.triples().chain(host.tags.triples()) {
            self.facts
                .entry((ns.to_string(), k.to_string(), v.to_string()))
                .or_default()
                .insert(id.to_string());
        }
    }

    fn unregister(&mut self, id: &str, host: &Host) {
        for (key, value) in &host.canonical_facts {
            let pair = (key.clone(), value.clone());
            if self.canonical.get(&pair).is_some_and(|owner| owner == id) {
                self.canonical.remove(&pair);
            }
        }

        if let Some(account) = &host.account_number {
            if let Some(members) = self.accounts.get_mut(account) {
                members.remove(id);
                if members.is_empty() {
                    self.accounts.remove(account);
                }
            }
        }

        for (ns, k, v) in host.facts.triples().chain(host.tags.triples()) {
            let triple = (ns.to_string(), k.to_string(), v.to_string());
            if let Some(members) = self.facts.get_mut(&triple) {
                members.remove(id);
                if members.is_empty() {
                    self.facts.remove(&triple);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(hosts: impl Iterator<Item = &'a Host>) -> HashSet<String> {
        hosts.filter_map(|h| h.id.clone()).collect()
    }

    fn seeded() -> Index {
        let mut index = Index::new();
        index
            .add(
                Host::new()
                    .with_id("a")
                    .with_account("1234567")
                    .with_canonical_fact("insights_id", "1111")
                    .with_fact("advisor", "role", "host"),
            )
            .unwrap();
        index
            .add(
                Host::new()
                    .with_id("b")
                    .with_account("1122334")
                    .with_canonical_fact("hostname", "b.example.com")
                    .with_tag("web", "env", "prod"),
            )
            .unwrap();
        index
    }

    #[test]
    fn test_add_requires_id() {
        let mut index = Index::new();
        let err = index.add(Host::new().with_canonical_fact("hostname", "h")).unwrap_err();
        assert!(matches!(err, HbiError::InvalidHost(_)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_get_by_id_and_canonical_fact() {
        let index = seeded();

        assert_eq!(index.get(&Host::new().with_id("b")).unwrap().id.as_deref(), Some("b"));
        assert!(index.get(&Host::new().with_id("missing")).is_none());

        let probe = Host::new()
            .with_canonical_fact("bios_uuid", "nope")
            .with_canonical_fact("insights_id", "1111");
        assert_eq!(index.get(&probe).unwrap().id.as_deref(), Some("a"));

        assert!(index.get(&Host::new().with_canonical_fact("insights_id", "2222")).is_none());
    }

    #[test]
    fn test_get_keeps_first_match_in_client_order() {
        let index = seeded();
        let probe = Host::new()
            .with_canonical_fact("insights_id", "1111")
            .with_canonical_fact("hostname", "b.example.com");
        assert_eq!(index.get(&probe).unwrap().id.as_deref(), Some("a"));

        let probe = Host::new()
            .with_canonical_fact("hostname", "b.example.com")
            .with_canonical_fact("insights_id", "1111");
        assert_eq!(index.get(&probe).unwrap().id.as_deref(), Some("b"));
    }

    #[test]
    fn test_apply_filter_unions_fields() {
        let index = seeded();
        let filter = Filter::new()
            .with_fact("advisor", "role", "host")
            .with_tag("web", "env", "prod");
        assert_eq!(ids(index.apply_filter(&filter, None)), HashSet::from(["a".into(), "b".into()]));

        let filter = Filter::new().with_id("a").with_id("unknown");
        assert_eq!(ids(index.apply_filter(&filter, None)), HashSet::from(["a".into()]));
    }

    #[test]
    fn test_apply_filter_restriction() {
        let index = seeded();
        let only_b = HashSet::from(["b".to_string()]);

        let filter = Filter::new().with_canonical_fact("insights_id", "1111");
        assert_eq!(index.apply_filter(&filter, Some(&only_b)).count(), 0);

        // les comptes ne sont pas restreints par les candidats
        let filter = Filter::new().with_account("1234567");
        assert_eq!(ids(index.apply_filter(&filter, Some(&only_b))), HashSet::from(["a".into()]));

        let empty = HashSet::new();
        assert_eq!(index.apply_filter(&filter, Some(&empty)).count(), 0);
    }

    #[test]
    fn test_merge_reindexes_everything() {
        let mut index = seeded();
        let merged = index
            .merge(
                "a",
                Host::new()
                    .with_account("1122334")
                    .with_canonical_fact("insights_id", "9999")
                    .with_fact("advisor", "role", "manager"),
            )
            .unwrap();
        assert_eq!(merged.canonical_facts["insights_id"], "9999");

        assert!(index.get(&Host::new().with_canonical_fact("insights_id", "1111")).is_none());
        assert_eq!(
            index.get(&Host::new().with_canonical_fact("insights_id", "9999")).unwrap().id.as_deref(),
            Some("a")
        );

        let old_role = Filter::new().with_fact("advisor", "role", "host");
        assert_eq!(index.apply_filter(&old_role, None).count(), 0);
        let new_role = Filter::new().with_fact("advisor", "role", "manager");
        assert_eq!(ids(index.apply_filter(&new_role, None)), HashSet::from(["a".into()]));

        let old_account = Filter::new().with_account("1234567");
        assert_eq!(index.apply_filter(&old_account, None).count(), 0);
        let new_account = Filter::new().with_account("1122334");
        assert_eq!(index.apply_filter(&new_account, None).count(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_merge_leaves_pairs_owned_by_other_hosts() {
        let mut index = seeded();
        // a revendique le hostname de b, puis b change de hostname : la paire reste à a
        index
            .merge("a", Host::new().with_canonical_fact("hostname", "b.example.com"))
            .unwrap();
        index
            .merge("b", Host::new().with_canonical_fact("hostname", "b2.example.com"))
            .unwrap();

        let probe = Host::new().with_canonical_fact("hostname", "b.example.com");
        assert_eq!(index.get(&probe).unwrap().id.as_deref(), Some("a"));
        let probe = Host::new().with_canonical_fact("hostname", "b2.example.com");
        assert_eq!(index.get(&probe).unwrap().id.as_deref(), Some("b"));
    }

    #[test]
    fn test_merge_unknown_id() {
        let mut index = seeded();
        assert_eq!(
            index.merge("zzz", Host::new()).unwrap_err(),
            HbiError::NotFound("zzz".into())
        );
    }
}
