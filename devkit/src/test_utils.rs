/*!
Test Harness pour transports HBI

Facilite l'écriture de tests avec:
- Un Inventory neuf par harness (aucun état partagé entre tests)
- Des jeux de données prêts (quatre hôtes rôles/comptes, N hôtes nommés)
- Des assertions sur la forme JSON des hôtes renvoyés
*/

use anyhow::Result;
use hbi_core::{decode_filters, decode_hosts, Host, HostInventory, Inventory};
use serde_json::Value;

const COLORS: [&str; 8] = ["white", "blue", "orange", "black", "yellow", "green", "red", "taupe"];
const ADJ: [&str; 10] = [
    "flippant", "dashing", "sullen", "starving", "ravishing",
    "sickly", "gaunt", "spry", "homely", "greasy",
];
const NOUNS: [&str; 7] = ["condor", "triangle", "notebook", "shovel", "hairbrush", "boots", "clarinet"];

/// Produit cartésien couleur × adjectif × nom, ex: "white-flippant-condor" (560 noms)
pub fn names() -> impl Iterator<Item = String> {
    COLORS.into_iter().flat_map(|color| {
        ADJ.into_iter().flat_map(move |adj| {
            NOUNS.into_iter().map(move |noun| format!("{color}-{adj}-{noun}"))
        })
    })
}

/// Hôte de démonstration identifié par son hostname `<name>.com`
pub fn demo_host(name: &str) -> Host {
    let hostname = format!("{name}.com");
    Host::new()
        .with_display_name(name)
        .with_canonical_fact("hostname", &hostname)
        .with_fact("demo", "hostname", &hostname)
}

/// Harness de test autour d'un Inventory
pub struct TestHarness {
    pub inventory: Inventory,
}

impl TestHarness {
    /// Crée un harness avec un index vide
    pub fn new() -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok(); // Init logging pour tests

        Self { inventory: Inventory::new() }
    }

    /// Quatre hôtes : comptes 1234567 / 1122334, rôles advisor.role host / manager.
    /// Ordre : (1234567, host), (1234567, manager), (1122334, host), (1122334, manager).
    pub fn seed_roles(&self) -> Vec<Host> {
        let hosts = [
            ("1234567", "host", "a.example.com"),
            ("1234567", "manager", "b.example.com"),
            ("1122334", "host", "c.example.com"),
            ("1122334", "manager", "d.example.com"),
        ]
        .into_iter()
        .map(|(account, role, hostname)| {
            Host::new()
                .with_account(account)
                .with_display_name(hostname)
                .with_canonical_fact("hostname", hostname)
                .with_fact("advisor", "role", role)
        })
        .collect();

        let created = self
            .inventory
            .create_or_update(hosts)
            .unwrap_or_else(|e| panic!("seeding role hosts failed: {e}"));
        tracing::info!(count = created.len(), "seeded role hosts");
        created
    }

    /// Crée `count` hôtes de démonstration nommés par `names()`
    pub fn seed_named(&self, count: usize) -> Vec<Host> {
        let hosts: Vec<Host> = names().take(count).map(|name| demo_host(&name)).collect();
        let created = self
            .inventory
            .create_or_update(hosts)
            .unwrap_or_else(|e| panic!("seeding named hosts failed: {e}"));
        tracing::info!(count = created.len(), "seeded named hosts");
        created
    }

    /// Soumet des HostRecord JSON comme le ferait un transport
    pub fn submit(&self, records: Value) -> Result<Vec<Host>> {
        let hosts = decode_hosts(records)?;
        Ok(self.inventory.create_or_update(hosts)?)
    }

    /// Exécute une requête à partir de FilterRecord JSON
    pub fn search(&self, records: Value) -> Result<Vec<Host>> {
        let filters = decode_filters(records)?;
        Ok(self.inventory.get(&filters))
    }

    /// Assert qu'un champ (chemin pointé, ex: "facts.advisor.role") a une valeur donnée
    pub fn assert_field_equals(&self, host: &Host, field_path: &str, expected: &Value) -> Result<()> {
        let json = serde_json::to_value(host)?;
        match get_nested_field(&json, field_path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Field '{}' mismatch: expected {:?}, got {:?}",
                field_path, expected, actual
            ),
            None => anyhow::bail!("Field '{}' not found on host {:?}", field_path, host.id),
        }
    }

    /// Reset l'index pour un nouveau test
    pub fn reset(&self) {
        self.inventory.reset();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Les clés de facts contiennent souvent des points ("cpu.count") : on essaie
/// d'abord le reste du chemin entier comme clé.
fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let Value::Object(obj) = value else { return None };
    if let Some(found) = obj.get(path) {
        return Some(found);
    }
    let (head, rest) = path.split_once('.')?;
    get_nested_field(obj.get(head)?, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names() {
        let all: Vec<String> = names().collect();
        assert_eq!(all.len(), 560);
        assert_eq!(all[0], "white-flippant-condor");
        assert_eq!(all[559], "taupe-greasy-clarinet");
    }

    #[test]
    fn test_seeded_named_hosts_resubmit_to_same_ids() {
        let harness = TestHarness::new();
        let first = harness.seed_named(20);
        let again = harness.seed_named(20);

        assert_eq!(harness.inventory.len(), 20);
        let first_ids: Vec<_> = first.iter().map(|h| h.id.clone()).collect();
        let again_ids: Vec<_> = again.iter().map(|h| h.id.clone()).collect();
        assert_eq!(first_ids, again_ids);
    }

    #[test]
    fn test_submit_search_and_assertions() {
        let harness = TestHarness::new();
        harness.seed_roles();

        let merged = harness
            .submit(json!([{
                "canonical_facts": {"hostname": "a.example.com"},
                "facts": {"advisor": {"role": "manager", "cpu.count": "4"}}
            }]))
            .unwrap();
        harness
            .assert_field_equals(&merged[0], "facts.advisor.cpu.count", &json!("4"))
            .unwrap();
        harness
            .assert_field_equals(&merged[0], "account_number", &json!("1234567"))
            .unwrap();
        assert!(harness
            .assert_field_equals(&merged[0], "facts.advisor.role", &json!("host"))
            .is_err());

        let managers = harness
            .search(json!([{"facts": {"advisor": {"role": "manager"}}}]))
            .unwrap();
        assert_eq!(managers.len(), 3);

        harness.reset();
        assert!(harness.search(Value::Null).unwrap().is_empty());
    }
}
