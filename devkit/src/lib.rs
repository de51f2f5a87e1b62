/*!
# HBI DevKit - Fixtures et harness de test

Bibliothèque facilitant les tests des transports HBI avec:
- Générateur de display names (couleur-adjectif-nom)
- Hôtes de démonstration prêts à indexer
- Harness autour d'un Inventory partagé
*/

pub mod test_utils;

pub use test_utils::{demo_host, names, TestHarness};
