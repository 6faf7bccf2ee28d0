//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check registry and classifier properties over generated
//! inputs.

use proptest::prelude::*;
use url::Url;

use crate::cache::{CacheRegistry, PartitionNames, RequestKey};
use crate::classify::{Classifier, RequestCategory, HEALTHCARE_DATA_PATTERNS};
use crate::config::Role;
use crate::fetch::Response;
use crate::manifest::Manifest;

const SUFFIXES: &[&str] = &[".js", ".html", ".css", ".json", "", "/list"];

// == Strategies ==
fn path_strategy() -> impl Strategy<Value = String> {
    "(/[a-zA-Z0-9_-]{1,16}){1,4}(\\.[a-z]{1,4})?".prop_map(|s| s)
}

fn version_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,3}".prop_map(|s| s)
}

fn url_for(path: &str) -> Url {
    Url::parse("http://localhost:3000").unwrap().join(path).unwrap()
}

/// A partition name that may or may not belong to the admin worker.
#[derive(Debug, Clone)]
enum PartitionName {
    AdminShell(String),
    AdminData(String),
    UsersShell(String),
    Foreign(String),
}

impl PartitionName {
    fn render(&self) -> String {
        match self {
            PartitionName::AdminShell(v) => format!("thynktech-admin-cache-v{}", v),
            PartitionName::AdminData(v) => format!("thynktech-admin-data-v{}", v),
            PartitionName::UsersShell(v) => format!("thynktech-users-cache-v{}", v),
            PartitionName::Foreign(name) => name.clone(),
        }
    }
}

fn partition_name_strategy() -> impl Strategy<Value = PartitionName> {
    prop_oneof![
        version_strategy().prop_map(PartitionName::AdminShell),
        version_strategy().prop_map(PartitionName::AdminData),
        version_strategy().prop_map(PartitionName::UsersShell),
        "[a-z]{1,10}-cache".prop_map(PartitionName::Foreign),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every path gets exactly one category, and the same one every time.
    #[test]
    fn prop_classification_is_deterministic(path in path_strategy()) {
        let classifier = Classifier::with_default_patterns(Manifest::for_role(Role::Admin));
        let first = classifier.classify(&path);
        prop_assert_eq!(first, classifier.classify(&path));
    }

    // A healthcare keyword anywhere in the path wins over shell suffixes.
    #[test]
    fn prop_healthcare_keywords_take_precedence(
        prefix in "[a-z]{0,6}",
        keyword in prop::sample::select(HEALTHCARE_DATA_PATTERNS),
        suffix in prop::sample::select(SUFFIXES),
    ) {
        let classifier = Classifier::with_default_patterns(Manifest::for_role(Role::Admin));
        let path = format!("/{}{}{}", prefix, keyword, suffix);
        prop_assert_eq!(classifier.classify(&path), RequestCategory::HealthcareData);
    }

    // Activation deletes exactly the stale partitions this worker owns.
    #[test]
    fn prop_delete_all_except_only_touches_owned_prefixes(
        existing in prop::collection::vec(partition_name_strategy(), 0..12),
        current_version in version_strategy(),
    ) {
        let names = PartitionNames::new("thynktech", Role::Admin, &current_version);
        let mut registry = CacheRegistry::new();
        for name in &existing {
            registry.open(&name.render());
        }
        registry.open(&names.shell);
        registry.open(&names.data);

        let deleted = registry.delete_all_except(&names.prefixes(), &names.current());

        for name in &existing {
            let rendered = name.render();
            let owned = matches!(name, PartitionName::AdminShell(_) | PartitionName::AdminData(_));
            let current = rendered == names.shell || rendered == names.data;
            prop_assert_eq!(registry.has(&rendered), !owned || current);
            prop_assert_eq!(deleted.contains(&rendered), owned && !current);
        }
        prop_assert!(registry.has(&names.shell));
        prop_assert!(registry.has(&names.data));
    }

    // The last write for a key is the one served.
    #[test]
    fn prop_last_write_wins(
        path in path_strategy(),
        bodies in prop::collection::vec("[a-z0-9]{1,12}", 1..8),
    ) {
        let url = url_for(&path);
        let mut registry = CacheRegistry::new();
        for body in &bodies {
            registry.put("data", RequestKey::get(&url), &Response::ok(body.clone()));
        }

        let served = registry.match_url("data", &url).unwrap();
        prop_assert_eq!(served.text(), bodies.last().unwrap().clone());
        prop_assert_eq!(registry.len("data"), 1);
        prop_assert_eq!(registry.stats().stores, bodies.len() as u64);
    }

    // Every lookup counts as exactly one hit or miss.
    #[test]
    fn prop_lookups_are_counted(
        stored in prop::collection::hash_set(path_strategy(), 0..6),
        lookups in prop::collection::vec(path_strategy(), 0..20),
    ) {
        let mut registry = CacheRegistry::new();
        for path in &stored {
            registry.put("shell", RequestKey::get(&url_for(path)), &Response::ok("x"));
        }

        let mut expected_hits = 0;
        for path in &lookups {
            let url = url_for(path);
            let stored_key = stored.iter().any(|p| RequestKey::get(&url_for(p)) == RequestKey::get(&url));
            if stored_key {
                expected_hits += 1;
            }
            prop_assert_eq!(registry.match_url("shell", &url).is_some(), stored_key);
        }

        let stats = registry.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.hits + stats.misses, lookups.len() as u64);
    }
}
