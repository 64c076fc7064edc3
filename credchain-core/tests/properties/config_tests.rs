//! Property-based tests for the credentials file
//!
//! Saving then loading any document yields the same document, and every
//! save leaves the file readable by its owner only.

use credchain_core::config::{
    AccessTokenSection, ConfigDocument, ConfigFileStore, ServiceApiSection, SshKeySection,
};
use credchain_core::error::ConfigError;
use proptest::prelude::*;
use tempfile::TempDir;

// ========== Generators ==========

fn arb_field() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[a-zA-Z0-9 _./:@-]{0,24}".prop_map(Some),
    ]
}

fn arb_service_api() -> impl Strategy<Value = Option<ServiceApiSection>> {
    proptest::option::of((arb_field(), arb_field(), arb_field(), arb_field()).prop_map(
        |(api_user, api_password, ssh_user, ssh_gateway)| ServiceApiSection {
            api_user,
            api_password,
            ssh_user,
            ssh_gateway,
        },
    ))
}

fn arb_document() -> impl Strategy<Value = ConfigDocument> {
    (
        arb_service_api(),
        proptest::option::of(arb_field().prop_map(|token| AccessTokenSection { token })),
        proptest::option::of(
            arb_field().prop_map(|private_key_path| SshKeySection { private_key_path }),
        ),
    )
        .prop_map(|(service_api, access_token, ssh_key)| ConfigDocument {
            service_api,
            access_token,
            ssh_key,
        })
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn save_then_load_round_trips(document in arb_document()) {
        let dir = TempDir::new().unwrap();
        let store = ConfigFileStore::new(dir.path().join(".credchain").join("credentials.toml"));

        store.save(&document).unwrap();
        let loaded = store.load().unwrap();
        prop_assert_eq!(loaded, document);
    }

    #[test]
    fn overwrite_replaces_previous_document(first in arb_document(), second in arb_document()) {
        let dir = TempDir::new().unwrap();
        let store = ConfigFileStore::new(dir.path().join("credentials.toml"));

        store.save(&first).unwrap();
        store.save(&second).unwrap();
        prop_assert_eq!(store.load().unwrap(), second);
    }
}

#[cfg(unix)]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn saved_file_is_owner_only(document in arb_document(), initial_mode in 0o600u32..=0o777u32) {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(initial_mode)).unwrap();

        let store = ConfigFileStore::new(&path);
        store.save(&document).unwrap();
        prop_assert_eq!(store.permission_mode().unwrap(), Some(0o600));
    }
}

// ========== Failure categories ==========

#[test]
fn missing_and_malformed_are_distinguished() {
    let dir = TempDir::new().unwrap();
    let store = ConfigFileStore::new(dir.path().join("credentials.toml"));

    let missing = store.load().unwrap_err();
    assert!(matches!(missing, ConfigError::Missing(_)));
    assert!(missing.is_unusable());

    std::fs::write(store.path(), "[service_api\n").unwrap();
    let malformed = store.load().unwrap_err();
    assert!(matches!(malformed, ConfigError::Malformed { .. }));
    assert!(malformed.is_unusable());
}

#[test]
fn load_or_default_tolerates_absent_file() {
    let dir = TempDir::new().unwrap();
    let store = ConfigFileStore::new(dir.path().join("credentials.toml"));
    assert_eq!(store.load_or_default().unwrap(), ConfigDocument::default());
}

#[test]
fn empty_sections_are_omitted() {
    let dir = TempDir::new().unwrap();
    let store = ConfigFileStore::new(dir.path().join("credentials.toml"));
    let mut document = ConfigDocument::default();
    document.set_token("ghp_example");
    store.save(&document).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("[access_token]"));
    assert!(!text.contains("service_api"));
    assert!(!text.contains("ssh_key"));
}
