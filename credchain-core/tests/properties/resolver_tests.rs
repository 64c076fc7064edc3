//! Tests for the credential resolution chain
//!
//! Covers source precedence, the exact tried list on exhaustion, fall-through
//! on invalid or failing sources, and persistence fallbacks.

use std::sync::Arc;

use credchain_core::config::{ConfigDocument, ConfigFileStore};
use credchain_core::env::MapEnv;
use credchain_core::error::ResolveError;
use credchain_core::models::{
    AccessToken, AttemptOutcome, CredentialKind, CredentialSource, ServiceApiCredentials,
    ACCESS_TOKEN_ENV, API_PASSWORD_ENV, API_USER_ENV, DEFAULT_SSH_GATEWAY, SSH_GATEWAY_ENV,
    SSH_USER_ENV,
};
use credchain_core::paths::CredentialPaths;
use credchain_core::resolver::DEFAULT_ACCOUNT;
use credchain_core::secret::{MemoryStore, SecureStore, UnavailableStore};
use proptest::prelude::*;
use tempfile::TempDir;

use super::support::{
    default_key, resolver, resolver_with, write_key, CountingEnv, FlakyStore, SwitchableStore,
};

fn files(home: &TempDir) -> ConfigFileStore {
    ConfigFileStore::from_paths(&CredentialPaths::with_home(home.path()))
}

fn save_document(home: &TempDir, document: &ConfigDocument) {
    files(home).save(document).unwrap();
}

// ========== Precedence ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The first source holding a token wins, whatever the later ones hold
    #[test]
    fn token_precedence_is_fixed(in_native: bool, in_env: bool, in_file: bool) {
        let home = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut env = MapEnv::new();

        if in_native {
            store.store(CredentialKind::AccessToken.namespace(), DEFAULT_ACCOUNT, b"native").unwrap();
        }
        if in_env {
            env.set(ACCESS_TOKEN_ENV, "env");
        }
        if in_file {
            let mut document = ConfigDocument::default();
            document.set_token("file");
            save_document(&home, &document);
        }

        let result = resolver(&home, store, env).resolve_token();
        let expected = [
            (in_native, "native", CredentialSource::NativeStore),
            (in_env, "env", CredentialSource::EnvironmentVariable),
            (in_file, "file", CredentialSource::ConfigFile),
        ]
        .into_iter()
        .find(|(present, _, _)| *present);

        match expected {
            Some((_, value, source)) => {
                let resolved = result.unwrap();
                prop_assert_eq!(resolved.value.expose(), value);
                prop_assert_eq!(resolved.source, source);
                prop_assert_eq!(resolved.attempts.last().map(|a| a.outcome), Some(AttemptOutcome::Found));
                prop_assert!(resolved.attempts.iter().rev().skip(1).all(|a| a.outcome != AttemptOutcome::Found));
            }
            None => {
                let err = result.unwrap_err();
                prop_assert_eq!(err.tried().len(), 3);
            }
        }
    }

    /// Resolution is deterministic for a fixed environment and filesystem
    #[test]
    fn resolution_is_repeatable(user in "[a-z]{1,12}", password in "[A-Za-z0-9]{1,16}") {
        let home = TempDir::new().unwrap();
        let env = MapEnv::new()
            .with(API_USER_ENV, user.clone())
            .with(API_PASSWORD_ENV, password.clone());
        let resolver = resolver(&home, Arc::new(UnavailableStore), env);

        let first = resolver.resolve_service_api().unwrap();
        let second = resolver.resolve_service_api().unwrap();
        prop_assert_eq!(&first.attempts, &second.attempts);
        prop_assert_eq!(first.value.api_user(), user.as_str());
        prop_assert_eq!(second.value.expose_password(), password.as_str());
    }
}

#[test]
fn native_hit_skips_environment_and_file() {
    let home = TempDir::new().unwrap();

    // A credentials file that would fail to parse if it were read
    std::fs::create_dir_all(home.path().join(".credchain")).unwrap();
    std::fs::write(files(&home).path(), "not = [valid").unwrap();

    let store: Arc<dyn SecureStore> = Arc::new(MemoryStore::new());
    store
        .store(
            CredentialKind::ServiceApi.namespace(),
            DEFAULT_ACCOUNT,
            br#"{"api_user":"alice","api_password":"pw"}"#,
        )
        .unwrap();
    let env = Arc::new(CountingEnv::new(
        MapEnv::new().with(API_USER_ENV, "bob").with(API_PASSWORD_ENV, "x"),
    ));
    let resolver = resolver_with(&home, store, env.clone());

    let resolved = resolver.resolve_service_api().unwrap();
    assert_eq!(resolved.source, CredentialSource::NativeStore);
    assert_eq!(resolved.attempts.len(), 1);
    assert_eq!(resolved.value.api_user(), "alice");
    assert_eq!(resolved.value.ssh_user(), "alice");
    assert_eq!(resolved.value.ssh_gateway(), DEFAULT_SSH_GATEWAY);
    assert_eq!(env.lookups(), 0);
}

// ========== Exhaustion ==========

#[test]
fn token_exhaustion_lists_every_source() {
    let home = TempDir::new().unwrap();
    let resolver = resolver(&home, Arc::new(UnavailableStore), MapEnv::new());

    let err = resolver.resolve_token().unwrap_err();
    let path = files(&home).path().display().to_string();
    assert_eq!(
        err.tried(),
        [
            "Native secure storage (credchain.github-token)".to_string(),
            format!("Environment variable {ACCESS_TOKEN_ENV}"),
            format!("Credentials file {path}"),
        ]
    );
    assert!(err.last_error().unwrap().contains("not found"));
    assert!(err.to_string().starts_with("access token not found (tried: "));
}

#[test]
fn ssh_key_exhaustion_scans_every_location() {
    let home = TempDir::new().unwrap();
    let resolver = resolver(&home, Arc::new(UnavailableStore), MapEnv::new());

    let err = resolver.resolve_ssh_key().unwrap_err();
    let tried = err.tried();
    assert_eq!(tried.len(), 7);
    assert_eq!(tried[0], "Native secure storage (credchain.ssh-key)");
    assert_eq!(tried[1], "Environment variable CREDCHAIN_SSH_KEY_PATH");
    assert_eq!(tried[2], "Environment variable SSH_PRIVATE_KEY_PATH");
    assert!(tried[3].starts_with("Credentials file "));
    for (entry, name) in tried[4..].iter().zip(["id_rsa", "id_ed25519", "id_ecdsa"]) {
        assert_eq!(
            entry,
            &format!("Default key location {}", default_key(&home, name).display())
        );
    }
    assert!(matches!(
        err,
        ResolveError::NotFound {
            kind: CredentialKind::SshKey,
            ..
        }
    ));
}

// ========== Fall-through ==========

#[test]
fn default_key_location_is_last_resort() {
    let home = TempDir::new().unwrap();
    let key = default_key(&home, "id_ed25519");
    write_key(&key, 0o600);

    let resolved = resolver(&home, Arc::new(UnavailableStore), MapEnv::new())
        .resolve_ssh_key()
        .unwrap();
    assert_eq!(resolved.source, CredentialSource::DefaultLocation);
    assert_eq!(resolved.value.path(), Some(key.as_path()));
    assert_eq!(resolved.attempts.len(), 6);
    assert_eq!(resolved.attempts[4].outcome, AttemptOutcome::Missing);
}

#[test]
fn invalid_env_key_falls_through_to_config_path() {
    let home = TempDir::new().unwrap();
    let bogus = home.path().join("notes.txt");
    std::fs::write(&bogus, "just some notes").unwrap();
    write_key(&home.path().join("keys").join("deploy"), 0o600);

    let mut document = ConfigDocument::default();
    document.set_private_key_path(std::path::Path::new("~/keys/deploy"));
    save_document(&home, &document);

    let env = MapEnv::new().with("CREDCHAIN_SSH_KEY_PATH", bogus.to_string_lossy());
    let resolved = resolver(&home, Arc::new(UnavailableStore), env)
        .resolve_ssh_key()
        .unwrap();

    assert_eq!(resolved.source, CredentialSource::ConfigFile);
    assert_eq!(resolved.attempts[1].outcome, AttemptOutcome::Invalid);
    assert_eq!(resolved.attempts[2].outcome, AttemptOutcome::Missing);
    assert_eq!(
        resolved.value.path(),
        Some(home.path().join("keys").join("deploy").as_path())
    );
    assert!(resolved.value.expose().starts_with(b"-----BEGIN OPENSSH"));
}

#[test]
fn failing_store_is_recorded_and_skipped() {
    let home = TempDir::new().unwrap();
    let env = MapEnv::new().with(ACCESS_TOKEN_ENV, "ghp_env");
    let resolved = resolver(&home, Arc::new(FlakyStore::default()), env)
        .resolve_token()
        .unwrap();

    assert_eq!(resolved.source, CredentialSource::EnvironmentVariable);
    let native = &resolved.attempts[0];
    assert_eq!(native.outcome, AttemptOutcome::Failed);
    assert!(native.error.as_deref().unwrap().contains("rejected by keychain"));
}

#[test]
fn last_error_is_most_recent_not_most_severe() {
    let home = TempDir::new().unwrap();
    let err = resolver(&home, Arc::new(FlakyStore::default()), MapEnv::new())
        .resolve_token()
        .unwrap_err();
    // The store failure happened first; the missing file came later
    assert!(err.last_error().unwrap().contains("Credentials file not found"));
}

#[test]
fn malformed_file_does_not_stop_the_chain() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join(".credchain")).unwrap();
    std::fs::write(files(&home).path(), "[ssh_key\nprivate_key_path = 1").unwrap();
    write_key(&default_key(&home, "id_rsa"), 0o600);

    let resolved = resolver(&home, Arc::new(UnavailableStore), MapEnv::new())
        .resolve_ssh_key()
        .unwrap();
    assert_eq!(resolved.source, CredentialSource::DefaultLocation);
    assert_eq!(resolved.attempts[3].outcome, AttemptOutcome::Failed);
}

#[test]
fn api_pair_applies_overrides_and_defaults() {
    let home = TempDir::new().unwrap();
    let env = MapEnv::new()
        .with(API_USER_ENV, "alice")
        .with(API_PASSWORD_ENV, "pw")
        .with(SSH_GATEWAY_ENV, "bastion.example.com:2222");
    let resolved = resolver(&home, Arc::new(UnavailableStore), env)
        .resolve_service_api()
        .unwrap();
    assert_eq!(resolved.value.ssh_user(), "alice");
    assert_eq!(resolved.value.ssh_gateway(), "bastion.example.com:2222");

    let env = MapEnv::new()
        .with(API_USER_ENV, "alice")
        .with(API_PASSWORD_ENV, "pw")
        .with(SSH_USER_ENV, "deploy");
    let resolved = resolver(&home, Arc::new(UnavailableStore), env)
        .resolve_service_api()
        .unwrap();
    assert_eq!(resolved.value.ssh_user(), "deploy");
    assert_eq!(resolved.value.ssh_gateway(), DEFAULT_SSH_GATEWAY);
}

#[test]
fn incomplete_config_section_is_invalid() {
    let home = TempDir::new().unwrap();
    save_document(
        &home,
        &toml::from_str("[service_api]\napi_user = \"alice\"\n").unwrap(),
    );
    let err = resolver(&home, Arc::new(UnavailableStore), MapEnv::new())
        .resolve_service_api()
        .unwrap_err();
    assert_eq!(err.last_error(), Some("[service_api] is missing api_password"));
}

// ========== Probe memoisation ==========

#[test]
fn capability_probe_runs_once_per_resolver() {
    let home = TempDir::new().unwrap();
    let store = Arc::new(FlakyStore::default());
    let resolver = resolver(&home, store.clone(), MapEnv::new());

    let _ = resolver.resolve_token();
    let _ = resolver.resolve_ssh_key();
    let _ = resolver.resolve_service_api();
    assert!(resolver.native_available());
    assert_eq!(store.probes(), 1);
}

#[test]
fn recheck_replaces_the_cached_answer() {
    let home = TempDir::new().unwrap();
    let store = Arc::new(SwitchableStore::default());
    let resolver = resolver(&home, store.clone(), MapEnv::new());

    assert!(resolver.native_available());
    store.set_offline(true);
    assert!(resolver.native_available());
    assert!(!resolver.recheck_native_storage());
    assert!(!resolver.native_available());

    store.set_offline(false);
    assert!(resolver.recheck_native_storage());
}

// ========== Persistence ==========

#[test]
fn failed_native_write_falls_back_to_file() {
    let home = TempDir::new().unwrap();
    let resolver = resolver(&home, Arc::new(FlakyStore::default()), MapEnv::new());

    let destination = resolver.save_token(&AccessToken::new("ghp_saved")).unwrap();
    assert_eq!(destination, CredentialSource::ConfigFile);
    let document = files(&home).load().unwrap();
    assert_eq!(document.token(), Some("ghp_saved"));
}

#[test]
fn saved_key_round_trips_through_native_store() {
    let home = TempDir::new().unwrap();
    let key = home.path().join("deploy_key");
    write_key(&key, 0o600);
    let store = Arc::new(MemoryStore::new());
    let resolver = resolver(&home, store, MapEnv::new());

    assert_eq!(
        resolver.save_ssh_key(&key).unwrap(),
        CredentialSource::NativeStore
    );
    let resolved = resolver.resolve_ssh_key().unwrap();
    assert_eq!(resolved.source, CredentialSource::NativeStore);
    assert_eq!(resolved.value.path(), None);
    assert_eq!(
        resolved.value.expose(),
        super::support::OPENSSH_KEY.as_bytes()
    );
}

#[test]
fn saving_preserves_other_sections() {
    let home = TempDir::new().unwrap();
    let resolver = resolver(&home, Arc::new(UnavailableStore), MapEnv::new());
    resolver
        .save_service_api(&ServiceApiCredentials::new("alice", "pw", None, None))
        .unwrap();
    resolver.save_token(&AccessToken::new("tok")).unwrap();

    let document = files(&home).load().unwrap();
    assert!(document.service_api_credentials().is_some());
    assert_eq!(document.token(), Some("tok"));

    let removed = resolver.forget(CredentialKind::ServiceApi).unwrap();
    assert_eq!(removed, vec![CredentialSource::ConfigFile]);
    let document = files(&home).load().unwrap();
    assert!(document.service_api.is_none());
    assert_eq!(document.token(), Some("tok"));
}
