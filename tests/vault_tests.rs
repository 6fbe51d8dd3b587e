//! Integration tests for the ak storage layer.

use std::fs;
use std::path::Path;

use akvault::audit::AuditLog;
use akvault::config::Config;
use akvault::crypto::{hash_key_name, MemoryBackend};
use akvault::errors::AkError;
use akvault::vault::{
    mapping_file_for_dir, KeyStore, MigrationOutcome, ValueSource, VaultStore, DEFAULT_PROFILE,
};
use tempfile::TempDir;

/// Helper: a plaintext store rooted in a fresh temp dir, with an empty
/// process environment.
fn plain_store() -> (TempDir, VaultStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = open_plain(dir.path());
    (dir, store)
}

fn open_plain(path: &Path) -> VaultStore {
    let config = Config::at(path).expect("config");
    VaultStore::new(config).with_environment(|_| None)
}

fn open_memory(path: &Path, pass: &str) -> VaultStore {
    let config = Config::at(path).expect("config");
    VaultStore::with_backend(config, Box::new(MemoryBackend::new(pass))).with_environment(|_| None)
}

fn set_vault(store: &VaultStore, name: &str, value: &str) {
    let mut vault = store.load_vault().unwrap();
    vault.set(name, value);
    store.save_vault(&vault).unwrap();
}

// ---------------------------------------------------------------------------
// Profiles survive the global vault
// ---------------------------------------------------------------------------

#[test]
fn saved_profile_survives_global_vault_removal() {
    let (dir, store) = plain_store();

    set_vault(&store, "API_KEY", "abc123def456");
    let saved = store
        .save_profile_from_vault("myprofile", &["API_KEY".to_string()])
        .unwrap();
    assert_eq!(saved.copied, vec!["API_KEY".to_string()]);

    fs::remove_file(store.vault_path()).unwrap();

    // A fresh store over the same directory still resolves the value.
    let reopened = open_plain(dir.path());
    let exports = reopened.make_exports("myprofile").unwrap();
    assert_eq!(exports, "export API_KEY=\"abc123def456\"\n");
}

#[test]
fn save_without_names_uses_every_vault_key() {
    let (_dir, store) = plain_store();
    set_vault(&store, "B_KEY", "2");
    set_vault(&store, "A_KEY", "1");

    let saved = store.save_profile_from_vault("all", &[]).unwrap();
    assert_eq!(saved.keys, vec!["A_KEY".to_string(), "B_KEY".to_string()]);
    assert_eq!(store.read_profile("all").unwrap(), saved.keys);
}

// ---------------------------------------------------------------------------
// Resolution precedence
// ---------------------------------------------------------------------------

#[test]
fn resolution_prefers_profile_then_vault_then_environment() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(Config::at(dir.path()).unwrap()).with_environment(|name| {
        (name == "FROM_ENV" || name == "SHADOWED").then(|| format!("env-{name}"))
    });

    store.add_profile_key("work", "SHADOWED", "profile-value").unwrap();
    set_vault(&store, "SHADOWED", "vault-value");
    set_vault(&store, "FROM_VAULT", "vault-only");
    store
        .write_profile(
            "work",
            &[
                "SHADOWED".to_string(),
                "FROM_VAULT".to_string(),
                "FROM_ENV".to_string(),
                "NOWHERE".to_string(),
            ],
        )
        .unwrap();

    let resolution = store.resolve_profile("work").unwrap();
    let got: Vec<(&str, &str, ValueSource)> = resolution
        .values
        .iter()
        .map(|v| (v.name.as_str(), v.value.as_str(), v.source))
        .collect();
    assert_eq!(
        got,
        vec![
            ("SHADOWED", "profile-value", ValueSource::Profile),
            ("FROM_VAULT", "vault-only", ValueSource::Vault),
            ("FROM_ENV", "env-FROM_ENV", ValueSource::Environment),
        ]
    );
    assert_eq!(resolution.missing, vec!["NOWHERE".to_string()]);

    let exports = store.make_exports("work").unwrap();
    assert!(!exports.contains("NOWHERE"));
    assert_eq!(exports.lines().count(), 3);
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[test]
fn legacy_vault_migrates_once() {
    let (dir, store) = plain_store();
    let legacy: KeyStore = [("OLD_A", "1"), ("OLD_B", "2")].into_iter().collect();
    store.save_vault(&legacy).unwrap();

    assert_eq!(
        store.ensure_migrated().unwrap(),
        MigrationOutcome::Migrated { keys: 2 }
    );
    assert_eq!(store.ensure_migrated().unwrap(), MigrationOutcome::NotNeeded);

    // Legacy file is kept.
    assert!(dir.path().join("keys.env").exists());
    assert_eq!(
        store.read_profile(DEFAULT_PROFILE).unwrap(),
        vec!["OLD_A".to_string(), "OLD_B".to_string()]
    );
    assert_eq!(
        store.load_profile_keys(DEFAULT_PROFILE).unwrap().get("OLD_B"),
        Some("2")
    );
}

#[test]
fn removed_vault_key_is_not_exported_by_migrated_default() {
    let (_dir, store) = plain_store();
    set_vault(&store, "API_KEY", "abc123def456");
    // First profile access copies the vault into `default`.
    store.refresh_profile_copies("API_KEY", "abc123def456").unwrap();
    assert_eq!(
        store.make_exports(DEFAULT_PROFILE).unwrap(),
        "export API_KEY=\"abc123def456\"\n"
    );

    let mut vault = store.load_vault().unwrap();
    assert!(vault.remove("API_KEY"));
    store.save_vault(&vault).unwrap();
    let forgotten = store.forget_profile_copies("API_KEY").unwrap();

    assert_eq!(forgotten, vec![DEFAULT_PROFILE.to_string()]);
    assert_eq!(store.make_exports(DEFAULT_PROFILE).unwrap(), "");
    assert!(store.read_profile(DEFAULT_PROFILE).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Profile invariants
// ---------------------------------------------------------------------------

#[test]
fn default_profile_always_listed_and_undeletable() {
    let (_dir, store) = plain_store();
    assert_eq!(store.list_profiles().unwrap(), vec![DEFAULT_PROFILE.to_string()]);
    assert!(store.profile_exists(DEFAULT_PROFILE).unwrap());

    let err = store.delete_profile(DEFAULT_PROFILE).unwrap_err();
    assert!(matches!(err, AkError::InvalidProfileName(..)));
}

#[test]
fn delete_profile_removes_list_and_store() {
    let (dir, store) = plain_store();
    store.add_profile_key("temp", "K", "v").unwrap();
    assert!(dir.path().join("profiles/temp.profile").exists());
    assert!(dir.path().join("profiles/temp.keys").exists());

    store.delete_profile("temp").unwrap();
    assert!(!dir.path().join("profiles/temp.profile").exists());
    assert!(!dir.path().join("profiles/temp.keys").exists());
    assert!(store.delete_profile("temp").unwrap_err().is_not_found());
}

#[test]
fn hostile_profile_names_never_touch_the_filesystem() {
    let (dir, store) = plain_store();
    for name in ["../escape", "a/b", ".hidden", "", "x\ny"] {
        assert!(
            matches!(
                store.create_profile(name),
                Err(AkError::InvalidProfileName(..))
            ),
            "{name:?} should be rejected"
        );
    }
    assert!(!dir.path().join("escape.profile").exists());
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[test]
fn wrong_passphrase_fails_instead_of_reading_empty() {
    let dir = TempDir::new().unwrap();
    let writer = open_memory(dir.path(), "correct horse");
    set_vault(&writer, "API_KEY", "secret");

    let reader = open_memory(dir.path(), "wrong");
    assert!(matches!(
        reader.load_vault(),
        Err(AkError::DecryptionFailed(_))
    ));
}

#[test]
fn plain_backend_refuses_a_gpg_only_vault() {
    let dir = TempDir::new().unwrap();
    set_vault(&open_memory(dir.path(), "pw"), "API_KEY", "secret");

    let plain = open_plain(dir.path());
    assert!(matches!(plain.load_vault(), Err(AkError::DecryptionFailed(_))));
}

#[test]
fn convert_backend_moves_every_file() {
    let dir = TempDir::new().unwrap();
    let plain = open_plain(dir.path());
    set_vault(&plain, "API_KEY", "abc");
    plain.add_profile_key("work", "TOKEN", "t0k").unwrap();

    let memory = open_memory(dir.path(), "pw");
    let report = plain.convert_backend(&memory).unwrap();
    assert_eq!(report.vault_keys, 1);
    assert!(report.profiles.contains(&"work".to_string()));

    assert!(!dir.path().join("keys.env").exists());
    assert!(dir.path().join("keys.env.gpg").exists());
    assert_eq!(memory.load_vault().unwrap().get("API_KEY"), Some("abc"));
    assert_eq!(
        memory.resolve_key("work", "TOKEN").unwrap().map(|v| v.value.clone()),
        Some("t0k".to_string())
    );
}

// ---------------------------------------------------------------------------
// Directory bindings
// ---------------------------------------------------------------------------

#[test]
fn bindings_are_exact_path_and_normalized() {
    let (dir, store) = plain_store();
    let project = dir.path().join("project");

    assert!(store.bind_dir_profile(&project, "work").unwrap());
    assert!(!store.bind_dir_profile(&project, "work").unwrap());

    let dotted = project.join("sub").join("..");
    assert_eq!(store.read_dir_profiles(&dotted).unwrap(), vec!["work".to_string()]);
    assert!(store.read_dir_profiles(&project.join("sub")).unwrap().is_empty());

    let removed = store.unbind_dir_profiles(&project, &[]).unwrap();
    assert_eq!(removed, vec!["work".to_string()]);
    assert!(!mapping_file_for_dir(store.config(), &project).unwrap().exists());
}

#[test]
fn relative_binding_directory_is_rejected() {
    let (_dir, store) = plain_store();
    assert!(matches!(
        store.bind_dir_profile(Path::new("relative/dir"), "work"),
        Err(AkError::InvalidDirectory(_))
    ));
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[test]
fn concurrent_audit_appends_keep_lines_intact() {
    let dir = TempDir::new().unwrap();
    let log = AuditLog::new(Some(dir.path().join("audit.log")), "inst");

    std::thread::scope(|scope| {
        for t in 0..4 {
            let log = log.clone();
            scope.spawn(move || {
                for i in 0..25 {
                    log.record("add", &[format!("KEY_{t}_{i}").as_str()]);
                }
            });
        }
    });

    let entries = log.tail(1000, None).unwrap();
    assert_eq!(entries.len(), 100);
    assert!(entries.iter().all(|e| e.count == 1));

    let text = fs::read_to_string(dir.path().join("audit.log")).unwrap();
    assert!(!text.contains("KEY_0_0"));
    assert!(text.contains(&hash_key_name("KEY_0_0")));
}
