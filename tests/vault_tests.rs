//! Integration tests for the vault state container.

use chrono::{Duration, Utc};
use tempfile::TempDir;
use tokenvault::config::Settings;
use tokenvault::errors::TokenVaultError;
use tokenvault::store::TokenStore;
use tokenvault::token::{
    SortDirection, SortField, TokenDraft, TokenFilter, TokenPatch, TokenStatus,
};
use tokenvault::vault::Vault;
use zeroize::Zeroizing;

const PASSPHRASE: &[u8] = b"test-passphrase-123";

/// Helper: a fresh vault in a temp dir with fast KDF settings.
fn new_vault() -> (TempDir, Vault) {
    let dir = TempDir::new().expect("create temp dir");
    let store = TokenStore::create(dir.path()).expect("create store");

    let settings = Settings {
        argon2_memory_kib: 8_192,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Settings::default()
    };
    let vault = Vault::initialize(store, &settings);
    (dir, vault)
}

fn draft(service: &str, secret: &str) -> TokenDraft {
    TokenDraft {
        service_name: service.to_string(),
        token_type: "api key".to_string(),
        secret: secret.to_string(),
        ..TokenDraft::default()
    }
}

// ---------------------------------------------------------------------------
// Add then fetch
// ---------------------------------------------------------------------------

#[test]
fn add_then_refresh_shows_token_exactly_once() {
    let (_dir, mut vault) = new_vault();

    vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let matching: Vec<_> = vault
        .tokens()
        .iter()
        .filter(|t| t.service_name == "GitHub")
        .collect();
    assert_eq!(matching.len(), 1, "no duplication after add + refresh");
}

#[test]
fn add_validation_aborts_before_storage() {
    let (_dir, mut vault) = new_vault();

    let result = vault.add_token(draft("", "secret"), PASSPHRASE);
    assert!(matches!(result, Err(TokenVaultError::ValidationFailed(_))));

    let result = vault.add_token(draft("GitHub", ""), PASSPHRASE);
    assert!(matches!(result, Err(TokenVaultError::ValidationFailed(_))));

    // Nothing was written.
    vault.refresh().unwrap();
    assert!(vault.tokens().is_empty());
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

#[test]
fn reveal_roundtrips_the_secret() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let value = vault.reveal(token.id, PASSPHRASE).unwrap();
    assert_eq!(value.as_str(), "ghp_x");
}

#[test]
fn reveal_with_wrong_passphrase_fails() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let result = vault.reveal(token.id, b"wrongpw-12345");
    assert!(
        matches!(result, Err(TokenVaultError::AuthenticationFailed)),
        "wrong passphrase must never return plaintext"
    );
}

#[test]
fn reveal_unknown_id_not_found() {
    let (_dir, mut vault) = new_vault();
    vault.refresh().unwrap();

    let result = vault.reveal(42, PASSPHRASE);
    assert!(matches!(result, Err(TokenVaultError::TokenNotFound(42))));
}

#[test]
fn reveal_updates_access_stats() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    vault.reveal(token.id, PASSPHRASE).unwrap();
    vault.reveal(token.id, PASSPHRASE).unwrap();

    vault.refresh().unwrap();
    let read = vault.tokens().iter().find(|t| t.id == token.id).unwrap();
    assert_eq!(read.access_count, 2);
    assert!(read.last_accessed.is_some());
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_removes_from_list_and_store() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    vault.delete_token(token.id).unwrap();
    assert!(vault.tokens().is_empty());

    // Tombstoned rows never come back.
    vault.refresh().unwrap();
    assert!(vault.tokens().is_empty());

    // And revealing one is a NotFound.
    let result = vault.reveal(token.id, PASSPHRASE);
    assert!(matches!(result, Err(TokenVaultError::TokenNotFound(_))));
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn metadata_update_leaves_secret_decryptable() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let patch = TokenPatch {
        usage_notes: Some("used by the deploy bot".to_string()),
        ..TokenPatch::default()
    };
    let updated = vault.update_token(token.id, patch, None).unwrap();
    assert_eq!(updated.usage_notes, "used by the deploy bot");

    // No re-encryption happened: the original passphrase still works.
    let value = vault.reveal(token.id, PASSPHRASE).unwrap();
    assert_eq!(value.as_str(), "ghp_x");
}

#[test]
fn rotate_reencrypts_the_secret() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_old"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let patch = TokenPatch {
        secret: Some(Zeroizing::new("ghp_new".to_string())),
        ..TokenPatch::default()
    };
    vault.update_token(token.id, patch, Some(PASSPHRASE)).unwrap();

    let value = vault.reveal(token.id, PASSPHRASE).unwrap();
    assert_eq!(value.as_str(), "ghp_new");
}

#[test]
fn new_secret_without_passphrase_is_rejected() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();

    let patch = TokenPatch {
        secret: Some(Zeroizing::new("ghp_new".to_string())),
        ..TokenPatch::default()
    };
    let result = vault.update_token(token.id, patch, None);
    assert!(matches!(result, Err(TokenVaultError::ValidationFailed(_))));
}

#[test]
fn empty_patch_is_rejected() {
    let (_dir, mut vault) = new_vault();

    let token = vault.add_token(draft("GitHub", "ghp_x"), PASSPHRASE).unwrap();

    let result = vault.update_token(token.id, TokenPatch::default(), None);
    assert!(matches!(result, Err(TokenVaultError::ValidationFailed(_))));
}

// ---------------------------------------------------------------------------
// Expiring-soon query
// ---------------------------------------------------------------------------

#[test]
fn expiring_returns_only_active_tokens_in_window() {
    let (_dir, mut vault) = new_vault();
    let now = Utc::now();

    // A: expires in 10 days, active.
    let mut a = draft("A", "secret-a");
    a.expiration_date = Some(now + Duration::days(10));
    vault.add_token(a, PASSPHRASE).unwrap();

    // B: expires in 40 days, active.
    let mut b = draft("B", "secret-b");
    b.expiration_date = Some(now + Duration::days(40));
    vault.add_token(b, PASSPHRASE).unwrap();

    // C: expires in 5 days, revoked.
    let mut c = draft("C", "secret-c");
    c.expiration_date = Some(now + Duration::days(5));
    c.status = Some(TokenStatus::Revoked);
    vault.add_token(c, PASSPHRASE).unwrap();

    vault.refresh().unwrap();

    let expiring = vault.expiring(30);
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].service_name, "A");
}

// ---------------------------------------------------------------------------
// Query projections
// ---------------------------------------------------------------------------

#[test]
fn query_sort_descending_reverses_ascending() {
    let (_dir, mut vault) = new_vault();

    vault.add_token(draft("zebra", "s1"), PASSPHRASE).unwrap();
    vault.add_token(draft("Alpha", "s2"), PASSPHRASE).unwrap();
    vault.add_token(draft("middle", "s3"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let filter = TokenFilter::default();
    let asc = vault.query(
        &filter,
        Some((SortField::ServiceName, SortDirection::Ascending)),
    );
    let desc = vault.query(
        &filter,
        Some((SortField::ServiceName, SortDirection::Descending)),
    );

    let asc_ids: Vec<i64> = asc.iter().map(|t| t.id).collect();
    let mut desc_ids: Vec<i64> = desc.iter().map(|t| t.id).collect();
    desc_ids.reverse();
    assert_eq!(asc_ids, desc_ids);
}

#[test]
fn query_search_filters_list() {
    let (_dir, mut vault) = new_vault();

    let mut gh = draft("GitHub", "s1");
    gh.tags = vec!["ci".to_string()];
    vault.add_token(gh, PASSPHRASE).unwrap();
    vault.add_token(draft("Stripe", "s2"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();

    let filter = TokenFilter {
        search: Some("github".to_string()),
        ..TokenFilter::default()
    };
    let results = vault.query(&filter, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].service_name, "GitHub");
}

// ---------------------------------------------------------------------------
// Refresh semantics
// ---------------------------------------------------------------------------

#[test]
fn refresh_replaces_list_atomically() {
    let (_dir, mut vault) = new_vault();

    vault.add_token(draft("One", "s1"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();
    assert_eq!(vault.tokens().len(), 1);
    assert!(vault.last_refreshed().is_some());
    assert!(vault.last_error().is_none());

    vault.add_token(draft("Two", "s2"), PASSPHRASE).unwrap();
    vault.refresh().unwrap();
    assert_eq!(vault.tokens().len(), 2);
}
