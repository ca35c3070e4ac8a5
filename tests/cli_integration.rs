//! Integration tests for the TokenVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passphrases come from `TOKENVAULT_PASSPHRASE` so no test ever hits
//! an interactive prompt.  Each test gets its own temp dir with a
//! config file that selects fast (but still valid) Argon2 parameters.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSPHRASE: &str = "test-passphrase-123";

/// Helper: get a Command pointing at the tokenvault binary.
fn tokenvault(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("tokenvault").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env("TOKENVAULT_PASSPHRASE", PASSPHRASE);
    cmd
}

/// Helper: a temp project dir with fast KDF settings.
fn project_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".tokenvault.toml"),
        "argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n",
    )
    .unwrap();
    dir
}

fn init_vault(dir: &TempDir) {
    tokenvault(dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
}

#[test]
fn help_flag_shows_usage() {
    let dir = project_dir();
    tokenvault(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted API credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("reveal"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("expiring"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn version_flag_shows_version() {
    let dir = project_dir();
    tokenvault(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tokenvault"));
}

#[test]
fn no_args_shows_help() {
    let dir = project_dir();
    tokenvault(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn list_on_missing_vault_fails() {
    let dir = project_dir();
    tokenvault(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn init_twice_fails() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_list_reveal_roundtrip() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args([
            "add",
            "GitHub",
            "--value",
            "ghp_x",
            "--type",
            "personal access token",
            "--tag",
            "ci",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("id 1"));

    tokenvault(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"))
        .stdout(predicate::str::contains("active"));

    tokenvault(&dir)
        .args(["reveal", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ghp_x"));
}

#[test]
fn add_reads_secret_from_stdin() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["add", "Stripe"])
        .write_stdin("sk-live-42\n")
        .assert()
        .success();

    tokenvault(&dir)
        .args(["reveal", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-live-42"));
}

#[test]
fn reveal_with_wrong_passphrase_fails() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["add", "GitHub", "--value", "ghp_x"])
        .assert()
        .success();

    tokenvault(&dir)
        .args(["reveal", "1"])
        .env("TOKENVAULT_PASSPHRASE", "wrong-passphrase-xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn add_with_wrong_passphrase_is_caught_early() {
    let dir = project_dir();
    init_vault(&dir);

    // The bootstrap hash recorded at init catches the typo before
    // anything is encrypted under the wrong key.
    tokenvault(&dir)
        .args(["add", "GitHub", "--value", "ghp_x"])
        .env("TOKENVAULT_PASSPHRASE", "wrong-passphrase-xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn delete_requires_force_or_confirmation() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["add", "GitHub", "--value", "ghp_x"])
        .assert()
        .success();

    tokenvault(&dir)
        .args(["delete", "1", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    tokenvault(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 token(s)"));

    // Deleting again fails: the row is tombstoned.
    tokenvault(&dir)
        .args(["delete", "1", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn update_metadata_then_list_shows_it() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["add", "GitHub", "--value", "ghp_x"])
        .assert()
        .success();

    tokenvault(&dir)
        .args(["update", "1", "--priority", "critical", "--status", "testing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated"));

    tokenvault(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("critical"))
        .stdout(predicate::str::contains("testing"));
}

#[test]
fn expiring_reports_window() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["expiring", "--days", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active tokens expire within 30 days"));
}

#[test]
fn audit_records_actions() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["add", "GitHub", "--value", "ghp_x"])
        .assert()
        .success();

    tokenvault(&dir).args(["reveal", "1"]).assert().success();

    tokenvault(&dir)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("reveal"));
}

#[test]
fn invalid_status_filter_rejected() {
    let dir = project_dir();
    init_vault(&dir);

    tokenvault(&dir)
        .args(["list", "--status", "banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status"));
}

#[test]
fn completions_generate_for_bash() {
    let dir = project_dir();
    tokenvault(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tokenvault"));
}
