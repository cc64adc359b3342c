use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use envsync_sync::EncryptionKey;

struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().expect("project dir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    fn sync_file(&self) -> PathBuf {
        self.root.join(".env-sync.yaml")
    }

    fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }
}

fn envsync(project: &Project, key: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("envsync"));
    cmd.current_dir(&project.root)
        .env("ENVSYNC_ENCRYPTION_KEY", key)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--sync-file")
        .arg(project.sync_file());
    cmd
}

fn init(project: &Project, key: &str, store: &Path, strategy: &str) {
    envsync(project, key)
        .args(["init", "--secret-name", "team-env", "--strategy", strategy])
        .arg("--store-dir")
        .arg(store)
        .assert()
        .success()
        .stdout(contains("Wrote"));
}

#[test]
fn generate_key_prints_a_base64_key() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("envsync"))
        .arg("generate-key")
        .output()
        .expect("run generate-key");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(EncryptionKey::from_base64(stdout.trim()).is_ok());
}

#[test]
fn generate_key_hex_is_64_chars() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("envsync"))
        .args(["generate-key", "--format", "hex"])
        .output()
        .expect("run generate-key");
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout.trim().len(), 64);
    assert!(stdout.trim().chars().all(|c| c.is_ascii_hexdigit()));
}

#[cfg(unix)]
#[test]
fn generate_key_output_file_is_owner_only_and_not_overwritten() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("dir");
    let path = dir.path().join("envsync.key");
    Command::new(assert_cmd::cargo::cargo_bin!("envsync"))
        .args(["generate-key", "--output"])
        .arg(&path)
        .assert()
        .success();

    let mode = fs::metadata(&path).expect("key metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    let contents = fs::read_to_string(&path).expect("key file");
    assert!(EncryptionKey::from_base64(&contents).is_ok());

    Command::new(assert_cmd::cargo::cargo_bin!("envsync"))
        .args(["generate-key", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("already exists"));
    assert_eq!(fs::read_to_string(&path).expect("key file"), contents);
}

#[test]
fn init_requires_a_usable_key() {
    let project = Project::new();
    let store = project.root.join("vault");
    envsync(&project, "not-a-key")
        .args(["init", "--secret-name", "team-env"])
        .arg("--store-dir")
        .arg(&store)
        .assert()
        .failure()
        .stderr(contains("generate-key"));
    assert!(!project.sync_file().exists());
}

#[test]
fn init_rejects_secret_names_the_store_cannot_hold() {
    let project = Project::new();
    let key = EncryptionKey::generate().to_base64();
    envsync(&project, &key)
        .args(["init", "--secret-name", "team_env"])
        .arg("--store-dir")
        .arg(project.root.join("vault"))
        .assert()
        .failure()
        .stderr(contains("invalid init options"))
        .stderr(contains("team_env"));
    assert!(!project.sync_file().exists());
}

#[test]
fn commands_without_config_point_at_init() {
    let project = Project::new();
    let key = EncryptionKey::generate().to_base64();
    envsync(&project, &key)
        .arg("push")
        .assert()
        .failure()
        .stderr(contains("envsync init"));
}

#[test]
fn push_pull_status_and_diff_across_two_checkouts() {
    let vault = TempDir::new().expect("vault");
    let key = EncryptionKey::generate().to_base64();
    let laptop = Project::new();
    let server = Project::new();
    init(&laptop, &key, vault.path(), "local");
    init(&server, &key, vault.path(), "local");

    fs::write(laptop.env_file(), "API_KEY=abc\nPORT=8080\n").expect("write env");
    envsync(&laptop, &key)
        .arg("push")
        .assert()
        .success()
        .stdout(contains("created 'team-env'"));

    envsync(&server, &key)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("created local file"));
    assert_eq!(
        fs::read_to_string(server.env_file()).expect("server env"),
        "API_KEY=abc\nPORT=8080\n"
    );

    let output = envsync(&server, &key)
        .args(["status", "--json"])
        .output()
        .expect("status");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status json");
    assert_eq!(report["status"], "in_sync");
    assert_eq!(report["last_sync_by"], "pull");
    assert_eq!(report["secret_name"], "team-env");

    fs::write(server.env_file(), "API_KEY=abc\nPORT=9090\n").expect("edit env");
    envsync(&server, &key)
        .arg("diff")
        .assert()
        .success()
        .stdout(contains("+PORT=9090"))
        .stdout(contains("-PORT=8080"));
    envsync(&server, &key)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("local ahead"));
    envsync(&server, &key).arg("push").assert().success();

    envsync(&laptop, &key)
        .arg("pull")
        .assert()
        .success()
        .stdout(contains("updated local file"));
    assert_eq!(
        fs::read_to_string(laptop.env_file()).expect("laptop env"),
        "API_KEY=abc\nPORT=9090\n"
    );
}

#[test]
fn conflicting_push_reports_keys() {
    let vault = TempDir::new().expect("vault");
    let key = EncryptionKey::generate().to_base64();
    let laptop = Project::new();
    let server = Project::new();
    init(&laptop, &key, vault.path(), "local");
    init(&server, &key, vault.path(), "remote");

    fs::write(laptop.env_file(), "A=1\nB=2\n").expect("write env");
    envsync(&laptop, &key).arg("push").assert().success();
    envsync(&server, &key).arg("pull").assert().success();

    fs::write(laptop.env_file(), "A=9\nB=2\n").expect("laptop edit");
    envsync(&laptop, &key).arg("push").assert().success();
    fs::write(server.env_file(), "A=8\nB=2\n").expect("server edit");

    envsync(&server, &key)
        .arg("push")
        .assert()
        .success()
        .stdout(contains("resolved (remote)"))
        .stdout(contains("conflicting keys: A"));
    assert_eq!(
        fs::read_to_string(server.env_file()).expect("server env"),
        "A=9\nB=2\n"
    );
}

#[test]
fn manual_conflict_without_terminal_fails_clearly() {
    let vault = TempDir::new().expect("vault");
    let key = EncryptionKey::generate().to_base64();
    let laptop = Project::new();
    let server = Project::new();
    init(&laptop, &key, vault.path(), "local");
    init(&server, &key, vault.path(), "manual");

    fs::write(laptop.env_file(), "A=1\n").expect("write env");
    envsync(&laptop, &key).arg("push").assert().success();
    envsync(&server, &key).arg("pull").assert().success();
    fs::write(laptop.env_file(), "A=2\n").expect("laptop edit");
    envsync(&laptop, &key).arg("push").assert().success();
    fs::write(server.env_file(), "A=3\n").expect("server edit");

    envsync(&server, &key)
        .arg("push")
        .assert()
        .failure()
        .stderr(contains("requires manual resolution"));
    assert_eq!(fs::read_to_string(server.env_file()).expect("server env"), "A=3\n");
}

#[test]
fn malformed_local_file_is_not_published() {
    let vault = TempDir::new().expect("vault");
    let key = EncryptionKey::generate().to_base64();
    let project = Project::new();
    init(&project, &key, vault.path(), "manual");

    fs::write(project.env_file(), "FOO\n").expect("write env");
    envsync(&project, &key)
        .arg("push")
        .assert()
        .failure()
        .stderr(contains("line 1"));
    assert_eq!(fs::read_dir(vault.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[test]
fn wrong_key_is_rejected_without_touching_local_file() {
    let vault = TempDir::new().expect("vault");
    let key = EncryptionKey::generate().to_base64();
    let other_key = EncryptionKey::generate().to_base64();
    let laptop = Project::new();
    let server = Project::new();
    init(&laptop, &key, vault.path(), "local");
    init(&server, &other_key, vault.path(), "local");

    fs::write(laptop.env_file(), "A=1\n").expect("write env");
    envsync(&laptop, &key).arg("push").assert().success();

    envsync(&server, &other_key)
        .arg("pull")
        .assert()
        .failure()
        .stderr(contains("authentication failed"));
    assert!(!server.env_file().exists());
}
