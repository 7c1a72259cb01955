//! End-to-end tests for the `formsync` binary.
//!
//! Stdout is piped under assert_cmd, so every command runs in JSON mode.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn formsync(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("formsync").unwrap();
    cmd.arg("--db")
        .arg(db)
        .env("FORMSYNC_SYNC_DISABLED", "1")
        .env_remove("FORMSYNC_DB")
        .env_remove("GOOGLE_SHEET_ID")
        .env_remove("GOOGLE_CREDENTIALS_JSON")
        .env_remove("GOOGLE_APPLICATION_CREDENTIALS")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn init(temp: &TempDir) -> std::path::PathBuf {
    let db = temp.path().join("forms.db");
    formsync(&db).arg("init").assert().success();
    db
}

fn create(db: &Path, name: &str) -> Value {
    stdout_json(formsync(db).args([
        "form",
        "create",
        "--name",
        name,
        "--email",
        "jane@example.com",
        "--phone",
        "+123456789",
        "--company",
        "Acme",
        "--service",
        "Consulting",
    ]))
}

#[test]
fn init_twice_requires_force() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);

    formsync(&db).arg("init").assert().code(2);
    formsync(&db).args(["init", "--force"]).assert().success();
}

#[test]
fn commands_fail_before_init() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("missing.db");

    let output = formsync(&db)
        .args(["form", "list"])
        .assert()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn form_lifecycle() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);

    let created = create(&db, "Jane Doe");
    assert_eq!(created["id"], 1);
    assert_eq!(created["message"], Value::Null);
    assert_eq!(created["updated_at"], Value::Null);

    let shown = stdout_json(formsync(&db).args(["form", "show", "1"]));
    assert_eq!(shown["name"], "Jane Doe");

    let updated = stdout_json(formsync(&db).args([
        "form", "update", "1", "--message", "Call me", "--no-sync",
    ]));
    assert_eq!(updated["message"], "Call me");
    assert_eq!(updated["email"], "jane@example.com");
    assert!(updated["updated_at"].is_string());

    let history = stdout_json(formsync(&db).args(["form", "history", "1"]));
    assert_eq!(history.as_array().unwrap().len(), 2);

    formsync(&db).args(["form", "delete", "1"]).assert().success();
    formsync(&db).args(["form", "show", "1"]).assert().code(3);
    formsync(&db).args(["form", "delete", "1"]).assert().code(3);
}

#[test]
fn invalid_input_is_a_validation_error() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);

    formsync(&db)
        .args([
            "form", "create", "--name", "A", "--email", "not-an-email", "--phone", "123456789",
            "--company", "C", "--service", "S",
        ])
        .assert()
        .code(4);

    let list = stdout_json(formsync(&db).args(["form", "list"]));
    assert_eq!(list["total"], 0);
}

#[test]
fn list_pages_in_id_order() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);
    for name in ["A", "B", "C"] {
        create(&db, name);
    }

    let page = stdout_json(formsync(&db).args(["form", "list", "--skip", "1", "--limit", "1"]));
    assert_eq!(page["count"], 1);
    assert_eq!(page["total"], 3);
    assert_eq!(page["forms"][0]["name"], "B");

    let all = stdout_json(formsync(&db).args(["form", "list", "--all"]));
    assert_eq!(all["count"], 3);
}

#[test]
fn sync_preview_renders_the_sheet_grid() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);
    create(&db, "Doe, Jane");

    let output = formsync(&db)
        .args(["sync", "preview", "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let csv = String::from_utf8(output).unwrap();
    let mut lines = csv.lines();

    assert_eq!(
        lines.next(),
        Some("ID,Name,Email,Phone,Message,Company,Service,Created At")
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("1,\"Doe, Jane\",jane@example.com,+123456789,,Acme,Consulting,"));
    assert_eq!(lines.next(), None);
}

#[test]
fn sync_push_without_sheet_id_fails() {
    let temp = TempDir::new().unwrap();
    let db = init(&temp);

    let output = formsync(&db)
        .args(["sync", "push"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "SHEETS_ERROR");
}
