use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn tasks(db: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("tasks").expect("binary");
    cmd.arg("--db").arg(db).env_remove("TASKLIST_DB").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_works() {
    Command::cargo_bin("tasks")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Usage").and(contains("complete")).and(contains("--db")));
}

#[test]
fn add_list_complete_delete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("tasks.json");

    tasks(&db)
        .args(["add", "Write report", "--desc", "Q3", "--priority", "low", "--due", "2025-01-01"])
        .assert()
        .success()
        .stdout(contains("Added task 1"));
    tasks(&db)
        .args(["add", "Fix bug", "--desc", "crash", "--priority", "high", "--due", "2025-01-02"])
        .assert()
        .success()
        .stdout(contains("Added task 2"));

    tasks(&db)
        .args(["list", "--search", "FIX"])
        .assert()
        .success()
        .stdout(contains("Fix bug").and(contains("Write report").not()));

    tasks(&db).args(["complete", "2"]).assert().success();
    tasks(&db)
        .arg("stats")
        .assert()
        .success()
        .stdout(contains("Completed: 1/2 (50%)"));
    tasks(&db)
        .args(["view", "2"])
        .assert()
        .success()
        .stdout(contains("Status: Completed").and(contains("Priority: High")));

    tasks(&db).args(["delete", "1"]).assert().success();
    tasks(&db).args(["delete", "9"]).assert().code(2).stderr(contains("task 9 not found"));
}

#[test]
fn missing_fields_are_a_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("tasks.json");
    tasks(&db)
        .args(["add", "No details"])
        .assert()
        .code(2)
        .stderr(contains("missing required field"));
    assert!(!db.exists());
}

#[test]
fn empty_list_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    tasks(&dir.path().join("tasks.json"))
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No task added yet"));
}

#[test]
fn corrupt_file_warns_and_continues() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("tasks.json");
    std::fs::write(&db, "{{{").expect("write");
    tasks(&db)
        .arg("list")
        .assert()
        .success()
        .stderr(contains("corrupt"))
        .stdout(contains("No task added yet"));
    assert_eq!(std::fs::read_to_string(&db).expect("read"), "{{{");
}

#[test]
fn out_of_range_due_date_is_a_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("tasks.json");
    tasks(&db)
        .args(["add", "x", "--desc", "y", "--priority", "low", "--due", "in 99999999999d"])
        .assert()
        .code(2)
        .stderr(contains("Could not understand due date"));
    assert!(!db.exists());
}

#[test]
fn delete_help_explains_renumbering() {
    let dir = tempfile::tempdir().expect("tempdir");
    tasks(&dir.path().join("tasks.json"))
        .args(["delete", "--help"])
        .assert()
        .success()
        .stdout(contains("renumbers").and(contains("latest")));
}
