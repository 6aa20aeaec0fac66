use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const OLD_SPEC: &str = r#"{
  "paths": {
    "/v1/users": {
      "get": {
        "operationId": "listUsers",
        "parameters": [{"name": "limit", "in": "query"}],
        "responses": {"200": {"description": "ok"}}
      }
    }
  }
}"#;

const NEW_SPEC: &str = "paths:
  /v1/users:
    get:
      operationId: listUsers
      parameters:
        - name: limit
          in: query
          required: true
      responses:
        200:
          description: ok
  /v1/orders/{id}:
    get:
      operationId: getOrder
";

fn specdrift() -> Command {
    Command::cargo_bin("specdrift").unwrap()
}

fn write_fixture(root: &Path) {
    std::fs::write(root.join("old.json"), OLD_SPEC).unwrap();
    std::fs::write(root.join("new.yaml"), NEW_SPEC).unwrap();
    std::fs::create_dir_all(root.join("tests")).unwrap();
    std::fs::write(
        root.join("tests/test_orders.py"),
        "import pytest\n\ndef test_get_order(client):\n    client.get('/v1/orders/7')\n",
    )
    .unwrap();
    std::fs::write(
        root.join("tests/test_health.py"),
        "def test_health(client):\n    client.get('/healthz')\n",
    )
    .unwrap();
}

#[test]
fn test_help_lists_commands() {
    specdrift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("context"));
}

#[test]
fn test_diff_json() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["diff", "--old", "old.json", "--new", "new.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"parameter_change""#))
        .stdout(predicate::str::contains(r#""type":"new_endpoint","path":"/v1/orders/{id}""#));
}

#[test]
fn test_diff_markdown() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["diff", "--old", "old.json", "--new", "new.yaml", "--markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| **total** | 2 |"))
        .stdout(predicate::str::contains("query limit required false -> true"));
}

#[test]
fn test_diff_unparsable_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    std::fs::write(dir.path().join("broken.json"), "{ [").unwrap();
    specdrift()
        .current_dir(dir.path())
        .args(["diff", "--old", "broken.json", "--new", "new.yaml"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_diff_requires_input() {
    let dir = tempfile::tempdir().unwrap();
    specdrift()
        .current_dir(dir.path())
        .arg("diff")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repo"));
}

#[test]
fn test_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["endpoints", "--old", "old.json", "--new", "new.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""/v1/orders""#))
        .stdout(predicate::str::contains(r#""/v1/users""#))
        .stdout(predicate::str::contains(r#""/v1""#).not());
}

#[test]
fn test_rank_markdown() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args([
            "rank", "--old", "old.json", "--new", "new.yaml", "--tests", "tests", "--markdown",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1. `test_orders.py`"));
}

#[test]
fn test_context_prompt() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["context", "--old", "old.json", "--new", "new.yaml", "--tests", "tests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## API changes"))
        .stdout(predicate::str::contains("### `test_orders.py` (pytest)"))
        .stdout(predicate::str::contains("```python"));
}

#[test]
fn test_validate() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["validate", "--input", "new.yaml"])
        .assert()
        .success()
        .stdout("Valid: 2 paths, 2 operations\n");

    std::fs::write(dir.path().join("bad.txt"), "{ [").unwrap();
    specdrift()
        .current_dir(dir.path())
        .args(["validate", "--input", "bad.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid"));
}

#[test]
fn test_list_tests_json() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    specdrift()
        .current_dir(dir.path())
        .args(["list", "tests", "--tests", "tests", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""count": 2"#));
}
