use assert_cmd::Command;
use predicates::prelude::*;

const SPEC: &str = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Users", "version": "1.0"},
  "servers": [{"url": "http://127.0.0.1:9"}],
  "paths": {
    "/users": {
      "get": {"operationId": "getUsers", "tags": ["users"]},
      "post": {"operationId": "createUser", "tags": ["admin"]}
    },
    "/users/{id}": {
      "get": {
        "operationId": "getUser",
        "tags": ["users"],
        "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}]
      }
    }
  }
}"#;

fn apiforge(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("apiforge").expect("binary builds");
    cmd.current_dir(dir.path())
        .env_remove("OPENAPI_SPEC_PATH")
        .env_remove("OPENAPI_SPEC_INLINE")
        .env_remove("OPENAPI_SPEC_FROM_STDIN")
        .env_remove("API_BASE_URL")
        .env_remove("API_HEADERS")
        .env_remove("INCLUDE_TAGS")
        .env("RUST_LOG", "warn");
    cmd
}

fn spec_file(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("openapi.json");
    std::fs::write(&path, SPEC).expect("write spec");
    path.display().to_string()
}

#[test]
fn version_prints_package_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    apiforge(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn list_prints_names_and_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = spec_file(&dir);
    apiforge(&dir)
        .args(["list", "--spec", &spec])
        .assert()
        .success()
        .stdout(predicate::str::contains("get-usrs"))
        .stdout(predicate::str::contains("GET::users__---id"))
        .stdout(predicate::str::contains("create-usr"));
}

#[test]
fn list_reads_inline_spec_from_env_and_filters_by_tag() {
    let dir = tempfile::tempdir().expect("tempdir");
    apiforge(&dir)
        .env("OPENAPI_SPEC_INLINE", SPEC)
        .args(["list", "--tag", "admin", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"toolId\": \"POST::users\""))
        .stdout(predicate::str::contains("get-usrs").not());
}

#[test]
fn show_prints_input_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = spec_file(&dir);
    apiforge(&dir)
        .args(["show", "get-usr", "--spec", &spec])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"x-parameter-location\": \"path\""));
}

#[test]
fn missing_spec_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    apiforge(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No spec source configured"));
}

#[test]
fn unknown_tool_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = spec_file(&dir);
    apiforge(&dir)
        .args(["call", "no-such-tool", "--spec", &spec])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tool: no-such-tool"));
}

#[test]
fn missing_path_argument_fails_before_sending() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = spec_file(&dir);
    apiforge(&dir)
        .args(["call", "get-usr", "--args", "{}", "--spec", &spec])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required path parameter 'id'"));
}
