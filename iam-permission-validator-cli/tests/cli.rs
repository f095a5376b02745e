use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

const REPORTS_ARN: &str = "arn:aws:iam::123456789012:policy/reports";

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn snapshot() -> Value {
    json!({
        "roles": {
            "reporter": [{"arn": REPORTS_ARN, "name": "reports"}]
        },
        "policies": {
            REPORTS_ARN: {
                "defaultVersionId": "v3",
                "versions": {
                    "v3": {
                        "Version": "2012-10-17",
                        "Statement": [
                            {"Effect": "Allow", "Action": "s3:Get*", "Resource": "arn:aws:s3:::reports/*"},
                            {"Effect": "Deny", "Action": "s3:GetObjectAcl", "Resource": "*"}
                        ]
                    }
                }
            }
        }
    })
}

fn role_rules(actions: &[&str]) -> Value {
    json!({
        "iamRoleRules": [{
            "iamRoleName": "reporter",
            "iamPolicies": [{
                "name": "reports-read",
                "version": "1",
                "statements": [{
                    "effect": "Allow",
                    "actions": actions,
                    "resources": ["arn:aws:s3:::reports/2024"]
                }]
            }]
        }]
    })
}

fn validator() -> Command {
    let mut cmd = Command::cargo_bin("iam-permission-validator").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_schema_lists_rule_kinds() {
    validator()
        .args(["schema", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("iamRoleRules"))
        .stdout(predicate::str::contains("iamPolicyArn"));
}

#[test]
fn test_validate_passing_rules() {
    let dir = TempDir::new().unwrap();
    let rules = write_json(&dir, "rules.json", &role_rules(&["s3:GetObject"]));
    let snapshot = write_json(&dir, "snapshot.json", &snapshot());

    let output = validator()
        .arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["result"]["state"], "Succeeded");
    assert_eq!(
        reports[0]["result"]["condition"]["validationRule"],
        "validation-reporter"
    );
    assert!(reports[0].get("error").is_none());
}

#[test]
fn test_validate_failing_rules_exit_nonzero() {
    let dir = TempDir::new().unwrap();
    let rules = write_json(
        &dir,
        "rules.json",
        &role_rules(&["s3:GetObject", "s3:GetObjectAcl", "s3:PutObject"]),
    );
    let snapshot = write_json(&dir, "snapshot.json", &snapshot());

    validator()
        .arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "v1alpha1.IamRoleRule reporter missing action(s): [s3:GetObjectAcl s3:PutObject] for resource arn:aws:s3:::reports/2024 from policy reports-read",
        ));
}

#[test]
fn test_validate_text_format_reports_companion_error() {
    let dir = TempDir::new().unwrap();
    let rules = write_json(
        &dir,
        "rules.json",
        &json!({
            "iamUserRules": [{
                "iamUserName": "nobody",
                "iamPolicies": [{
                    "name": "p",
                    "version": "1",
                    "statements": [{"effect": "Allow", "actions": ["s3:GetObject"], "resources": ["*"]}]
                }]
            }]
        }),
    );
    let snapshot = write_json(&dir, "snapshot.json", &snapshot());

    validator()
        .env("NO_COLOR", "1")
        .arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--snapshot")
        .arg(&snapshot)
        .args(["--format", "text"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("validation-nobody"))
        .stdout(predicate::str::contains("no policies found for IAM user nobody"))
        .stdout(predicate::str::contains("1 rule(s) evaluated, 0 passed, 1 failed"));
}

#[test]
fn test_validate_missing_rules_file() {
    let dir = TempDir::new().unwrap();

    validator()
        .arg("validate")
        .arg("--rules")
        .arg(dir.path().join("absent.json"))
        .arg("--snapshot")
        .arg(dir.path().join("snapshot.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load rules"));
}

#[test]
fn test_validate_rejects_invalid_rule() {
    let dir = TempDir::new().unwrap();
    let rules = write_json(&dir, "rules.json", &role_rules(&[]));
    let snapshot = write_json(&dir, "snapshot.json", &snapshot());

    validator()
        .arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rule validation-reporter"));
}

#[test]
fn test_validate_empty_rules_file_succeeds() {
    let dir = TempDir::new().unwrap();
    let rules = write_json(&dir, "rules.json", &json!({}));

    validator()
        .arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--snapshot")
        .arg(dir.path().join("unused.json"))
        .assert()
        .success()
        .stderr(predicate::str::contains("no rules found"));
}
