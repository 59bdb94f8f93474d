#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const VALID_CONFIG: &str = r#"
accounts:
  - account_id: "111111111111"
    role_arn: "arn:aws:iam::111111111111:role/InventoryReader"
regions: [ap-northeast-2]
spreadsheet_id: "1AbC"
"#;

const OVERRIDE_VARS: [&str; 10] = [
    "AWS_ACCOUNTS",
    "AWS_ACCOUNT_ID",
    "AWS_ROLE_ARN",
    "AWS_EXTERNAL_ID",
    "AWS_SESSION_NAME",
    "AWS_DEFAULT_REGION",
    "AWS_SERVICES",
    "GOOGLE_SHEETS_ID",
    "SKYTALLY_CONCURRENCY",
    "SKYTALLY_CONFIG_PATH",
];

/// Command isolated from the caller's configuration and environment.
fn skytally(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skytally").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("GOOGLE_OAUTH_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    for var in OVERRIDE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn with_config(content: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("skytally.yaml"), content).unwrap();
    dir
}

/// CLIヘルプにサブコマンドが表示されることを確認
#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("collect"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("regions"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skytally"));
}

#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path()).arg("invalid-command").assert().failure();
}

#[test]
fn test_collect_help() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .args(["collect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--services"))
        .stdout(predicate::str::contains("--concurrency"));
}

#[test]
fn test_diff_requires_dates() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .args(["diff", "--service", "ec2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source"));
}

#[test]
fn test_regions_catalogue_offline() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .arg("regions")
        .assert()
        .success()
        .stdout(predicate::str::contains("ap-northeast-2"))
        .stdout(predicate::str::contains("Asia Pacific (Seoul)"));
}

/// 設定が無い場合は全ての問題を報告して失敗する
#[test]
fn test_validate_without_config_reports_problems() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no accounts configured"))
        .stderr(predicate::str::contains("spreadsheet_id"))
        .stderr(predicate::str::contains("GOOGLE_OAUTH_ACCESS_TOKEN"));
}

#[test]
fn test_validate_valid_config() {
    let dir = with_config(VALID_CONFIG);
    skytally(dir.path())
        .env("GOOGLE_OAUTH_ACCESS_TOKEN", "token")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("111111111111"));
}

#[test]
fn test_validate_env_only_config() {
    let dir = tempfile::tempdir().unwrap();
    skytally(dir.path())
        .env(
            "AWS_ACCOUNTS",
            "111111111111:arn:aws:iam::111111111111:role/Reader",
        )
        .env("GOOGLE_SHEETS_ID", "1AbC")
        .env("GOOGLE_OAUTH_ACCESS_TOKEN", "token")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("environment only"));
}

#[test]
fn test_malformed_config_exits_with_config_error() {
    let dir = with_config("accounts: [unterminated");
    skytally(dir.path())
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

/// 不明なサービスはネットワーク呼び出し前に失敗する
#[test]
fn test_collect_unknown_service_fails_before_collection() {
    let dir = with_config(VALID_CONFIG);
    skytally(dir.path())
        .args(["collect", "--dry-run", "--services", "ec2,lambda"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Collecting").not())
        .stderr(predicate::str::contains("lambda"));
}

#[test]
fn test_collect_unknown_account_fails_before_collection() {
    let dir = with_config(VALID_CONFIG);
    skytally(dir.path())
        .args(["collect", "--dry-run", "--accounts", "999999999999"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Collecting").not())
        .stderr(predicate::str::contains("unknown account"));
}

#[test]
fn test_collect_without_token_fails_before_collection() {
    let dir = with_config(VALID_CONFIG);
    skytally(dir.path())
        .arg("collect")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Collecting").not())
        .stderr(predicate::str::contains("GOOGLE_OAUTH_ACCESS_TOKEN"));
}

#[test]
fn test_diff_rejects_malformed_date() {
    let dir = with_config(VALID_CONFIG);
    skytally(dir.path())
        .args([
            "diff",
            "--service",
            "ec2",
            "--source",
            "2024-11-13",
            "--target",
            "20241114",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYYMMDD"));
}
