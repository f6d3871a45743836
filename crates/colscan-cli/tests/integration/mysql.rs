//! MySQL integration tests. Requires `MYSQL_URL`.

use crate::{expected_matches, run_cli_success, stdout_json};

fn mysql_url() -> String {
    std::env::var("MYSQL_URL").expect("MYSQL_URL must be set for this test")
}

#[test]
#[ignore = "Requires a MySQL database connection"]
fn test_mysql_scan_in_current_database() {
    let output = run_cli_success(&["scan", "--url", &mysql_url(), "-f", "json"]);

    assert_eq!(stdout_json(&output)["matches"], expected_matches());
}

#[test]
#[ignore = "Requires a MySQL database connection"]
fn test_mysql_primary_keys() {
    let output = run_cli_success(&["primary-keys", "--url", &mysql_url(), "-f", "json"]);

    let json = stdout_json(&output);
    let first = &json.as_array().expect("array")[0];
    assert_eq!(first["tableName"], "ProcessSteps");
    assert_eq!(first["constraintName"], "PRIMARY");
    assert_eq!(first["columnName"], "StepId");
}

#[test]
#[ignore = "Requires a MySQL database connection"]
fn test_mysql_index_export() {
    let output = run_cli_success(&["index", "--url", &mysql_url(), "--source", "plant"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("SOURCE_SCHEMA,TABLE_SCHEMA,TABLE_NAME,COLUMN_NAME\n"));
    assert!(stdout.contains(",ProcessSteps,Notes\n"));
}

#[test]
#[ignore = "Requires a MySQL database connection"]
fn test_mysql_foreign_keys_in_current_database() {
    let output = run_cli_success(&["foreign-keys", "--url", &mysql_url(), "-f", "json"]);

    let json = stdout_json(&output);
    let constraints: Vec<_> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|row| row["constraintName"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(constraints, vec!["FK_StepTools_Steps", "FK_StepTools_Tools"]);
    assert_eq!(json[1]["referencedColumn"], "ToolId");
}
