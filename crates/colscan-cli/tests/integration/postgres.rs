//! PostgreSQL integration tests. Requires `DATABASE_URL`.

use crate::{expected_matches, run_cli, run_cli_success, stdout_json};

fn postgres_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test")
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_scan() {
    let output = run_cli_success(&[
        "scan",
        "--url",
        &postgres_url(),
        "--schema",
        "public",
        "-f",
        "json",
    ]);

    let json = stdout_json(&output);
    assert_eq!(json["matches"], expected_matches());
    assert_eq!(json["diagnostics"]["targetTable"], "public.ProcessSteps");
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_search_text_is_not_a_pattern() {
    let output = run_cli_success(&[
        "scan",
        "--url",
        &postgres_url(),
        "--search",
        "S-FXM-%",
        "-f",
        "json",
    ]);

    assert_eq!(stdout_json(&output)["matches"], serde_json::json!([]));
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_primary_keys() {
    let output = run_cli_success(&["primary-keys", "--url", &postgres_url(), "-f", "json"]);

    let json = stdout_json(&output);
    let rows = json.as_array().expect("array");
    let step_tools: Vec<_> = rows
        .iter()
        .filter(|row| row["tableName"] == "StepTools")
        .map(|row| (row["columnName"].clone(), row["keyOrdinal"].clone()))
        .collect();
    assert_eq!(
        step_tools,
        vec![
            (serde_json::json!("StepId"), serde_json::json!(1)),
            (serde_json::json!("ToolId"), serde_json::json!(2)),
        ]
    );
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_missing_table() {
    let output = run_cli(&["scan", "--url", &postgres_url(), "--table", "NoSuchTable"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_integer_literal_against_text_column() {
    let output = run_cli_success(&[
        "scan",
        "--url",
        &postgres_url(),
        "--table",
        "LegacySteps",
        "-f",
        "json",
    ]);

    let json = stdout_json(&output);
    assert_eq!(json["matches"], expected_matches());
    assert_eq!(
        json["diagnostics"]["rowFilter"],
        "ProcessNumber = '10402' OR ProcessID = 93"
    );
    assert_eq!(
        json["diagnostics"]["warnings"].as_array().map(Vec::len),
        Some(1)
    );
}

#[test]
#[ignore = "Requires a PostgreSQL database connection"]
fn test_postgres_foreign_keys_and_join_path() {
    let output = run_cli_success(&["foreign-keys", "--url", &postgres_url(), "-f", "json"]);

    let json = stdout_json(&output);
    let links: Vec<_> = json
        .as_array()
        .expect("array")
        .iter()
        .filter(|row| row["tableName"] == "StepTools")
        .map(|row| {
            (
                row["columnName"].as_str().unwrap_or_default().to_string(),
                row["referencedTable"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(links.len(), 2);
    assert!(links.contains(&("ToolId".to_string(), "Tools".to_string())));
    assert!(links.contains(&("StepId".to_string(), "ProcessSteps".to_string())));

    let output = run_cli_success(&[
        "join-path",
        "Tools",
        "ProcessSteps",
        "--url",
        &postgres_url(),
        "-f",
        "json",
    ]);
    let json = stdout_json(&output);
    assert_eq!(json["path"]["steps"].as_array().map(Vec::len), Some(3));
}
