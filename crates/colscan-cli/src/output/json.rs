//! JSON output formatting.

use serde::Serialize;

/// Format any report as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colscan_core::{MatchResult, PrimaryKeyRow};

    #[test]
    fn test_json_pretty() {
        let matches = vec![MatchResult::new("Notes", 2)];

        let json = format_json(&matches, false).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"columnName\": \"Notes\""));
    }

    #[test]
    fn test_json_compact() {
        let rows = vec![PrimaryKeyRow {
            table_name: "Orders".to_string(),
            constraint_name: "PK_Orders".to_string(),
            column_name: "Id".to_string(),
            key_ordinal: 1,
        }];

        let json = format_json(&rows, true).unwrap();
        assert_eq!(
            json,
            r#"[{"tableName":"Orders","constraintName":"PK_Orders","columnName":"Id","keyOrdinal":1}]"#
        );
    }
}
