mod common;

use colscan_core::{
    scan_table, Candidate, ForeignKeyRow, MatchMode, PrimaryKeyRow, ScanRequest, SchemaDiagram,
    TableRef,
};
use common::{text, MemoryDatabase, MemoryTable, Value};
use proptest::prelude::*;

const COLUMNS: [&str; 4] = ["Zeta", "Alpha", "Mid", "beta"];

fn table_strategy() -> impl Strategy<Value = Vec<(bool, [String; 4])>> {
    let cell = prop_oneof![
        Just("S-FXM-1".to_string()),
        Just("xx S-FXM-1 yy".to_string()),
        "[a-z]{0,6}",
    ];
    prop::collection::vec(
        (any::<bool>(), [cell.clone(), cell.clone(), cell.clone(), cell]),
        0..12,
    )
}

fn build(rows: &[(bool, [String; 4])], with_candidate: bool) -> MemoryTable {
    let mut table = MemoryTable::new("ProcessSteps");
    if with_candidate {
        table = table.column("ProcessNumber", "varchar");
    }
    for name in COLUMNS {
        table = table.column(name, "nvarchar");
    }
    for (qualifies, cells) in rows {
        let mut values: Vec<(&str, Value)> = COLUMNS
            .iter()
            .zip(cells.iter())
            .map(|(name, cell)| (*name, text(cell)))
            .collect();
        if with_candidate {
            let process = if *qualifies { "10402" } else { "10403" };
            values.push(("ProcessNumber", text(process)));
        }
        table = table.row(&values);
    }
    table
}

fn request() -> ScanRequest {
    ScanRequest::new(
        TableRef::new(None, "ProcessSteps"),
        "S-FXM-1",
        Candidate::text("ProcessNumber", "10402"),
        Candidate::integer("ProcessID", 93),
    )
}

fn key_strategy() -> impl Strategy<Value = (Vec<PrimaryKeyRow>, Vec<ForeignKeyRow>)> {
    let tables = prop::collection::vec("[A-Z][a-zA-Z]{0,30}", 1..40);
    tables.prop_flat_map(|names| {
        let count = names.len();
        let links = prop::collection::vec((0..count, 0..count, "[a-zA-Z]{1,40}"), 0..60);
        (Just(names), links).prop_map(|(names, links)| {
            let primary_keys = names
                .iter()
                .map(|name| PrimaryKeyRow {
                    table_name: name.clone(),
                    constraint_name: format!("PK_{name}"),
                    column_name: "Id".to_string(),
                    key_ordinal: 1,
                })
                .collect();
            let foreign_keys = links
                .into_iter()
                .enumerate()
                .map(|(index, (from, to, column))| ForeignKeyRow {
                    table_name: names[from].clone(),
                    constraint_name: format!("FK_{index}"),
                    column_name: column,
                    referenced_table: names[to].clone(),
                    referenced_column: "Id".to_string(),
                    key_ordinal: 1,
                })
                .collect();
            (primary_keys, foreign_keys)
        })
    })
}

proptest! {
    #[test]
    fn diagram_tables_never_overlap((primary_keys, foreign_keys) in key_strategy()) {
        let diagram = SchemaDiagram::from_keys(&primary_keys, &foreign_keys);

        for (index, table) in diagram.tables.iter().enumerate() {
            for other in &diagram.tables[index + 1..] {
                prop_assert!(!table.overlaps(other), "{} overlaps {}", table.name, other.name);
            }
        }
    }


    #[test]
    fn counts_match_brute_force_and_are_sorted(rows in table_strategy()) {
        let db = MemoryDatabase::with_table(build(&rows, true));
        let report = scan_table(&db, &request()).expect("scan");

        let names: Vec<_> = report.matches.iter().map(|m| m.column_name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(&names, &sorted);

        for (index, name) in COLUMNS.iter().enumerate() {
            let expected = rows
                .iter()
                .filter(|(qualifies, cells)| {
                    *qualifies && MatchMode::Contains.matches(&cells[index], "S-FXM-1")
                })
                .count() as u64;
            let reported = report
                .matches
                .iter()
                .find(|m| m.column_name == *name)
                .map(|m| m.match_count);
            if expected == 0 {
                prop_assert_eq!(reported, None);
            } else {
                prop_assert_eq!(reported, Some(expected));
            }
        }
    }

    #[test]
    fn no_candidate_means_no_results_and_no_probes(rows in table_strategy()) {
        let db = MemoryDatabase::with_table(build(&rows, false));
        let report = scan_table(&db, &request()).expect("scan");

        prop_assert!(report.matches.is_empty());
        prop_assert_eq!(db.probes(), 0);
    }
}
