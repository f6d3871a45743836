//! Output formatting modules.

pub mod csv;
pub mod json;
pub mod table;

pub use self::csv::{format_csv, format_join_path_csv, format_scan_csv};
pub use json::format_json;
pub use table::{
    format_columns, format_foreign_keys, format_join_path, format_primary_keys,
    format_scan_report,
};
