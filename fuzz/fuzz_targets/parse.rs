#![no_main]

use ctegraph_core::{parse_sql_with_dialect, Dialect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let _ = parse_sql_with_dialect(sql, Dialect::Bigquery);
    }
});
