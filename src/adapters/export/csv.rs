//! CSV rendering of the prediction history.
//!
//! Fields are written verbatim with no quoting. `Result` is always one of the
//! two fixed label texts, neither of which contains a comma; any free-text column
//! added later needs real escaping.

use std::fmt::Write;

use crate::domain::PredictionRecord;

/// Fixed header line.
pub const CSV_HEADER: &str = "ID,Age,Parity,Mode,Haemoglobin,PreviousPPH,ProlongedLabor,Result";

/// One CSV row, without the trailing newline.
#[must_use]
pub fn csv_row(record: &PredictionRecord) -> String {
    let i = &record.inputs;
    format!(
        "{},{},{},{},{:.1},{},{},{}",
        record.id,
        i.age,
        i.parity,
        i.delivery_mode.code(),
        i.haemoglobin,
        u8::from(i.previous_pph),
        u8::from(i.prolonged_labor),
        record.label
    )
}

/// Render the header plus one line per record, in the given order.
#[must_use]
pub fn to_csv(records: &[PredictionRecord]) -> String {
    let mut out = String::with_capacity((records.len() + 1) * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", csv_row(record));
    }
    out
}
