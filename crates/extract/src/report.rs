use std::io::Write;

use reten_core::{ConsolidatedRow, OutputConfig, HEADER};

/// Serialize rows as delimited text with a header line, UTF-8 encoded.
pub fn write_csv<W: Write>(
    writer: W,
    rows: &[ConsolidatedRow],
    config: &OutputConfig,
) -> Result<(), csv::Error> {
    let mut w = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .from_writer(writer);

    w.write_record(HEADER)?;
    for row in rows {
        w.write_record(row.record())?;
    }
    w.flush()?;
    Ok(())
}

/// In-memory variant for callers that hand the bytes on (downloads, stdout).
pub fn csv_bytes(rows: &[ConsolidatedRow], config: &OutputConfig) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows, config)?;
    Ok(buf)
}
