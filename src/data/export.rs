use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::RecordTable;

/// Write `table` as comma-delimited UTF-8 with a header row. Missing cells
/// are written as empty fields.
pub fn write_csv<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.columns.iter().map(|c| c.name.as_str()))
        .context("writing CSV header")?;
    for (i, record) in table.rows.iter().enumerate() {
        out.write_record(record.values.iter().map(|v| v.to_string()))
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    out.flush().context("flushing CSV")?;
    Ok(())
}

pub fn save_csv(table: &RecordTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, std::io::BufWriter::new(file))?;
    log::info!("Exported {} records to {}", table.len(), path.display());
    Ok(())
}
