//! CSV import and export for worksheets

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::value::CellValue;
use crate::worksheet::Worksheet;

/// Read a CSV file into a worksheet named after the file stem.
///
/// Every record, including the header line, becomes a sheet row starting at
/// A1, so the header row is what the table view later uses as column names.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Worksheet> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    read(File::open(path)?, name)
}

/// Read CSV from any reader into a worksheet
pub fn read<R: Read>(reader: R, sheet_name: &str) -> Result<Worksheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut worksheet = Worksheet::new(sheet_name);
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        for (col, field) in record.iter().enumerate() {
            worksheet.set_at(row as u32, col as u16, CellValue::detect(field));
        }
    }

    Ok(worksheet)
}

/// Write the used range of a worksheet to a CSV file
pub fn write_file<P: AsRef<Path>>(worksheet: &Worksheet, path: P) -> Result<()> {
    write(worksheet, File::create(path)?)
}

/// Write the used range of a worksheet to any writer.
///
/// Rows start at the used range, so leading empty rows/columns are not kept.
pub fn write<W: Write>(worksheet: &Worksheet, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

    for row in worksheet.used_rows() {
        let record: Vec<String> = row.iter().map(CellValue::to_string).collect();
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
