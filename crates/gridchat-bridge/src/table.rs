//! Turns a worksheet's used range into the record table the client sees.

use gridchat_core::{CellAddress, CellValue, Worksheet};
use gridchat_protocol::SheetData;
use serde_json::{Map, Value};

use crate::error::HostError;

/// Sheets with more data rows than this are sent without a cell mapping.
pub const CELL_MAPPING_MAX_ROWS: usize = 100;

/// Build the `SheetData` payload for a worksheet.
///
/// The first row of the used range is the header. Blank headers become
/// `Unnamed: N` and repeated headers get a `.1`, `.2`... suffix so every
/// record key is unique.
pub fn sheet_data(
    workbook: &str,
    worksheet: &Worksheet,
    include_cell_mapping: bool,
) -> Result<SheetData, HostError> {
    let range = worksheet.used_range().ok_or(HostError::NoData)?;
    let rows = worksheet.used_rows();
    let (header, body) = rows.split_first().ok_or(HostError::NoData)?;
    if body.is_empty() {
        return Err(HostError::NoData);
    }

    let columns = column_names(header);

    let data: Vec<Map<String, Value>> = body
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect()
        })
        .collect();

    let cell_mapping = (include_cell_mapping && body.len() <= CELL_MAPPING_MAX_ROWS).then(|| {
        let mut mapping = Map::new();
        for (i, row) in body.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                // Data starts one row below the header row.
                let addr = CellAddress::new(range.start.row + 1 + i as u32, range.start.col + j as u16);
                mapping.insert(addr.to_a1_string(), value.to_json());
            }
        }
        mapping
    });

    Ok(SheetData {
        workbook: workbook.to_string(),
        sheet: worksheet.name().to_string(),
        shape: [body.len(), columns.len()],
        data,
        cell_mapping,
    })
}

fn column_names(header: &[CellValue]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (i, cell) in header.iter().enumerate() {
        let base = match cell {
            CellValue::Empty => format!("Unnamed: {i}"),
            other => other.to_string(),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn people() -> Worksheet {
        let data = "Name,Age,Score\nAlice,25,95.5\nBob,30,87.2\nCharlie,35,92.8\n";
        gridchat_core::csv::read(data.as_bytes(), "Sheet1").unwrap()
    }

    #[test]
    fn test_records_and_shape() {
        let data = sheet_data("Book1.xlsx", &people(), false).unwrap();
        assert_eq!(data.shape, [3, 3]);
        assert_eq!(data.data.len(), 3);
        assert_eq!(
            Value::Object(data.data[0].clone()),
            json!({"Name": "Alice", "Age": 25, "Score": 95.5})
        );
        let keys: Vec<_> = data.data[0].keys().cloned().collect();
        assert_eq!(keys, vec!["Name", "Age", "Score"]);
        assert!(data.cell_mapping.is_none());
    }

    #[test]
    fn test_cell_mapping_addresses_follow_used_range() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell("B3", "Item").unwrap();
        ws.set_cell("C3", "Qty").unwrap();
        ws.set_cell("B4", "Pens").unwrap();
        ws.set_cell("C4", 4.0).unwrap();

        let data = sheet_data("Book1.xlsx", &ws, true).unwrap();
        let mapping = data.cell_mapping.unwrap();
        assert_eq!(
            Value::Object(mapping),
            json!({"B4": "Pens", "C4": 4})
        );
    }

    #[test]
    fn test_cell_mapping_skipped_for_large_sheets() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell("A1", "n").unwrap();
        for i in 0..=CELL_MAPPING_MAX_ROWS as u32 {
            ws.set_at(i + 1, 0, CellValue::Number(i as f64));
        }
        let data = sheet_data("Book1.xlsx", &ws, true).unwrap();
        assert_eq!(data.shape, [CELL_MAPPING_MAX_ROWS + 1, 1]);
        assert!(data.cell_mapping.is_none());
    }

    #[test]
    fn test_header_only_sheet_has_no_data() {
        let mut ws = Worksheet::new("Sheet1");
        assert_eq!(sheet_data("b", &ws, true).unwrap_err(), HostError::NoData);
        ws.set_cell("A1", "Name").unwrap();
        assert_eq!(sheet_data("b", &ws, true).unwrap_err(), HostError::NoData);
    }

    #[test]
    fn test_column_names_are_unique() {
        let header = vec![
            CellValue::from("x"),
            CellValue::Empty,
            CellValue::from("x"),
        ];
        assert_eq!(column_names(&header), vec!["x", "Unnamed: 1", "x.1"]);
    }
}
