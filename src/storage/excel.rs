use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use std::io::Cursor;

use crate::error::{Result, ScrapingError};
use crate::parser::{Cell, Dataset};
use crate::storage::DatasetFormatter;

pub const SHEET_NAME: &str = "Sheet1";

/// Single-sheet xlsx workbook with a bold header row
pub struct ExcelFormatter;

impl DatasetFormatter for ExcelFormatter {
    fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, name) in dataset.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, column_index(col)?, name, &header)?;
        }

        for (i, row) in dataset.rows().iter().enumerate() {
            let row_index = u32::try_from(i + 1)
                .map_err(|_| ScrapingError::ExportError("Too many rows for a worksheet".to_string()))?;
            for (col, cell) in row.iter().enumerate() {
                let col = column_index(col)?;
                match cell {
                    Cell::Int(n) => {
                        worksheet.write_number(row_index, col, *n as f64)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(row_index, col, s)?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Dataset> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook.worksheet_range(SHEET_NAME)?;

        let mut rows = range.rows();
        let columns: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
            None => return Ok(Dataset::empty()),
        };

        let body = rows
            .map(|row| row.iter().map(data_to_cell).collect())
            .collect();

        Dataset::new(columns, body)
    }

    fn file_extension(&self) -> &str {
        "xlsx"
    }

    fn mime_type(&self) -> &str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| ScrapingError::ExportError("Too many columns for a worksheet".to_string()).into())
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(n) => Cell::Int(*n),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Cell::Int(*f as i64),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Empty => Cell::Text(String::new()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_zip_container() {
        let dataset = Dataset::new(
            vec!["User".to_string(), "Score".to_string()],
            vec![vec![Cell::from("budi"), Cell::Int(5)]],
        )
        .unwrap();

        let bytes = ExcelFormatter.encode(&dataset).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_decode_numeric_text_stays_text() {
        let dataset = Dataset::new(
            vec!["User".to_string(), "Score".to_string()],
            vec![vec![Cell::from("12345"), Cell::Int(-2)]],
        )
        .unwrap();

        let bytes = ExcelFormatter.encode(&dataset).unwrap();
        let decoded = ExcelFormatter.decode(&bytes).unwrap();
        assert_eq!(decoded.rows()[0][0], Cell::from("12345"));
        assert_eq!(decoded.rows()[0][1], Cell::Int(-2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(ExcelFormatter.decode(b"not a workbook").is_err());
    }
}
