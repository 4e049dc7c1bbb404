use crate::error::{Result, ScrapingError};
use crate::parser::{Cell, Dataset, Platform};
use crate::storage::DatasetFormatter;

/// Header row then one record per row, no index column
pub struct CsvFormatter;

impl DatasetFormatter for CsvFormatter {
    fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        if dataset.columns().is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(dataset.columns())?;
        for row in dataset.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| ScrapingError::ExportError(format!("CSV flush failed: {}", e)).into())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Dataset> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Dataset::empty());
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            raw.push(record?.iter().map(str::to_string).collect());
        }

        // a column is numeric only when every value in it is, and never for dates, users or bodies
        let numeric: Vec<bool> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                !raw.is_empty()
                    && !Platform::is_text_column(name)
                    && raw
                        .iter()
                        .all(|row| row.get(i).map_or(false, |v| v.parse::<i64>().is_ok()))
            })
            .collect();

        let rows = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(i, value)| match value.parse::<i64>() {
                        Ok(n) if numeric.get(i).copied().unwrap_or(false) => Cell::Int(n),
                        _ => Cell::Text(value),
                    })
                    .collect()
            })
            .collect();

        Dataset::new(columns, rows)
    }

    fn file_extension(&self) -> &str {
        "csv"
    }

    fn mime_type(&self) -> &str {
        "text/csv"
    }
}
