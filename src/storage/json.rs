use serde_json::{Map, Value};

use crate::error::{Result, ScrapingError};
use crate::parser::{Cell, Dataset};
use crate::storage::DatasetFormatter;

/// An array of row objects, keys in column order.
///
/// Column names live only in the row keys, so a dataset with no rows exports
/// as `[]` and imports back as an empty dataset with no columns.
pub struct JsonFormatter;

impl DatasetFormatter for JsonFormatter {
    fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let records: Vec<Map<String, Value>> = dataset
            .rows()
            .iter()
            .map(|row| {
                dataset
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = match cell {
                            Cell::Int(n) => Value::from(*n),
                            Cell::Text(s) => Value::from(s.as_str()),
                        };
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Ok(serde_json::to_vec_pretty(&records)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Dataset> {
        let records: Vec<Map<String, Value>> = serde_json::from_slice(bytes)
            .map_err(|e| ScrapingError::ParseError(format!("JSON export is not an array of objects: {}", e)))?;

        // column names only survive through the rows
        let columns: Vec<String> = match records.first() {
            Some(first) => first.keys().cloned().collect(),
            None => return Ok(Dataset::empty()),
        };

        let mut rows = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = record.get(column).ok_or_else(|| {
                    ScrapingError::ParseError(format!("Row {} has no {:?} field", index, column))
                })?;
                row.push(value_to_cell(value));
            }
            rows.push(row);
        }

        Dataset::new(columns, rows)
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn mime_type(&self) -> &str {
        "application/json"
    }
}

fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => Cell::Text(n.to_string()),
        },
        Value::String(s) => Cell::Text(s.clone()),
        Value::Null => Cell::Text(String::new()),
        other => Cell::Text(other.to_string()),
    }
}
