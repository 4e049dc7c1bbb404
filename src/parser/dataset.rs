use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScrapingError};
use crate::parser::comment_record::{CommentRecord, Platform};

/// A single table value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Text(String),
}

impl Cell {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(value) => Some(*value),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(value) => write!(f, "{}", value),
            Cell::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

/// Ordered columns and rows of cells; every row is as wide as the header
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// The result handed back when a scrape fails: no columns, no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ScrapingError::ParseError(format!(
                "Row {} has {} cells but the table has {} columns",
                index,
                row.len(),
                columns.len()
            ))
            .into());
        }

        Ok(Self { columns, rows })
    }

    // lay records out under the platform's column set
    pub fn from_records(platform: Platform, records: &[CommentRecord]) -> Self {
        let columns = platform.columns();
        let metric_count = platform.metric_columns().len();

        let rows = records
            .iter()
            .map(|record| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(Cell::Text(record.date.clone()));
                row.push(Cell::Text(record.user.clone()));
                row.push(Cell::Text(record.text.clone()));
                for i in 0..metric_count {
                    row.push(Cell::Int(record.engagement.get(i).copied().unwrap_or(0)));
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    // every value of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<CommentRecord> {
        vec![
            CommentRecord::new(
                "2024-01-02 03:04:05".to_string(),
                "alice".to_string(),
                "great app".to_string(),
                vec![5],
            ),
            CommentRecord::new(
                "2024-01-03 00:00:00".to_string(),
                "bob".to_string(),
                "keeps crashing".to_string(),
                vec![1],
            ),
        ]
    }

    #[test]
    fn test_from_records_uses_platform_columns() {
        let dataset = Dataset::from_records(Platform::PlayStore, &sample_records());

        assert_eq!(dataset.columns(), &["Date", "User", "Content", "Score"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0][1], Cell::from("alice"));
        assert_eq!(dataset.rows()[1][3], Cell::Int(1));
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let record = CommentRecord::new(
            "2024-01-02 03:04:05".to_string(),
            "carol".to_string(),
            "hello".to_string(),
            vec![7],
        );
        let dataset = Dataset::from_records(Platform::Twitter, &[record]);

        assert_eq!(dataset.rows()[0][3], Cell::Int(7));
        assert_eq!(dataset.rows()[0][4], Cell::Int(0));
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let columns = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec![Cell::from("x"), Cell::Int(1)], vec![Cell::from("y")]];
        assert!(Dataset::new(columns, rows).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::empty();
        assert!(dataset.is_empty());
        assert!(dataset.columns().is_empty());
    }

    #[test]
    fn test_column_lookup() {
        let dataset = Dataset::from_records(Platform::PlayStore, &sample_records());
        let scores: Vec<i64> = dataset
            .column("Score")
            .unwrap()
            .iter()
            .filter_map(|c| c.as_int())
            .collect();
        assert_eq!(scores, vec![5, 1]);
        assert!(dataset.column("Likes").is_none());
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let row = vec![Cell::from("bob"), Cell::Int(3)];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["bob",3]"#);
    }
}
