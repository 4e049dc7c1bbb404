pub mod csv;
pub mod excel;
pub mod json;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Result, ScrapingError};
use crate::parser::{Dataset, Platform};

pub use self::csv::CsvFormatter;
pub use self::excel::ExcelFormatter;
pub use self::json::JsonFormatter;

/// Serialized form of a dataset, both directions
pub trait DatasetFormatter {
    fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Dataset>;
    fn file_extension(&self) -> &str;
    fn mime_type(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(alias = "xlsx")]
    #[value(alias = "xlsx")]
    Excel,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Excel, ExportFormat::Csv, ExportFormat::Json];

    pub fn formatter(&self) -> Box<dyn DatasetFormatter + Send + Sync> {
        match self {
            ExportFormat::Excel => Box::new(ExcelFormatter),
            ExportFormat::Csv => Box::new(CsvFormatter),
            ExportFormat::Json => Box::new(JsonFormatter),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ExportFormat {
    type Err = ScrapingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ScrapingError::ExportError(format!("Unsupported format: {}", other))),
        }
    }
}

/// A dataset ready to be handed out as a download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

pub fn export_dataset(dataset: &Dataset, format: ExportFormat, platform: Platform) -> Result<ExportedFile> {
    let formatter = format.formatter();
    let bytes = formatter.encode(dataset)?;
    debug!("Encoded {} rows as {} ({} bytes)", dataset.len(), format, bytes.len());

    Ok(ExportedFile {
        bytes,
        mime_type: formatter.mime_type().to_string(),
        file_name: format!("{}_comments.{}", platform.slug(), formatter.file_extension()),
    })
}

pub fn import_dataset(bytes: &[u8], format: ExportFormat) -> Result<Dataset> {
    format.formatter().decode(bytes)
}

/// Writes exports under `<output_dir>/<platform>/`
pub struct FileExporter {
    output_dir: PathBuf,
}

impl FileExporter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub async fn save(&self, dataset: &Dataset, platform: Platform, format: ExportFormat) -> Result<PathBuf> {
        self.save_at(dataset, platform, format, Local::now()).await
    }

    pub async fn save_at(
        &self,
        dataset: &Dataset,
        platform: Platform,
        format: ExportFormat,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf> {
        let exported = export_dataset(dataset, format, platform)?;
        let file_path = self.get_file_path(platform, format, timestamp);

        self.ensure_directory_exists(&file_path).await?;
        tokio::fs::write(&file_path, &exported.bytes)
            .await
            .map_err(|e| ScrapingError::ExportError(format!("Failed to write {}: {}", file_path.display(), e)))?;

        info!("Saved {} {} rows to {}", dataset.len(), platform, file_path.display());
        Ok(file_path)
    }

    fn get_file_path(&self, platform: Platform, format: ExportFormat, timestamp: DateTime<Local>) -> PathBuf {
        let filename = format!(
            "{}_comments_{}.{}",
            platform.slug(),
            timestamp.format("%Y%m%d_%H%M%S"),
            format.extension()
        );

        self.output_dir.join(platform.slug()).join(filename)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScrapingError::ExportError(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Cell, CommentRecord};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn tiktok_dataset() -> Dataset {
        let records = vec![
            CommentRecord::new(
                "2024-01-02 03:04:05".to_string(),
                "alpha".to_string(),
                "first, with a comma".to_string(),
                vec![12],
            ),
            CommentRecord::new(
                "2024-01-02 04:00:00".to_string(),
                "beta".to_string(),
                "line one\nline \"two\"".to_string(),
                vec![0],
            ),
        ];
        Dataset::from_records(Platform::TikTok, &records)
    }

    #[test]
    fn test_export_names_and_mime_types() {
        let dataset = tiktok_dataset();

        let excel = export_dataset(&dataset, ExportFormat::Excel, Platform::PlayStore).unwrap();
        assert_eq!(excel.file_name, "playstore_comments.xlsx");
        assert_eq!(
            excel.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        let csv = export_dataset(&dataset, ExportFormat::Csv, Platform::TikTok).unwrap();
        assert_eq!(csv.file_name, "tiktok_comments.csv");
        assert_eq!(csv.mime_type, "text/csv");

        let json = export_dataset(&dataset, ExportFormat::Json, Platform::YouTube).unwrap();
        assert_eq!(json.file_name, "youtube_comments.json");
        assert_eq!(json.mime_type, "application/json");
    }

    #[test]
    fn test_round_trip_every_format() {
        let dataset = tiktok_dataset();
        for format in ExportFormat::ALL {
            let exported = export_dataset(&dataset, format, Platform::TikTok).unwrap();
            let imported = import_dataset(&exported.bytes, format).unwrap();
            assert_eq!(imported, dataset, "round trip through {}", format);
        }
    }

    #[test]
    fn test_round_trip_numeric_looking_reviews() {
        let records = vec![
            CommentRecord::new("2024-01-01 00:00:00".to_string(), "12345".to_string(), "10".to_string(), vec![5]),
            CommentRecord::new("2024-01-01 00:01:00".to_string(), "67890".to_string(), "0".to_string(), vec![1]),
        ];
        let dataset = Dataset::from_records(Platform::PlayStore, &records);

        for format in ExportFormat::ALL {
            let exported = export_dataset(&dataset, format, Platform::PlayStore).unwrap();
            let imported = import_dataset(&exported.bytes, format).unwrap();
            assert_eq!(imported, dataset, "round trip through {}", format);
        }
    }

    #[test]
    fn test_round_trip_twitter_columns() {
        let records = vec![CommentRecord::new(
            "2018-10-10 20:19:24".to_string(),
            "TwitterDev".to_string(),
            "emoji 🎉 count".to_string(),
            vec![120, 31],
        )];
        let dataset = Dataset::from_records(Platform::Twitter, &records);

        for format in ExportFormat::ALL {
            let exported = export_dataset(&dataset, format, Platform::Twitter).unwrap();
            let imported = import_dataset(&exported.bytes, format).unwrap();
            assert_eq!(imported.columns(), dataset.columns());
            assert_eq!(imported.rows()[0][3], Cell::Int(120));
            assert_eq!(imported.rows()[0][4], Cell::Int(31));
        }
    }

    #[test]
    fn test_empty_dataset_exports() {
        for format in ExportFormat::ALL {
            let exported = export_dataset(&Dataset::empty(), format, Platform::TikTok).unwrap();
            let imported = import_dataset(&exported.bytes, format).unwrap();
            assert!(imported.is_empty());
            assert!(imported.columns().is_empty());
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert!("parquet".parse::<ExportFormat>().is_err());

        let format: ExportFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, ExportFormat::Json);
    }

    #[tokio::test]
    async fn test_file_exporter_layout() {
        let dir = tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().to_path_buf());
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let path = exporter
            .save_at(&tiktok_dataset(), Platform::TikTok, ExportFormat::Csv, timestamp)
            .await
            .unwrap();

        assert_eq!(
            path,
            dir.path().join("tiktok").join("tiktok_comments_20240309_140507.csv")
        );
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(import_dataset(&bytes, ExportFormat::Csv).unwrap(), tiktok_dataset());
    }

    #[tokio::test]
    async fn test_file_exporter_save_uses_extension() {
        let dir = tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().join("nested"));

        let path = exporter
            .save(&tiktok_dataset(), Platform::YouTube, ExportFormat::Excel)
            .await
            .unwrap();

        assert!(path.starts_with(dir.path().join("nested").join("youtube")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
        assert!(path.exists());
    }
}
