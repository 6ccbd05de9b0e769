use crate::error::ScoutError;
use crate::models::ListingRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which export files to write after a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Both,
    Skip,
}

impl ExportFormat {
    pub fn wants_csv(&self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }

    pub fn wants_json(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    location: &'a str,
    timestamp: String,
    properties: &'a [ListingRecord],
}

/// Writes crawl results into an export directory
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, location: &str, captured: &DateTime<Local>, extension: &str) -> PathBuf {
        let clean: String = location
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!(
            "{}_{}.{}",
            clean,
            captured.format("%Y%m%d_%H%M%S"),
            extension
        ))
    }

    /// One row per record under a fixed header. Nothing is written for an
    /// empty record set.
    pub async fn export_csv(&self, records: &[ListingRecord], location: &str) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            return Ok(None);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ScoutError::Export(e.to_string()))?;

        let path = self.path_for(location, &Local::now(), "csv");
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("💾 Exported {} properties to {}", records.len(), path.display());
        Ok(Some(path))
    }

    /// A single document holding the location, capture time and records
    pub async fn export_json(&self, records: &[ListingRecord], location: &str) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            return Ok(None);
        }

        let captured = Local::now();
        let document = JsonExport {
            location,
            timestamp: captured.to_rfc3339(),
            properties: records,
        };
        let json = serde_json::to_string_pretty(&document)?;

        let path = self.path_for(location, &captured, "json");
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("💾 Exported {} properties to {}", records.len(), path.display());
        Ok(Some(path))
    }

    /// Write every file `format` asks for
    pub async fn export(
        &self,
        format: ExportFormat,
        records: &[ListingRecord],
        location: &str,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if format.wants_csv() {
            written.extend(self.export_csv(records, location).await?);
        }
        if format.wants_json() {
            written.extend(self.export_json(records, location).await?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records() -> Vec<ListingRecord> {
        vec![
            ListingRecord {
                address: "1 Main St, Tampa, FL".to_string(),
                price: "$500,000".to_string(),
                beds: "3".to_string(),
                baths: "2".to_string(),
                sqft: "1,200".to_string(),
                property_type: "House for sale".to_string(),
            },
            ListingRecord {
                address: "2 Oak Ave".to_string(),
                price: "$310,000".to_string(),
                beds: "Studio".to_string(),
                baths: "N/A".to_string(),
                sqft: "N/A".to_string(),
                property_type: "N/A".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_csv_export_has_header_and_rows() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path().join("exports")).await.unwrap();

        let path = storage.export_csv(&records(), "Tampa, FL").await.unwrap().unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Tampa__FL_"));
        assert!(name.ends_with(".csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("address,price,beds,baths,sqft,property_type"));
        assert_eq!(
            lines.next(),
            Some(r#""1 Main St, Tampa, FL","$500,000",3,2,"1,200",House for sale"#)
        );
        assert_eq!(lines.count(), 1);
    }

    #[tokio::test]
    async fn test_json_export_document() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path()).await.unwrap();

        let path = storage.export_json(&records(), "Tampa, FL").await.unwrap().unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["location"], "Tampa, FL");
        assert!(doc["timestamp"].as_str().is_some());
        assert_eq!(doc["properties"].as_array().unwrap().len(), 2);
        assert_eq!(doc["properties"][1]["beds"], "Studio");
    }

    #[tokio::test]
    async fn test_empty_results_are_not_exported() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path()).await.unwrap();

        let written = storage.export(ExportFormat::Both, &[], "Tampa, FL").await.unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_skip_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path()).await.unwrap();

        let written = storage.export(ExportFormat::Skip, &records(), "Tampa, FL").await.unwrap();
        assert!(written.is_empty());
    }
}
