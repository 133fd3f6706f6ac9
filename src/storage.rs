use crate::chart::{ChartCatalog, ChartSpec, Dataset};
use crate::errors::AppError;
use crate::models::Manifest;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path).await.map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn load_manifest(path: &Path) -> Result<Manifest, StorageError> {
    let manifest: Manifest = load_json(path).await?;
    info!("loaded manifest with {} charts from {}", manifest.data.len(), path.display());
    Ok(manifest)
}

pub async fn load_catalog(path: &Path) -> Result<ChartCatalog, StorageError> {
    let catalog: ChartCatalog = load_json(path).await?;
    info!("loaded {} chart definitions from {}", catalog.charts.len(), path.display());
    Ok(catalog)
}

/// Reads and validates the CSV behind `spec`.
pub async fn load_dataset(static_dir: &Path, spec: &ChartSpec) -> Result<Dataset, AppError> {
    let path = static_dir.join(&spec.data);
    let bytes = fs::read(&path).await?;
    let dataset = Dataset::from_reader(bytes.as_slice(), spec)?;
    info!("loaded {} rows from {}", dataset.rows().len(), path.display());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("forecast_charts_{}_{}_{name}", std::process::id(), nanos))
    }

    #[tokio::test]
    async fn missing_manifest_is_a_read_error() {
        let err = load_manifest(&temp_path("absent.json")).await.unwrap_err();
        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_manifest_is_a_parse_error() {
        let path = temp_path("manifest.json");
        fs::write(&path, "{ not json").await.unwrap();
        let err = load_manifest(&path).await.unwrap_err();
        let _ = fs::remove_file(&path).await;
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[tokio::test]
    async fn bundled_assets_load() {
        let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
        let manifest = load_manifest(&static_dir.join("manifest.json")).await.unwrap();
        let catalog = load_catalog(&static_dir.join("charts.json")).await.unwrap();
        for (id, spec) in &catalog.charts {
            assert!(manifest.get(id).is_some(), "{id} has no manifest entry");
            let dataset = load_dataset(&static_dir, spec).await.unwrap();
            assert!(!dataset.rows().is_empty(), "{id} has no rows");
        }
    }
}
