use crate::chart::{ChartCatalog, ChartSpec, Dataset};
use crate::errors::AppError;
use crate::models::Manifest;
use crate::storage::load_dataset;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub static_dir: PathBuf,
    pub manifest: Arc<Manifest>,
    pub charts: Arc<HashMap<String, Arc<ChartSpec>>>,
    datasets: Arc<Mutex<HashMap<String, Arc<Dataset>>>>,
}

impl AppState {
    pub fn new(static_dir: PathBuf, manifest: Manifest, catalog: ChartCatalog) -> Self {
        let charts = catalog
            .charts
            .into_iter()
            .map(|(id, spec)| (id, Arc::new(spec)))
            .collect();
        Self {
            static_dir,
            manifest: Arc::new(manifest),
            charts: Arc::new(charts),
            datasets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn chart(&self, id: &str) -> Result<Arc<ChartSpec>, AppError> {
        self.charts
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("unknown chart '{id}'")))
    }

    /// Parsed rows for `id`, read from disk on first use. The file is read
    /// without holding the cache lock; failed loads are not cached.
    pub async fn dataset(&self, id: &str, spec: &ChartSpec) -> Result<Arc<Dataset>, AppError> {
        if let Some(dataset) = self.datasets.lock().await.get(id) {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(load_dataset(&self.static_dir, spec).await?);
        let mut datasets = self.datasets.lock().await;
        let cached = datasets.entry(id.to_string()).or_insert(dataset);
        Ok(Arc::clone(cached))
    }
}
