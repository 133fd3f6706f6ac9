use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;

/// Server settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub static_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub charts_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let static_dir = env::var("APP_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));
        let manifest_path = env::var("APP_MANIFEST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("manifest.json"));
        let charts_path = env::var("APP_CHARTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("charts.json"));

        Self {
            port: resolve_port(env::var("PORT").ok().as_deref()),
            static_dir,
            manifest_path,
            charts_path,
        }
    }
}

fn resolve_port(value: Option<&str>) -> u16 {
    value
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}
