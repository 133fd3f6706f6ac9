use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display metadata of one chart page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestEntry {
    pub page_title: String,
    pub chart_stylesheet: String,
    pub chart_script: String,
    pub chart_title: String,
    pub chart_subtitle: String,
    pub chart_description: String,
    pub chart_data_source: String,
    pub chart_last_update: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub data: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn get(&self, chart: &str) -> Option<&ManifestEntry> {
        self.data.get(chart)
    }
}

#[derive(Debug, Deserialize)]
pub struct SvgQuery {
    pub width: Option<u32>,
    /// Comma-separated series ids.
    pub highlight: Option<String>,
    pub variant: Option<String>,
    /// `0` hides auxiliary series.
    pub aux: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct TooltipQuery {
    pub width: Option<u32>,
    pub x: f64,
    pub variant: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TooltipResponse {
    pub date: String,
    /// Marker position, snapped to the start of the date.
    pub x: f64,
    pub breakpoint: String,
    /// Element id to text.
    pub fields: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_reads_camel_case_fields() {
        let json = r#"{
          "data": {
            "demo": {
              "pageTitle": "Demo",
              "chartTitle": "A chart",
              "chartLastUpdate": "Oct 1"
            }
          }
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let entry = manifest.get("demo").unwrap();
        assert_eq!(entry.page_title, "Demo");
        assert_eq!(entry.chart_title, "A chart");
        assert_eq!(entry.chart_last_update, "Oct 1");
        assert_eq!(entry.chart_subtitle, "");
        assert!(manifest.get("missing").is_none());
    }
}
