use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker a series uses for "no observation on this date".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentinel {
    /// Blank cell.
    #[default]
    Empty,
    /// Blank cell or a value that parses to zero.
    Zero,
    /// A literal `-`.
    Dash,
}

impl Sentinel {
    pub fn is_missing(self, raw: &str) -> bool {
        let raw = raw.trim();
        match self {
            Sentinel::Empty => raw.is_empty(),
            Sentinel::Zero => raw.is_empty() || raw.parse::<f64>().map(|v| v == 0.0).unwrap_or(false),
            Sentinel::Dash => raw == "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSizes {
    pub small: CanvasSize,
    pub medium: CanvasSize,
    pub large: CanvasSize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// How a series turns its columns into a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesKind {
    Line {
        column: String,
    },
    /// Shaded range between two columns, e.g. quartiles.
    Band {
        lower: String,
        upper: String,
    },
    /// `base` shifted by the latest available value of `offset`, drawn only
    /// where `gate` has no observation yet.
    Offset {
        base: String,
        offset: String,
        gate: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Used in element ids: `chart-data-<id>`, `tooltip-text-val-<id>`.
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: SeriesKind,
    #[serde(default)]
    pub sentinel: Sentinel,
    /// Appended to tooltip text only.
    #[serde(default)]
    pub suffix: String,
    /// Comparison series that can be hidden with the auxiliary toggle.
    #[serde(default)]
    pub auxiliary: bool,
    #[serde(default = "default_true")]
    pub in_tooltip: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSpec {
    /// Element ids become `chart-data-<id>-proj` and `chart-data-<id>-band-proj`.
    #[serde(default = "default_projection_id")]
    pub id: String,
    /// Column whose latest non-sentinel value is carried forward.
    pub anchor: String,
    #[serde(default)]
    pub lower: Option<String>,
    #[serde(default)]
    pub upper: Option<String>,
    #[serde(default)]
    pub sentinel: Sentinel,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Path of the CSV file, relative to the static directory.
    pub data: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// chrono format of the date column, e.g. `%m/%d/%Y`.
    pub date_format: String,
    pub domain_x: [NaiveDate; 2],
    pub domain_y: [f64; 2],
    pub sizes: CanvasSizes,
    /// Width thresholds: below the first is small, below the second medium.
    #[serde(default = "default_breakpoints")]
    pub breakpoints: [u32; 2],
    pub padding: Padding,
    #[serde(default = "default_tick_format")]
    pub x_tick_format: String,
    #[serde(default)]
    pub y_label: Option<String>,
    pub series: Vec<SeriesSpec>,
    #[serde(default)]
    pub projection: Option<ProjectionSpec>,
    #[serde(default)]
    pub markers: Vec<MarkerSpec>,
    #[serde(default)]
    pub tooltip: bool,
    /// Alternative column sets; `{variant}` in a column name is replaced by
    /// the selected entry. The first entry is the default.
    #[serde(default)]
    pub variants: Vec<String>,
}

impl ChartSpec {
    pub fn series(&self, id: &str) -> Option<&SeriesSpec> {
        self.series.iter().find(|series| series.id == id)
    }

    pub fn default_variant(&self) -> Option<&str> {
        self.variants.first().map(String::as_str)
    }

    /// Every CSV column a given variant reads, besides the date column.
    pub fn columns(&self, variant: Option<&str>) -> Vec<String> {
        let mut columns = Vec::new();
        for series in &self.series {
            match &series.kind {
                SeriesKind::Line { column } => columns.push(resolve_column(column, variant)),
                SeriesKind::Band { lower, upper } => {
                    columns.push(resolve_column(lower, variant));
                    columns.push(resolve_column(upper, variant));
                }
                SeriesKind::Offset { base, offset, gate } => {
                    columns.push(resolve_column(base, variant));
                    columns.push(resolve_column(offset, variant));
                    columns.push(resolve_column(gate, variant));
                }
            }
        }
        if let Some(projection) = &self.projection {
            columns.push(resolve_column(&projection.anchor, variant));
            columns.extend(projection.lower.iter().map(|c| resolve_column(c, variant)));
            columns.extend(projection.upper.iter().map(|c| resolve_column(c, variant)));
        }
        columns.sort();
        columns.dedup();
        columns
    }
}

pub fn resolve_column(column: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) => column.replace("{variant}", variant),
        None => column.to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartCatalog {
    #[serde(default)]
    pub charts: BTreeMap<String, ChartSpec>,
}

fn default_true() -> bool {
    true
}

fn default_projection_id() -> String {
    "projection".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_breakpoints() -> [u32; 2] {
    [500, 750]
}

fn default_tick_format() -> String {
    "%b".to_string()
}
