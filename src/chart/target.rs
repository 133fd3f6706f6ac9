use crate::chart::error::TargetMissing;
use crate::chart::spec::ChartSpec;
use std::collections::{BTreeMap, BTreeSet};

pub const CHART_CONTAINER_ID: &str = "chart-body";
pub const TOOLTIP_DATE_ID: &str = "tooltip-date";
pub const SELECTED_DATE_MARKER_ID: &str = "selected-date-marker";

pub fn tooltip_value_id(series_id: &str) -> String {
    format!("tooltip-text-val-{series_id}")
}

/// The page a chart draws into. Writes to an element that does not exist
/// fail with [`TargetMissing`].
pub trait RenderTarget {
    /// Replaces whatever chart the container holds.
    fn replace_chart(&mut self, svg: &str) -> Result<(), TargetMissing>;

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), TargetMissing>;

    /// Moves the selected-date marker to `x` (viewBox units).
    fn move_marker(&mut self, x: f64) -> Result<(), TargetMissing>;
}

/// In-memory page holding a fixed set of element ids.
#[derive(Debug, Clone, Default)]
pub struct PageTarget {
    hooks: BTreeSet<String>,
    chart: Option<String>,
    texts: BTreeMap<String, String>,
    marker_x: Option<f64>,
}

impl PageTarget {
    pub fn with_hooks<I, S>(hooks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hooks: hooks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The elements the chart page template provides for `spec`.
    pub fn for_chart(spec: &ChartSpec) -> Self {
        let mut hooks = vec![CHART_CONTAINER_ID.to_string()];
        if spec.tooltip {
            hooks.push(TOOLTIP_DATE_ID.to_string());
            hooks.extend(
                spec.series
                    .iter()
                    .filter(|series| series.in_tooltip)
                    .map(|series| tooltip_value_id(&series.id)),
            );
        }
        Self::with_hooks(hooks)
    }

    pub fn chart(&self) -> Option<&str> {
        self.chart.as_deref()
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.texts.get(id).map(String::as_str)
    }

    pub fn texts(&self) -> &BTreeMap<String, String> {
        &self.texts
    }

    pub fn marker_x(&self) -> Option<f64> {
        self.marker_x
    }

    fn require(&self, id: &str) -> Result<(), TargetMissing> {
        if self.hooks.contains(id) {
            Ok(())
        } else {
            Err(TargetMissing(id.to_string()))
        }
    }
}

impl RenderTarget for PageTarget {
    fn replace_chart(&mut self, svg: &str) -> Result<(), TargetMissing> {
        self.require(CHART_CONTAINER_ID)?;
        self.chart = Some(svg.to_string());
        self.marker_x = None;
        Ok(())
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), TargetMissing> {
        self.require(id)?;
        self.texts.insert(id.to_string(), text.to_string());
        Ok(())
    }

    fn move_marker(&mut self, x: f64) -> Result<(), TargetMissing> {
        if self.chart.is_none() {
            return Err(TargetMissing(SELECTED_DATE_MARKER_ID.to_string()));
        }
        self.marker_x = Some(x);
        Ok(())
    }
}
