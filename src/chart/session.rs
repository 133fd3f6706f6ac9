use crate::chart::data::Dataset;
use crate::chart::error::{ChartError, TargetMissing};
use crate::chart::render::{
    Breakpoint, Layout, build_chart, chart_layout, date_label, render_error, tooltip_values,
};
use crate::chart::selection::Selection;
use crate::chart::spec::ChartSpec;
use crate::chart::target::{RenderTarget, TOOLTIP_DATE_ID, tooltip_value_id};
use chrono::NaiveDate;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the dataset.
    Loading,
    Rendered,
    /// Tearing down the previous chart and building its replacement.
    Rebuilding,
    /// The dataset could not be used; an error panel is shown.
    Failed(String),
}

/// One page's chart: the dataset, the viewport class and the viewer's
/// selection. Every breakpoint or selection change triggers exactly one
/// full rebuild.
#[derive(Debug)]
pub struct ChartSession {
    spec: Arc<ChartSpec>,
    phase: Phase,
    breakpoint: Breakpoint,
    dataset: Option<Arc<Dataset>>,
    selection: Selection,
    layout: Option<Layout>,
    cursor_date: Option<NaiveDate>,
    builds: u64,
}

impl ChartSession {
    pub fn new(spec: Arc<ChartSpec>, viewport_width: u32) -> Self {
        let breakpoint = Breakpoint::for_width(viewport_width, spec.breakpoints);
        let selection = Selection {
            variant: spec.default_variant().map(str::to_string),
            ..Selection::default()
        };
        Self {
            spec,
            phase: Phase::Loading,
            breakpoint,
            dataset: None,
            selection,
            layout: None,
            cursor_date: None,
            builds: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Number of completed builds.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn load(&mut self, dataset: Arc<Dataset>, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        self.dataset = Some(dataset);
        self.rebuild(target)
    }

    /// Attaches the dataset and computes the chart's scales without drawing
    /// it. Pointer lookups then behave as after `load`, except that the first
    /// one always writes the tooltip.
    pub fn attach(&mut self, dataset: Arc<Dataset>) -> Result<(), ChartError> {
        let layout = chart_layout(&self.spec, &dataset, self.breakpoint, &self.selection)?;
        self.dataset = Some(dataset);
        self.layout = Some(layout);
        self.cursor_date = None;
        self.phase = Phase::Rendered;
        Ok(())
    }

    /// Parses a CSV for this chart and renders it, or shows the error panel
    /// when the data does not fit the chart.
    pub fn load_csv<R: Read>(&mut self, reader: R, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        match Dataset::from_reader(reader, &self.spec) {
            Ok(dataset) => self.load(Arc::new(dataset), target),
            Err(err) => {
                self.fail(&err, target);
                Err(err)
            }
        }
    }

    /// Shows an error panel in place of the chart.
    pub fn fail(&mut self, err: &ChartError, target: &mut dyn RenderTarget) {
        let message = err.to_string();
        warn!("chart failed: {message}");
        let svg = render_error(&self.spec, self.breakpoint, &message);
        report(target.replace_chart(&svg));
        self.layout = None;
        self.phase = Phase::Failed(message);
    }

    /// Returns whether the chart was rebuilt.
    pub fn resize(&mut self, viewport_width: u32, target: &mut dyn RenderTarget) -> Result<bool, ChartError> {
        let breakpoint = Breakpoint::for_width(viewport_width, self.spec.breakpoints);
        if breakpoint == self.breakpoint {
            return Ok(false);
        }
        self.breakpoint = breakpoint;
        if self.phase != Phase::Rendered {
            return Ok(false);
        }
        self.rebuild(target)?;
        Ok(true)
    }

    pub fn toggle_series(&mut self, series_id: &str, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        if self.spec.series(series_id).is_none() {
            return Err(ChartError::UnknownSeries(series_id.to_string()));
        }
        self.selection.toggle(series_id);
        self.rebuild_if_rendered(target)
    }

    pub fn select_variant(&mut self, variant: &str, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        if !self.spec.variants.iter().any(|v| v == variant) {
            return Err(ChartError::UnknownVariant(variant.to_string()));
        }
        if self.selection.variant.as_deref() == Some(variant) {
            return Ok(());
        }
        self.selection.variant = Some(variant.to_string());
        self.rebuild_if_rendered(target)
    }

    pub fn toggle_auxiliary(&mut self, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        self.selection.show_auxiliary = !self.selection.show_auxiliary;
        self.rebuild_if_rendered(target)
    }

    /// Handles a pointer at viewBox x coordinate `x`. The tooltip is only
    /// rewritten when the date under the pointer changes; returns that date.
    pub fn pointer_moved(&mut self, x: f64, target: &mut dyn RenderTarget) -> Result<Option<NaiveDate>, ChartError> {
        if self.phase != Phase::Rendered || !self.spec.tooltip {
            return Ok(None);
        }
        let Some(layout) = &self.layout else {
            return Ok(None);
        };
        let date = layout.x.invert(x);
        report(target.move_marker(layout.x.map(date)));

        if self.cursor_date == Some(date) {
            return Ok(None);
        }
        self.cursor_date = Some(date);
        self.write_tooltip(date, target)?;
        Ok(Some(date))
    }

    fn rebuild_if_rendered(&mut self, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        if self.phase == Phase::Rendered {
            self.rebuild(target)?;
        }
        Ok(())
    }

    fn rebuild(&mut self, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        let dataset = self.dataset.clone().ok_or(ChartError::NotLoaded)?;
        if self.phase == Phase::Rendered {
            self.phase = Phase::Rebuilding;
        }

        let chart = match build_chart(&self.spec, &dataset, self.breakpoint, &self.selection) {
            Ok(chart) => chart,
            Err(err) => {
                self.fail(&err, target);
                return Err(err);
            }
        };
        report(target.replace_chart(&chart.svg));
        let latest = chart.layout.latest;
        self.layout = Some(chart.layout);
        self.phase = Phase::Rendered;
        self.builds += 1;
        debug!(
            breakpoint = self.breakpoint.as_str(),
            builds = self.builds,
            "chart built"
        );

        self.cursor_date = latest;
        if let (true, Some(date)) = (self.spec.tooltip, latest) {
            self.write_tooltip(date, target)?;
        }
        Ok(())
    }

    fn write_tooltip(&self, date: NaiveDate, target: &mut dyn RenderTarget) -> Result<(), ChartError> {
        let (Some(dataset), Some(layout)) = (&self.dataset, &self.layout) else {
            return Err(ChartError::NotLoaded);
        };
        let row = dataset.find(date);
        report(target.set_text(TOOLTIP_DATE_ID, &date_label(date)));
        for (series_id, text) in tooltip_values(&self.spec, dataset, layout, &self.selection, row)? {
            report(target.set_text(&tooltip_value_id(&series_id), &text));
        }
        Ok(())
    }
}

/// A missing element is not fatal: the write is skipped.
fn report(result: Result<(), TargetMissing>) {
    if let Err(err) = result {
        warn!("{err}");
    }
}
