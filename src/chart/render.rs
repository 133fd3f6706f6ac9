//! SVG chart construction.
//!
//! A build takes the chart's configuration, the parsed rows, the current
//! breakpoint and the viewer's selection and produces a complete SVG
//! document. Nothing is patched in place: every change of breakpoint or
//! selection goes through a full build.

use crate::chart::data::{Column, DataRow, Dataset};
use crate::chart::error::ChartError;
use crate::chart::path::{area_path, line_path, num};
use crate::chart::scale::{LinearScale, TimeScale};
use crate::chart::selection::Selection;
use crate::chart::spec::{CanvasSize, ChartSpec, SeriesKind, SeriesSpec, resolve_column};
use crate::chart::target::SELECTED_DATE_MARKER_ID;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Write as _;

const Y_TICK_COUNT: usize = 10;

/// Viewport size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Small,
    Medium,
    Large,
}

impl Breakpoint {
    pub fn for_width(width: u32, thresholds: [u32; 2]) -> Self {
        if width < thresholds[0] {
            Breakpoint::Small
        } else if width < thresholds[1] {
            Breakpoint::Medium
        } else {
            Breakpoint::Large
        }
    }

    pub fn canvas(self, spec: &ChartSpec) -> CanvasSize {
        match self {
            Breakpoint::Small => spec.sizes.small,
            Breakpoint::Medium => spec.sizes.medium,
            Breakpoint::Large => spec.sizes.large,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Small => "small",
            Breakpoint::Medium => "medium",
            Breakpoint::Large => "large",
        }
    }
}

/// Scales and derived values of one build, kept for pointer lookups.
#[derive(Debug, Clone)]
pub struct Layout {
    pub breakpoint: Breakpoint,
    pub size: CanvasSize,
    pub x: TimeScale,
    pub y: LinearScale,
    /// Date of the last row inside the time domain.
    pub latest: Option<NaiveDate>,
    offsets: HashMap<String, f64>,
}

impl Layout {
    pub fn new(spec: &ChartSpec, breakpoint: Breakpoint) -> Self {
        let size = breakpoint.canvas(spec);
        let (width, height) = (f64::from(size.width), f64::from(size.height));
        let pad = spec.padding;
        Self {
            breakpoint,
            size,
            x: TimeScale::new(spec.domain_x, [pad.left, width - pad.right]),
            y: LinearScale::new(spec.domain_y, [height - pad.bottom, pad.top]),
            latest: None,
            offsets: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub svg: String,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy)]
enum Columns {
    Line(Column),
    Band(Column, Column),
    Offset { base: Column, offset: Column, gate: Column },
}

struct Resolved<'a> {
    spec: &'a SeriesSpec,
    columns: Columns,
}

fn column(dataset: &Dataset, name: &str, variant: Option<&str>) -> Result<Column, ChartError> {
    let name = resolve_column(name, variant);
    dataset
        .column(&name)
        .ok_or_else(|| ChartError::data_format(1, format!("missing column '{name}'")))
}

fn resolve<'a>(
    spec: &'a ChartSpec,
    dataset: &Dataset,
    variant: Option<&str>,
) -> Result<Vec<Resolved<'a>>, ChartError> {
    spec.series
        .iter()
        .map(|series| {
            let columns = match &series.kind {
                SeriesKind::Line { column: c } => Columns::Line(column(dataset, c, variant)?),
                SeriesKind::Band { lower, upper } => Columns::Band(
                    column(dataset, lower, variant)?,
                    column(dataset, upper, variant)?,
                ),
                SeriesKind::Offset { base, offset, gate } => Columns::Offset {
                    base: column(dataset, base, variant)?,
                    offset: column(dataset, offset, variant)?,
                    gate: column(dataset, gate, variant)?,
                },
            };
            Ok(Resolved { spec: series, columns })
        })
        .collect()
}

fn offset_value(series: &Resolved<'_>, row: &DataRow, offsets: &HashMap<String, f64>) -> Option<f64> {
    let Columns::Offset { base, gate, .. } = series.columns else {
        return None;
    };
    let sentinel = series.spec.sentinel;
    if row.value(gate, sentinel).is_some() {
        return None;
    }
    Some(row.value(base, sentinel)? + offsets.get(&series.spec.id)?)
}

/// Last in-domain row carrying a projection anchor value. Charts without a
/// projection anchor on their last in-domain row.
fn anchor_row<'d>(
    spec: &ChartSpec,
    dataset: &Dataset,
    rows: &'d [DataRow],
    variant: Option<&str>,
) -> Result<Option<&'d DataRow>, ChartError> {
    let Some(projection) = &spec.projection else {
        return Ok(rows.last());
    };
    let anchor = column(dataset, &projection.anchor, variant)?;
    Ok(rows.iter().rev().find(|row| row.value(anchor, projection.sentinel).is_some()))
}

/// Scales, latest date and offsets for a build, without drawing anything.
/// Enough for pointer lookups.
pub fn chart_layout(
    spec: &ChartSpec,
    dataset: &Dataset,
    breakpoint: Breakpoint,
    selection: &Selection,
) -> Result<Layout, ChartError> {
    let mut layout = Layout::new(spec, breakpoint);
    let variant = selection.variant.as_deref();
    let series = resolve(spec, dataset, variant)?;
    let rows = dataset.within(spec.domain_x[0], spec.domain_x[1]);
    layout.latest = rows.last().map(|row| row.date);

    // Offsets come from the anchor row as recorded, even when they are zero.
    let anchor = anchor_row(spec, dataset, rows, variant)?;
    for s in &series {
        if let Columns::Offset { offset, .. } = s.columns {
            if let Some(value) = anchor.and_then(|row| row.number(offset)) {
                layout.offsets.insert(s.spec.id.clone(), value);
            }
        }
    }
    Ok(layout)
}

pub fn build_chart(
    spec: &ChartSpec,
    dataset: &Dataset,
    breakpoint: Breakpoint,
    selection: &Selection,
) -> Result<RenderedChart, ChartError> {
    let layout = chart_layout(spec, dataset, breakpoint, selection)?;
    let variant = selection.variant.as_deref();
    let series = resolve(spec, dataset, variant)?;
    let rows = dataset.within(spec.domain_x[0], spec.domain_x[1]);

    let (width, height) = (f64::from(layout.size.width), f64::from(layout.size.height));
    let pad = spec.padding;
    let [bottom, top] = layout.y.range();
    let [left, right] = layout.x.range();

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="svg-chart" data-breakpoint="{bp}">"#,
        w = layout.size.width,
        h = layout.size.height,
        bp = breakpoint.as_str(),
    );

    // x axis
    let _ = write!(
        svg,
        r#"<g class="axis axis-x" transform="translate(0,{})"><line class="domain" x1="{}" x2="{}"/>"#,
        num(height - pad.bottom),
        num(left),
        num(right),
    );
    for tick in layout.x.month_ticks() {
        let mut label = String::new();
        if write!(label, "{}", tick.format(&spec.x_tick_format)).is_err() {
            label = tick.format("%b").to_string();
        }
        let _ = write!(
            svg,
            r#"<g class="tick" transform="translate({},0)"><line y2="6"/><text y="9" dy="0.71em" text-anchor="middle">{}</text></g>"#,
            num(layout.x.map(tick)),
            escape_text(&label),
        );
    }
    svg.push_str("</g>");

    // y axis, ticks drawn as full-width reference lines
    let _ = write!(svg, r#"<g class="axis axis-y" transform="translate({},0)">"#, num(pad.left));
    for tick in layout.y.ticks(Y_TICK_COUNT) {
        let _ = write!(
            svg,
            r#"<g class="tick" transform="translate(0,{})"><line class="tick-y-cross" x2="{}"/><text x="-3" dy="0.32em" text-anchor="end">{}</text></g>"#,
            num(layout.y.map(tick)),
            num(width - pad.left - pad.right),
            num(tick),
        );
    }
    if let Some(label) = &spec.y_label {
        let _ = write!(
            svg,
            r#"<text class="axis-label" x="{}" y="10" text-anchor="start">↑ {}</text>"#,
            num(-pad.left),
            escape_text(label),
        );
    }
    svg.push_str("</g>");

    for marker in &spec.markers {
        let x = layout.x.map(marker.date);
        let _ = write!(
            svg,
            r#"<line id="{}" class="chart-marker" x1="{x}" y1="{}" x2="{x}" y2="{}"/>"#,
            escape_text(&marker.id),
            num(bottom),
            num(top - 10.0),
            x = num(x),
        );
    }

    for s in &series {
        if s.spec.auxiliary && !selection.show_auxiliary {
            continue;
        }
        let sentinel = s.spec.sentinel;
        let (kind, d) = match s.columns {
            Columns::Line(c) => {
                let points: Vec<_> = rows
                    .iter()
                    .map(|row| row.value(c, sentinel).map(|v| (layout.x.map(row.date), layout.y.map(v))))
                    .collect();
                ("chart-line", line_path(&points))
            }
            Columns::Band(lower, upper) => {
                let points: Vec<_> = rows
                    .iter()
                    .map(|row| {
                        let lo = row.value(lower, sentinel)?;
                        let hi = row.value(upper, sentinel)?;
                        Some((layout.x.map(row.date), layout.y.map(lo), layout.y.map(hi)))
                    })
                    .collect();
                ("chart-band", area_path(&points))
            }
            Columns::Offset { .. } => {
                let points: Vec<_> = rows
                    .iter()
                    .map(|row| {
                        offset_value(s, row, &layout.offsets)
                            .map(|v| (layout.x.map(row.date), layout.y.map(v)))
                    })
                    .collect();
                ("chart-line", line_path(&points))
            }
        };
        let _ = write!(
            svg,
            r#"<path id="chart-data-{}" class="chart-data {} {}" d="{}"/>"#,
            escape_text(&s.spec.id),
            kind,
            selection.class_of(&s.spec.id).css(),
            d,
        );
    }

    if let Some(projection) = &spec.projection {
        let anchor = column(dataset, &projection.anchor, variant)?;
        let sentinel = projection.sentinel;
        if let Some(row) = anchor_row(spec, dataset, rows, variant)? {
            let x1 = layout.x.map(row.date);
            let x2 = layout.x.map(projection.target_date);
            let id = escape_text(&projection.id);

            let band = match (&projection.lower, &projection.upper) {
                (Some(lower), Some(upper)) => {
                    let lower = column(dataset, lower, variant)?;
                    let upper = column(dataset, upper, variant)?;
                    row.value(lower, sentinel).zip(row.value(upper, sentinel))
                }
                _ => None,
            };
            if let Some((lo, hi)) = band {
                let (y_lo, y_hi) = (layout.y.map(lo), layout.y.map(hi));
                let _ = write!(
                    svg,
                    r#"<rect id="chart-data-{id}-band-proj" class="chart-projection" x="{}" y="{}" width="{}" height="{}"/>"#,
                    num(x1),
                    num(y_lo.min(y_hi)),
                    num((x2 - x1).max(0.0)),
                    num((y_lo - y_hi).abs()),
                );
            }
            if let Some(value) = row.value(anchor, sentinel) {
                let y = num(layout.y.map(value));
                let _ = write!(
                    svg,
                    r#"<line id="chart-data-{id}-proj" class="chart-projection" x1="{}" y1="{y}" x2="{}" y2="{y}"/>"#,
                    num(x1),
                    num(x2),
                );
            }
        }
    }

    if spec.tooltip {
        if let Some(latest) = layout.latest {
            let x = num(layout.x.map(latest));
            let _ = write!(
                svg,
                r#"<line id="{SELECTED_DATE_MARKER_ID}" x1="{x}" y1="{}" x2="{x}" y2="{}"/>"#,
                num(bottom),
                num(top),
            );
        }
    }

    svg.push_str("</svg>");
    Ok(RenderedChart { svg, layout })
}

/// Tooltip strings for `row`, keyed by series id. `None` (no row for the
/// date) and missing observations both read `-`.
pub fn tooltip_values(
    spec: &ChartSpec,
    dataset: &Dataset,
    layout: &Layout,
    selection: &Selection,
    row: Option<&DataRow>,
) -> Result<Vec<(String, String)>, ChartError> {
    let series = resolve(spec, dataset, selection.variant.as_deref())?;
    Ok(series
        .iter()
        .filter(|s| s.spec.in_tooltip)
        .map(|s| {
            let text = row
                .and_then(|row| format_value(s, row, &layout.offsets))
                .unwrap_or_else(|| "-".to_string());
            (s.spec.id.clone(), text)
        })
        .collect())
}

fn format_value(series: &Resolved<'_>, row: &DataRow, offsets: &HashMap<String, f64>) -> Option<String> {
    let sentinel = series.spec.sentinel;
    let suffix = &series.spec.suffix;
    match series.columns {
        Columns::Line(c) => {
            row.value(c, sentinel)?;
            Some(format!("{}{suffix}", row.raw(c).trim()))
        }
        Columns::Band(lower, upper) => {
            row.value(lower, sentinel)?;
            row.value(upper, sentinel)?;
            Some(format!(
                "{}{suffix} to {}{suffix}",
                row.raw(lower).trim(),
                row.raw(upper).trim()
            ))
        }
        Columns::Offset { .. } => {
            offset_value(series, row, offsets).map(|v| format!("{}{suffix}", num(v)))
        }
    }
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// SVG shown in place of a chart whose data could not be used.
pub fn render_error(spec: &ChartSpec, breakpoint: Breakpoint, message: &str) -> String {
    let size = breakpoint.canvas(spec);
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="svg-chart chart-error"><text x="{x}" y="{y}" text-anchor="middle">Chart data unavailable: {msg}</text></svg>"#,
        w = size.width,
        h = size.height,
        x = size.width / 2,
        y = size.height / 2,
        msg = escape_text(message),
    )
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::data::tests::{election_dataset, election_spec};
    use crate::chart::path::segment_count;

    fn path_d<'a>(svg: &'a str, id: &str) -> &'a str {
        let start = svg.find(&format!(r#"id="chart-data-{id}""#)).expect("series path");
        let rest = &svg[start..];
        let d = rest.find(r#"d=""#).unwrap() + 3;
        let end = rest[d..].find('"').unwrap();
        &rest[d..d + end]
    }

    #[test]
    fn breakpoints_follow_width_thresholds() {
        assert_eq!(Breakpoint::for_width(499, [500, 750]), Breakpoint::Small);
        assert_eq!(Breakpoint::for_width(500, [500, 750]), Breakpoint::Medium);
        assert_eq!(Breakpoint::for_width(749, [500, 750]), Breakpoint::Medium);
        assert_eq!(Breakpoint::for_width(750, [500, 750]), Breakpoint::Large);
    }

    #[test]
    fn canvas_matches_breakpoint() {
        let spec = election_spec();
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Medium, &Selection::default()).unwrap();
        assert!(chart.svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 800 650""#));
        assert_eq!(chart.layout.size, spec.sizes.medium);
    }

    #[test]
    fn sentinel_row_leaves_a_gap() {
        let spec = election_spec();
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Large, &Selection::default()).unwrap();
        assert_eq!(segment_count(path_d(&chart.svg, "fivethirtyeight")), 2);
        assert_eq!(segment_count(path_d(&chart.svg, "polymarket")), 1);
    }

    #[test]
    fn selection_sets_series_classes() {
        let spec = election_spec();
        let mut selection = Selection::default();
        selection.toggle("polymarket");
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Large, &selection).unwrap();
        assert!(chart.svg.contains(r#"id="chart-data-polymarket" class="chart-data chart-line series-highlighted""#));
        assert!(chart.svg.contains(r#"id="chart-data-fivethirtyeight" class="chart-data chart-line series-background""#));
    }

    #[test]
    fn auxiliary_series_can_be_hidden() {
        let spec = election_spec();
        let mut selection = Selection::default();
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Large, &selection).unwrap();
        assert!(chart.svg.contains("chart-data-manifold"));

        selection.show_auxiliary = false;
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Large, &selection).unwrap();
        assert!(!chart.svg.contains("chart-data-manifold"));
    }

    #[test]
    fn selected_date_marker_sits_on_latest_row() {
        let spec = election_spec();
        let chart = build_chart(&spec, &election_dataset(), Breakpoint::Large, &Selection::default()).unwrap();
        let latest = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
        assert_eq!(chart.layout.latest, Some(latest));
        let x = num(chart.layout.x.map(latest));
        assert!(chart.svg.contains(&format!(r#"<line id="selected-date-marker" x1="{x}""#)));
    }

    #[test]
    fn tooltip_values_use_raw_cells_and_suffix() {
        let spec = election_spec();
        let dataset = election_dataset();
        let selection = Selection::default();
        let chart = build_chart(&spec, &dataset, Breakpoint::Large, &selection).unwrap();
        let values = tooltip_values(&spec, &dataset, &chart.layout, &selection, Some(&dataset.rows()[1])).unwrap();
        assert_eq!(
            values,
            vec![
                ("fivethirtyeight".to_string(), "-".to_string()),
                ("polymarket".to_string(), "42.5%".to_string()),
                ("manifold".to_string(), "43%".to_string()),
            ]
        );
    }

    /// Scales work out to 100 px per day and 10 px per unit.
    fn ace_spec() -> ChartSpec {
        let json = r#"{
          "data": "data/ace.csv",
          "date_format": "%m/%d/%y",
          "domain_x": ["2023-08-01", "2023-08-11"],
          "domain_y": [0, 60],
          "sizes": {
            "small": { "width": 1000, "height": 600 },
            "medium": { "width": 1000, "height": 600 },
            "large": { "width": 1000, "height": 600 }
          },
          "padding": { "top": 0, "right": 0, "bottom": 0, "left": 0 },
          "y_label": "ACE",
          "markers": [{ "id": "end-date-marker", "date": "2023-08-09" }],
          "series": [
            { "id": "csu", "label": "CSU", "kind": "line", "column": "CSU-Model", "sentinel": "zero" },
            { "id": "quartiles", "label": "Range", "kind": "band", "lower": "Predicted-LQ", "upper": "Predicted-UQ", "sentinel": "zero" },
            { "id": "median", "label": "Median", "kind": "line", "column": "Predicted-Median", "sentinel": "zero" },
            { "id": "actual", "label": "Actual", "kind": "line", "column": "Actual", "sentinel": "zero" },
            { "id": "prediction", "label": "Projected", "kind": "offset", "base": "CSU-Model", "offset": "Deviation", "gate": "Actual", "sentinel": "zero" }
          ],
          "projection": {
            "id": "median",
            "anchor": "Predicted-Median",
            "lower": "Predicted-LQ",
            "upper": "Predicted-UQ",
            "sentinel": "zero",
            "target_date": "2023-08-09"
          },
          "tooltip": true
        }"#;
        serde_json::from_str(json).unwrap()
    }

    fn ace_dataset() -> Dataset {
        let csv = "Date,CSU-Model,Predicted-LQ,Predicted-Median,Predicted-UQ,Actual,Deviation\n\
                   8/1/23,10,0,0,0,5,-5\n\
                   8/2/23,20,10,20,30,18,-3\n\
                   8/3/23,25,0,0,0,24,-1\n\
                   8/4/23,30,20,30,40,30,0\n\
                   8/5/23,35,0,0,0,0,0\n\
                   8/6/23,40,0,0,0,0,0\n";
        Dataset::from_reader(csv.as_bytes(), &ace_spec()).unwrap()
    }

    fn ace_chart() -> RenderedChart {
        build_chart(&ace_spec(), &ace_dataset(), Breakpoint::Large, &Selection::default()).unwrap()
    }

    #[test]
    fn projection_carries_latest_anchor_to_target_date() {
        let svg = ace_chart().svg;
        assert!(svg.contains(
            r#"<line id="chart-data-median-proj" class="chart-projection" x1="300" y1="300" x2="800" y2="300"/>"#
        ));
        assert!(svg.contains(
            r#"<rect id="chart-data-median-band-proj" class="chart-projection" x="300" y="200" width="500" height="200"/>"#
        ));
    }

    #[test]
    fn band_breaks_at_sentinel_rows() {
        let chart = ace_chart();
        let d = path_d(&chart.svg, "quartiles");
        assert_eq!(d, "M100,300L100,500ZM300,200L300,400Z");
        assert_eq!(segment_count(d), 2);
        assert!(chart.svg.contains(r#"id="chart-data-quartiles" class="chart-data chart-band"#));
    }

    #[test]
    fn offset_series_uses_anchor_row_deviation() {
        let spec = ace_spec();
        let dataset = ace_dataset();
        let selection = Selection::default();
        let chart = build_chart(&spec, &dataset, Breakpoint::Large, &selection).unwrap();
        // The anchor row records a deviation of exactly zero.
        assert_eq!(chart.layout.offsets.get("prediction"), Some(&0.0));
        // Drawn only where Actual is missing.
        assert_eq!(path_d(&chart.svg, "prediction"), "M400,250L500,200");

        let tooltip = |index: usize| {
            tooltip_values(&spec, &dataset, &chart.layout, &selection, Some(&dataset.rows()[index])).unwrap()
        };
        let after = tooltip(4);
        assert!(after.contains(&("prediction".to_string(), "35".to_string())));
        let before = tooltip(3);
        assert!(before.contains(&("prediction".to_string(), "-".to_string())));
        assert!(before.contains(&("quartiles".to_string(), "20 to 40".to_string())));
    }

    #[test]
    fn markers_and_axis_label_are_drawn() {
        let svg = ace_chart().svg;
        assert!(svg.contains(r#"<line id="end-date-marker" class="chart-marker" x1="800" y1="600" x2="800""#));
        assert!(svg.contains("↑ ACE"));
    }

    #[test]
    fn chart_layout_matches_full_build() {
        let spec = ace_spec();
        let dataset = ace_dataset();
        let layout = chart_layout(&spec, &dataset, Breakpoint::Large, &Selection::default()).unwrap();
        let chart = ace_chart();
        assert_eq!(layout.latest, chart.layout.latest);
        assert_eq!(layout.offsets, chart.layout.offsets);
    }

    #[test]
    fn date_label_is_long_form() {
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2024, 10, 5).unwrap()), "October 5, 2024");
    }

    #[test]
    fn error_panel_escapes_message() {
        let svg = render_error(&election_spec(), Breakpoint::Small, "bad <date>");
        assert!(svg.contains("chart-error"));
        assert!(svg.contains("bad &lt;date&gt;"));
    }
}
