use crate::chart::render::escape_text;
use crate::chart::spec::ChartSpec;
use crate::chart::target::{CHART_CONTAINER_ID, TOOLTIP_DATE_ID, tooltip_value_id};
use crate::models::{Manifest, ManifestEntry};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Full page on the charts site.
    Web,
    /// Bare chart for an iframe.
    Embed,
}

pub fn render_index(manifest: &Manifest) -> String {
    let mut items = String::new();
    for (id, entry) in &manifest.data {
        let _ = write!(
            items,
            r#"
      <li class="chart-link">
        <a href="/web/{id}">{title}</a>
        <p class="subtitle">{subtitle}</p>
        <p class="updated">Last updated {updated}</p>
      </li>"#,
            id = escape_text(id),
            title = escape_text(&entry.chart_title),
            subtitle = escape_text(&entry.chart_subtitle),
            updated = escape_text(&entry.chart_last_update),
        );
    }
    if items.is_empty() {
        items.push_str(r#"<li class="chart-link empty">No charts published yet.</li>"#);
    }
    fill(INDEX_HTML, &[("CHART_LIST", items)])
}

pub fn render_chart_page(kind: PageKind, chart_id: &str, entry: &ManifestEntry, spec: Option<&ChartSpec>) -> String {
    let template = match kind {
        PageKind::Web => CHART_HTML,
        PageKind::Embed => EMBED_HTML,
    };
    let (breakpoints, tooltip) = match spec {
        Some(spec) => (
            format!("{},{}", spec.breakpoints[0], spec.breakpoints[1]),
            spec.tooltip,
        ),
        None => ("500,750".to_string(), false),
    };

    fill(
        template,
        &[
            ("PAGE_TITLE", escape_text(&entry.page_title)),
            ("CHART_STYLESHEET", escape_text(&entry.chart_stylesheet)),
            ("CHART_SCRIPT", escape_text(&entry.chart_script)),
            ("CHART_TITLE", escape_text(&entry.chart_title)),
            ("CHART_SUBTITLE", escape_text(&entry.chart_subtitle)),
            ("CHART_DESCRIPTION", escape_text(&entry.chart_description)),
            ("CHART_DATA_SOURCE", escape_text(&entry.chart_data_source)),
            ("CHART_LAST_UPDATE", escape_text(&entry.chart_last_update)),
            ("CHART_ID", escape_text(chart_id)),
            ("CHART_CONTAINER_ID", CHART_CONTAINER_ID.to_string()),
            ("CHART_BREAKPOINTS", breakpoints),
            ("CHART_HAS_TOOLTIP", tooltip.to_string()),
            ("CHART_CONTROLS", spec.map(render_controls).unwrap_or_default()),
            ("CHART_TOOLTIP", spec.filter(|s| s.tooltip).map(render_tooltip).unwrap_or_default()),
        ],
    )
}

/// Series highlight toggles, the auxiliary switch and the variant picker.
fn render_controls(spec: &ChartSpec) -> String {
    let mut html = String::from(r#"<div class="chart-controls">"#);
    for series in &spec.series {
        let _ = write!(
            html,
            r#"<button type="button" class="series-toggle" data-series="{id}" aria-pressed="false"><span class="tooltip-icon" id="legend-icon-{id}"></span>{label}</button>"#,
            id = escape_text(&series.id),
            label = escape_text(&series.label),
        );
    }
    if spec.series.iter().any(|series| series.auxiliary) {
        html.push_str(r#"<button type="button" class="aux-toggle" aria-pressed="true">Comparison lines</button>"#);
    }
    if !spec.variants.is_empty() {
        html.push_str(r#"<select class="variant-select">"#);
        for variant in &spec.variants {
            let variant = escape_text(variant);
            let _ = write!(html, r#"<option value="{variant}">{variant}</option>"#);
        }
        html.push_str("</select>");
    }
    html.push_str("</div>");
    html
}

/// Tooltip box overlaid on the chart; the renderer writes into its spans.
fn render_tooltip(spec: &ChartSpec) -> String {
    let mut html = format!(r#"<div id="tooltip-box"><h3 id="{TOOLTIP_DATE_ID}"></h3>"#);
    for series in spec.series.iter().filter(|series| series.in_tooltip) {
        let id = escape_text(&series.id);
        let _ = write!(
            html,
            r#"<div class="tooltip-row"><div class="tooltip-icon" id="tooltip-icon-{id}"></div><p class="tooltip-text"><span class="tooltip-text-label">{label}:</span> <span id="{value_id}">-</span></p></div>"#,
            label = escape_text(&series.label),
            value_id = tooltip_value_id(&id),
        );
    }
    html.push_str("</div>");
    html
}

/// Replaces each `{{KEY}}` in one pass, so substituted values are never
/// scanned for placeholders themselves.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Charts</title>
  <link rel="stylesheet" href="/static/css/charts.css" />
</head>
<body>
  <main class="app">
    <header>
      <h1>Charts</h1>
      <p class="subtitle">Forecast trackers, updated as new data comes in.</p>
    </header>
    <ul class="chart-list">{{CHART_LIST}}
    </ul>
  </main>
</body>
</html>
"#;

const CHART_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{PAGE_TITLE}}</title>
  <link rel="stylesheet" href="/static/css/charts.css" />
  <link rel="stylesheet" href="{{CHART_STYLESHEET}}" />
</head>
<body>
  <main class="app">
    <nav><a href="/">&larr; All charts</a></nav>
    <header class="chart-header">
      <h1 id="chart-title">{{CHART_TITLE}}</h1>
      <p id="chart-subtitle" class="subtitle">{{CHART_SUBTITLE}}</p>
    </header>

    {{CHART_CONTROLS}}

    <section id="{{CHART_CONTAINER_ID}}" class="chart-body" data-chart="{{CHART_ID}}" data-breakpoints="{{CHART_BREAKPOINTS}}" data-tooltip="{{CHART_HAS_TOOLTIP}}">
      {{CHART_TOOLTIP}}
      <div class="chart-svg" aria-live="polite"></div>
    </section>

    <section class="chart-notes">
      <p id="chart-description">{{CHART_DESCRIPTION}}</p>
      <p id="chart-data-source" class="source">Source: {{CHART_DATA_SOURCE}}</p>
      <p id="chart-last-update" class="updated">Last updated {{CHART_LAST_UPDATE}}</p>
    </section>
  </main>

  <script src="{{CHART_SCRIPT}}"></script>
</body>
</html>
"#;

const EMBED_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{PAGE_TITLE}}</title>
  <link rel="stylesheet" href="/static/css/charts.css" />
  <link rel="stylesheet" href="{{CHART_STYLESHEET}}" />
</head>
<body class="embed">
  <header class="chart-header">
    <h2 id="chart-title">{{CHART_TITLE}}</h2>
    <p id="chart-subtitle" class="subtitle">{{CHART_SUBTITLE}}</p>
  </header>

  {{CHART_CONTROLS}}

  <section id="{{CHART_CONTAINER_ID}}" class="chart-body" data-chart="{{CHART_ID}}" data-breakpoints="{{CHART_BREAKPOINTS}}" data-tooltip="{{CHART_HAS_TOOLTIP}}">
    {{CHART_TOOLTIP}}
    <div class="chart-svg" aria-live="polite"></div>
  </section>

  <footer class="chart-notes">
    <p id="chart-data-source" class="source">Source: {{CHART_DATA_SOURCE}} &middot; Updated {{CHART_LAST_UPDATE}}</p>
    <p class="description" hidden>{{CHART_DESCRIPTION}}</p>
  </footer>

  <script src="{{CHART_SCRIPT}}"></script>
</body>
</html>
"#;
