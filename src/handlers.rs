use crate::chart::render::render_error;
use crate::chart::target::TOOLTIP_DATE_ID;
use crate::chart::{Breakpoint, ChartSession, ChartSpec, Dataset, PageTarget};
use crate::errors::AppError;
use crate::models::{SvgQuery, TooltipQuery, TooltipResponse};
use crate::state::AppState;
use crate::ui::{PageKind, render_chart_page, render_index};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use std::sync::Arc;

/// Viewport width assumed when the page script does not send one.
const DEFAULT_VIEWPORT_WIDTH: u32 = 1200;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.manifest))
}

pub async fn web_chart(
    State(state): State<AppState>,
    Path(chart): Path<String>,
) -> Result<Html<String>, AppError> {
    chart_page(&state, &chart, PageKind::Web)
}

pub async fn embed_chart(
    State(state): State<AppState>,
    Path(chart): Path<String>,
) -> Result<Html<String>, AppError> {
    chart_page(&state, &chart, PageKind::Embed)
}

fn chart_page(state: &AppState, chart: &str, kind: PageKind) -> Result<Html<String>, AppError> {
    let entry = state
        .manifest
        .get(chart)
        .ok_or_else(|| AppError::not_found(format!("unknown chart '{chart}'")))?;
    let spec = state.charts.get(chart).map(Arc::as_ref);
    Ok(Html(render_chart_page(kind, chart, entry, spec)))
}

pub async fn chart_svg(
    State(state): State<AppState>,
    Path(chart): Path<String>,
    Query(query): Query<SvgQuery>,
) -> Result<impl IntoResponse, AppError> {
    let spec = state.chart(&chart)?;
    let mut page = PageTarget::for_chart(&spec);
    let mut session = ChartSession::new(Arc::clone(&spec), query.width.unwrap_or(DEFAULT_VIEWPORT_WIDTH));

    if let Some(variant) = query.variant.as_deref().filter(|v| !v.is_empty()) {
        session.select_variant(variant, &mut page)?;
    }
    if query.aux == Some(0) {
        session.toggle_auxiliary(&mut page)?;
    }
    for series in query.highlight.iter().flat_map(|h| h.split(',')) {
        let series = series.trim();
        if !series.is_empty() {
            session.toggle_series(series, &mut page)?;
        }
    }

    load_session(&state, &chart, &spec, &mut session, &mut page).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        page.chart().unwrap_or_default().to_string(),
    ))
}

pub async fn chart_tooltip(
    State(state): State<AppState>,
    Path(chart): Path<String>,
    Query(query): Query<TooltipQuery>,
) -> Result<Json<TooltipResponse>, AppError> {
    let spec = state.chart(&chart)?;
    if !spec.tooltip {
        return Err(AppError::not_found(format!("chart '{chart}' has no tooltip")));
    }
    let mut page = PageTarget::for_chart(&spec);
    let mut session = ChartSession::new(Arc::clone(&spec), query.width.unwrap_or(DEFAULT_VIEWPORT_WIDTH));
    if let Some(variant) = query.variant.as_deref().filter(|v| !v.is_empty()) {
        session.select_variant(variant, &mut page)?;
    }

    let breakpoint = session.breakpoint();
    let dataset = chart_dataset(&state, &chart, &spec, breakpoint).await?;
    session
        .attach(dataset)
        .map_err(|err| with_error_panel(err.into(), &spec, breakpoint))?;
    session.pointer_moved(query.x, &mut page)?;

    let x = match (page.marker_x(), session.layout()) {
        (Some(x), _) => x,
        (None, Some(layout)) => layout.latest.map(|date| layout.x.map(date)).unwrap_or(query.x),
        (None, None) => query.x,
    };
    let mut fields = page.texts().clone();
    let date = fields.remove(TOOLTIP_DATE_ID).unwrap_or_default();

    Ok(Json(TooltipResponse {
        date,
        x,
        breakpoint: session.breakpoint().as_str().to_string(),
        fields,
    }))
}

async fn load_session(
    state: &AppState,
    chart: &str,
    spec: &ChartSpec,
    session: &mut ChartSession,
    page: &mut PageTarget,
) -> Result<(), AppError> {
    let breakpoint = session.breakpoint();
    let dataset = chart_dataset(state, chart, spec, breakpoint).await?;
    session
        .load(dataset, page)
        .map_err(|err| with_error_panel(err.into(), spec, breakpoint))
}

async fn chart_dataset(
    state: &AppState,
    chart: &str,
    spec: &ChartSpec,
    breakpoint: Breakpoint,
) -> Result<Arc<Dataset>, AppError> {
    state
        .dataset(chart, spec)
        .await
        .map_err(|err| with_error_panel(err, spec, breakpoint))
}

fn with_error_panel(err: AppError, spec: &ChartSpec, breakpoint: Breakpoint) -> AppError {
    match err {
        AppError::DataFormat { message, .. } => {
            let svg = render_error(spec, breakpoint, &message);
            AppError::DataFormat { message, svg }
        }
        other => other,
    }
}
