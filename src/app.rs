use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/web/:chart", get(handlers::web_chart))
        .route("/embed/:chart", get(handlers::embed_chart))
        .route("/api/charts/:chart/svg", get(handlers::chart_svg))
        .route("/api/charts/:chart/tooltip", get(handlers::chart_tooltip))
        .nest_service("/static", static_files)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("received {} request to {}", request.method(), request.uri());
    next.run(request).await
}
