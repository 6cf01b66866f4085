use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::filter::{FilterQuery, FilterState};
use crate::html::render_page;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/view", get(view_json))
        .route("/health", get(health))
        .with_state(dashboard)
}

pub async fn serve(dashboard: Arc<Dashboard>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(dashboard)).await?;
    Ok(())
}

/// Full page, including the narrative insights.
async fn index(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<FilterQuery>,
) -> Html<String> {
    let state = FilterState::from(query);
    debug!("GET / {:?}", state);
    let view = dashboard.render(&state).await;
    Html(render_page(&view, dashboard.format()))
}

/// Data panels only, as JSON. Does not call the chat model.
async fn view_json(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let state = FilterState::from(query);
    Json(dashboard.render_data(&state)).into_response()
}

async fn health() -> &'static str {
    "ok"
}
