//! HTTP endpoint handlers

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use tracing::{debug, info};

use crate::{
    error::AppError,
    services::Locale,
    state::AppState,
};
use super::responses::{
    HealthResponse, NewPageResponse, NewTimer, PageResponse, PageSettings, ReadyResponse,
    RenameQuery,
};

/// Header carrying the client's preferred locale code
pub const LOCALE_HEADER: &str = "user-locale";

/// Address used for rate limiting; requests without connection info share one bucket
fn client_address(connect_info: Option<ConnectInfo<SocketAddr>>) -> IpAddr {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn request_locale(state: &AppState, headers: &HeaderMap) -> Locale {
    let code = headers.get(LOCALE_HEADER).and_then(|v| v.to_str().ok());
    state.locales.resolve(code)
}

/// Handle POST /page/new - Create an empty page
pub async fn new_page_handler(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<NewPageResponse>, AppError> {
    state.limits.create_page.check(client_address(connect_info))?;

    let locale = request_locale(&state, &headers);
    let edit_link = state.create_page(&locale).await;
    Ok(Json(NewPageResponse { edit_link }))
}

/// Handle GET /page/:link - Fetch a page by its public or edit link
pub async fn get_page_handler(
    State(state): State<Arc<AppState>>,
    Path(link): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<PageResponse>, AppError> {
    state.limits.fetch_page.check(client_address(connect_info))?;

    let (page, permissions) = state.find_page(&link).ok_or(AppError::PageNotFound)?;
    let page = page.lock().await.snapshot();
    Ok(Json(PageResponse { page, permissions }))
}

/// Handle POST /timer/:edit_link/:number/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    state.update_timer(&edit_link, number, |timer| timer.start()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /timer/:edit_link/:number/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    state.update_timer(&edit_link, number, |timer| timer.pause()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /timer/:edit_link/:number/reset
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .update_timer(&edit_link, number, |timer| {
            timer.reset();
            true
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle DELETE /timer/:edit_link/:number
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    state.delete_timer(&edit_link, number).await?;
    debug!("Deleted timer {} of page {}", number, edit_link);
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /timer/:edit_link/:number/add_time/:seconds
///
/// `seconds` is a whole number; anything else is rejected by the extractor.
pub async fn add_time_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number, seconds)): Path<(String, i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .update_timer(&edit_link, number, |timer| {
            timer.add_time(seconds as f64);
            true
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /timer/:edit_link/:number/rename?name=...
pub async fn rename_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((edit_link, number)): Path<(String, i64)>,
    Query(RenameQuery { name }): Query<RenameQuery>,
) -> Result<StatusCode, AppError> {
    state
        .update_timer(&edit_link, number, |timer| {
            timer.rename(name);
            true
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /page/:edit_link/timers - Append a timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(edit_link): Path<String>,
    headers: HeaderMap,
    Json(new_timer): Json<NewTimer>,
) -> Result<StatusCode, AppError> {
    let locale = request_locale(&state, &headers);
    state.create_timer(&edit_link, new_timer.duration, &locale).await?;
    Ok(StatusCode::CREATED)
}

/// Handle PUT /page/:edit_link/settings - Replace the page name and color
pub async fn page_settings_handler(
    State(state): State<Arc<AppState>>,
    Path(edit_link): Path<String>,
    Json(settings): Json<PageSettings>,
) -> Result<StatusCode, AppError> {
    state.modify_settings(&edit_link, settings.name, settings.color).await?;
    info!("Updated settings of page {}", edit_link);
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /ready - Report whether the startup reload has completed
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    let ready = state.is_ready();
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadyResponse { ready }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        state.get_uptime(),
        state.public_links.len(),
        state.registry.page_count(),
    ))
}
