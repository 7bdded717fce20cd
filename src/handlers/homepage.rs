use super::AppState;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Serve the configured homepage file verbatim.
pub async fn get_homepage(state: &AppState, request: Request) -> Response {
    let Some(path) = &state.homepage else {
        tracing::warn!("no homepage configured, sending 404");
        return StatusCode::NOT_FOUND.into_response();
    };

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
