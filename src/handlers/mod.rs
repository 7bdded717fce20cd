mod contigs;
mod homepage;
mod subsequence;

pub use contigs::get_contigs;
pub use homepage::get_homepage;
pub use subsequence::get_subsequence;

use crate::storage::SequenceStore;
use axum::{
    Router,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SequenceStore>,
    pub homepage: Option<PathBuf>,
    pub max_subsequence_length: u64,
}

/// Every path the server answers, after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Homepage,
    Contigs,
    Subsequence,
}

impl Route {
    /// Resolve a request path. Query strings are not part of `path`.
    pub fn from_path(path: &str) -> Option<Self> {
        match normalize_path(path) {
            "/" => Some(Route::Homepage),
            "/contigs" => Some(Route::Contigs),
            "/subsequence" => Some(Route::Subsequence),
            _ => None,
        }
    }
}

/// Strip a single trailing slash unless the path is the root.
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let Some(route) = Route::from_path(request.uri().path()) else {
        tracing::warn!("path {} not found, sending 404", request.uri().path());
        return StatusCode::NOT_FOUND.into_response();
    };

    if request.method() != Method::GET && request.method() != Method::HEAD {
        tracing::warn!("{} not allowed on {:?}", request.method(), route);
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match route {
        Route::Homepage => get_homepage(&state, request).await,
        Route::Contigs => get_contigs(&state).await.into_response(),
        Route::Subsequence => {
            let query = request.uri().query().map(str::to_owned);
            get_subsequence(&state, query.as_deref())
                .await
                .into_response()
        }
    }
}
