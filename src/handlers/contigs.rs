use super::AppState;
use crate::types::ContigEntry;
use axum::Json;

/// Every contig with its length, in index order.
pub async fn get_contigs(state: &AppState) -> Json<Vec<ContigEntry>> {
    Json(state.store.contigs())
}
