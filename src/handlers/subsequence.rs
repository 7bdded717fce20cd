use super::AppState;
use crate::{
    Error, Result,
    types::{SubsequenceRequest, SubsequenceResponse},
};
use axum::Json;

pub async fn get_subsequence(
    state: &AppState,
    query: Option<&str>,
) -> Result<Json<SubsequenceResponse>> {
    let request = SubsequenceRequest::from_query(query)?;

    // Negative lengths fall through to the store's range check.
    if u64::try_from(request.length()).is_ok_and(|n| n > state.max_subsequence_length) {
        return Err(Error::PayloadTooLarge {
            requested: request.length(),
            limit: state.max_subsequence_length,
        });
    }

    let sequence = state
        .store
        .read(&request.contig, request.begin, request.end)
        .await?;

    tracing::debug!(
        "served {}:{}-{} ({} bp)",
        request.contig,
        request.begin,
        request.end,
        sequence.len()
    );

    Ok(Json(SubsequenceResponse {
        contig: request.contig,
        sequence,
        start_index: request.begin,
    }))
}
