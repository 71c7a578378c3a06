//! Status page handler.

use axum::{extract::State, response::Html, Extension};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequestId;
use crate::snapshot::StatusSnapshot;
use crate::state::AppState;
use crate::templates::render_status_page;

/// Render the status page for the current request.
///
/// Metadata lookups are best effort and never fail the request; only a
/// template fault produces an error response.
#[instrument(name = "status::index", skip(state, request_id))]
pub async fn index(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Html<String>, AppError> {
    let snapshot = StatusSnapshot::collect(&state).await;
    tracing::debug!(
        request_id = %request_id.0,
        container_id = %snapshot.container_id,
        hostname = %snapshot.hostname,
        "Collected status snapshot"
    );

    let html = render_status_page(&state.tera, &state.config.ui, &snapshot)?;
    Ok(Html(html))
}
