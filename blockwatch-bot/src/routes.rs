use crate::AppState;
use crate::error::AppError;

use axum::{
    Json,
    extract::{Path, State},
};
use axum_macros::debug_handler;
use blockwatch_core::{ServerKey, ServerOverview};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub(crate) struct ServerResponse {
    server: String,
    subscribers: usize,
    /// `online/max` from the last notified status
    online: Option<String>,
    players: Option<String>,
}

impl From<ServerOverview> for ServerResponse {
    fn from(overview: ServerOverview) -> Self {
        let (online, players) = match overview.status {
            Some(status) => (Some(status.online), Some(status.players)),
            None => (None, None),
        };
        Self {
            server: overview.server.to_string(),
            subscribers: overview.subscribers,
            online,
            players,
        }
    }
}

#[debug_handler]
pub(crate) async fn servers(State(state): State<Arc<AppState>>) -> Json<Vec<ServerResponse>> {
    let overviews = state.engine.overviews().await;
    Json(overviews.into_iter().map(ServerResponse::from).collect())
}

#[debug_handler]
pub(crate) async fn server(
    State(state): State<Arc<AppState>>,
    Path(server): Path<String>,
) -> Result<Json<ServerResponse>, AppError> {
    let key = ServerKey::parse(&server)?;
    let overview = state
        .engine
        .overview(&key)
        .await
        .ok_or_else(|| AppError::ServerNotTracked(key.to_string()))?;
    Ok(Json(overview.into()))
}
