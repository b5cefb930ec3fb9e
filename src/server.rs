use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use log::{error, info, warn};

use crate::config::ServerConfig;
use crate::data::{AssignmentInput, AssignmentOutput};
use crate::error::ScheduleError;
use crate::solver;

async fn assign_handler(
    Json(input): Json<AssignmentInput>,
) -> Result<Json<AssignmentOutput>, (StatusCode, String)> {
    // Every request builds its own model graph.
    match solver::build_assignment(&input) {
        Ok(output) => Ok(Json(output)),
        Err(e @ ScheduleError::Configuration(_)) => {
            warn!("rejected assignment request: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ ScheduleError::InvariantViolation(_)) => {
            error!("assignment run failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/v1/schedule/assign", post(assign_handler))
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}
