use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::json;

use crate::config::Cli;
use crate::data::{ScheduledClass, SolveReport, TimetableInput};
use crate::engine::{HighsEngine, SolveOptions, SolverEngine};
use crate::error::TimetableError;
use crate::solver;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SolverEngine>,
    pub options: SolveOptions,
}

impl IntoResponse for TimetableError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            error!("An error occurred: {self}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.".to_string(),
            )
        };
        (status, Json(json!({ "error": message, "kind": self.kind() }))).into_response()
    }
}

async fn run_solver(state: AppState, payload: Result<Json<TimetableInput>, JsonRejection>) -> Result<SolveReport, TimetableError> {
    let Json(input) = payload.map_err(|rejection| TimetableError::Validation(rejection.body_text()))?;
    info!(
        "Received timetable request: {} classrooms, {} faculties, {} batches",
        input.classrooms.len(),
        input.faculties.len(),
        input.batches.len()
    );
    tokio::task::spawn_blocking(move || solver::solve(&input, state.engine.as_ref(), &state.options))
        .await
        .map_err(|e| TimetableError::Internal(format!("solver task failed: {e}")))?
}

async fn solve_handler(
    State(state): State<AppState>,
    payload: Result<Json<TimetableInput>, JsonRejection>,
) -> Result<Json<Vec<ScheduledClass>>, TimetableError> {
    let report = run_solver(state, payload).await?;
    Ok(Json(report.schedule))
}

async fn report_handler(
    State(state): State<AppState>,
    payload: Result<Json<TimetableInput>, JsonRejection>,
) -> Result<Json<SolveReport>, TimetableError> {
    Ok(Json(run_solver(state, payload).await?))
}

async fn health_handler() -> &'static str {
    "Timetable solver service is running."
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/solve-timetable", post(solve_handler))
        .route("/solve-timetable/report", post(report_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(cli: &Cli) -> std::io::Result<()> {
    let state = AppState {
        engine: Arc::new(HighsEngine),
        options: cli.solve_options(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
