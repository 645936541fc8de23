use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use rayon::ThreadPoolBuildError;
use tower::limit::ConcurrencyLimitLayer;

use crate::arranger::ArrangePool;
use crate::catalog::Limits;
use crate::config::Config;
use crate::data::{SeatingRequest, ValidationRequest};
use crate::error::PlanError;
use crate::solver;

/// Shared by every request: size limits and the arrangement pool.
#[derive(Clone)]
pub struct AppState {
    limits: Limits,
    pool: ArrangePool,
    max_concurrent_solves: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, ThreadPoolBuildError> {
        Ok(Self {
            limits: config.limits(),
            pool: ArrangePool::with_threads(config.arrange_threads)?,
            max_concurrent_solves: config.max_concurrent_solves,
        })
    }
}

fn plan_error_response(e: PlanError) -> Response {
    match &e {
        PlanError::InvalidInput(reason) => warn!("Rejected seating request: {}", reason),
        PlanError::ConstraintViolation(_) => error!("Seating request failed: {}", e),
    }
    e.into_response()
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(input): Json<SeatingRequest>,
) -> Response {
    let solved =
        tokio::task::spawn_blocking(move || solver::solve(&input, &state.limits, &state.pool))
            .await;
    match solved {
        Ok(Ok(output)) => Json(output).into_response(),
        Ok(Err(e)) => plan_error_response(e),
        Err(e) => {
            error!("Solver task did not complete: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn validate_handler(
    State(state): State<AppState>,
    Json(input): Json<ValidationRequest>,
) -> Response {
    let checked =
        tokio::task::spawn_blocking(move || solver::revalidate(&input, &state.limits)).await;
    match checked {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) => plan_error_response(e),
        Err(e) => {
            error!("Validation task did not complete: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    let solve_limit = ConcurrencyLimitLayer::new(state.max_concurrent_solves);
    Router::new()
        .route("/v1/seating/solve", post(solve_handler).layer(solve_limit))
        .route("/v1/seating/validate", post(validate_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn run_server(config: &Config, state: AppState) -> std::io::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
