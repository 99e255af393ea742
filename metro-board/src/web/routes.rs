//! HTTP route handlers.

use std::path::Path;

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use tower_http::services::ServeDir;
use tracing::{error, warn};

use crate::controller::CredentialError;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the page assets directory. When the static cache is a
/// local directory, pass it as `data_dir` to serve it under `/data`.
pub fn create_router(state: AppState, static_dir: &Path, data_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/arrivals", get(arrivals))
        .route("/refresh", post(refresh))
        .route("/credential", post(save_credential).delete(remove_credential))
        .route("/visibility", post(set_visibility))
        .nest_service("/static", ServeDir::new(static_dir));

    let router = match data_dir {
        Some(dir) => router.nest_service("/data", ServeDir::new(dir)),
        None => router,
    };

    router.with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn current_panel(state: &AppState) -> PanelView {
    let board = &state.board;
    PanelView::new(
        &board.board_view(Utc::now()).await,
        board.last_updated().await,
        &board.status().await,
        board.poll_state().await,
        board.has_credential().await,
    )
}

async fn current_board(state: &AppState) -> BoardResponse {
    let board = &state.board;
    BoardResponse::new(
        &board.board_view(Utc::now()).await,
        board.last_updated().await,
        board.status().await,
        board.poll_state().await,
        board.has_credential().await,
    )
}

/// The board page. Every page load runs the source selection chain.
async fn index_page(State(state): State<AppState>) -> Result<Response, AppError> {
    state.board.load().await;

    let template = IndexTemplate {
        stops: StopView::from_pair(&state.board.config().stops),
        panel: current_panel(&state).await,
    };
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;

    Ok(Html(html).into_response())
}

/// The arrivals panel as an HTML fragment, or the board as JSON.
///
/// Without a saved key this re-reads the static cache first; the page
/// calls it once a minute.
async fn arrivals(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    state.board.reload_if_idle().await;
    board_response(&state, &headers).await
}

async fn board_response(state: &AppState, headers: &HeaderMap) -> Result<Response, AppError> {
    if accepts_html(headers) {
        let template = PanelTemplate {
            panel: current_panel(state).await,
        };
        let html = template.render().map_err(|e| AppError::Internal {
            message: format!("Template error: {}", e),
        })?;

        Ok(Html(html).into_response())
    } else {
        Ok(Json(current_board(state).await).into_response())
    }
}

/// Manual refresh.
///
/// HTML callers get the refreshed panel back; JSON callers get the outcome.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RefreshQuery>,
) -> Result<Response, AppError> {
    let outcome = state.board.refresh(query.path).await;

    if accepts_html(&headers) {
        board_response(&state, &headers).await
    } else {
        Ok(Json(RefreshResponse::from(outcome)).into_response())
    }
}

/// Save an API key.
async fn save_credential(
    State(state): State<AppState>,
    Json(req): Json<CredentialRequest>,
) -> Result<Json<CredentialResponse>, AppError> {
    state.board.save_credential(&req.api_key).await?;
    Ok(Json(credential_response(&state).await))
}

/// Remove the API key and the snapshot fetched with it.
async fn remove_credential(
    State(state): State<AppState>,
) -> Result<Json<CredentialResponse>, AppError> {
    state.board.remove_credential().await?;
    Ok(Json(credential_response(&state).await))
}

async fn credential_response(state: &AppState) -> CredentialResponse {
    CredentialResponse {
        status: state.board.status().await,
        poll_state: state.board.poll_state().await.label(),
    }
}

/// Page visibility transition.
async fn set_visibility(
    State(state): State<AppState>,
    Json(req): Json<VisibilityRequest>,
) -> StatusCode {
    state.board.set_visibility(req.visible).await;
    StatusCode::NO_CONTENT
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Invalid(_) => AppError::BadRequest {
                message: "Please enter a valid API key".to_string(),
            },
            CredentialError::Store(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => {
                warn!(%message, "Bad request");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Internal { message } => {
                error!(%message, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
