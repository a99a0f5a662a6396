use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http_registry::parse_commitments;
use crate::ports::chain::{ChainError, GreeterChain};
use crate::ports::{GreetingSubmission, SubmissionFormatError, TxReceipt};

/// Shared application state for axum route handlers.
pub struct AppState<C: GreeterChain> {
    pub chain: Arc<C>,
    pub commitments: Option<PathBuf>,
}

impl<C: GreeterChain> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            commitments: self.commitments.clone(),
        }
    }
}

// ── Route handlers ──

/// POST /api/greet: parses the submission and calls `greet` on the contract.
pub async fn greet_handler<C: GreeterChain>(
    State(state): State<AppState<C>>,
    body: Result<Json<GreetingSubmission>, JsonRejection>,
) -> Result<Json<TxReceipt>, AppError> {
    let Json(submission) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let call = submission.to_call()?;

    tracing::info!(greeting = %submission.greeting, "relaying greeting");
    let receipt = state.chain.greet(&call).await.map_err(|e| {
        tracing::warn!("greet failed: {e}");
        AppError::from(e)
    })?;

    Ok(Json(receipt))
}

/// GET /identityCommitments.json: serves the configured member list.
pub async fn commitments_handler<C: GreeterChain>(
    State(state): State<AppState<C>>,
) -> Result<impl IntoResponse, AppError> {
    let path = state
        .commitments
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no commitments file configured".into()))?;

    let document = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read commitments: {e}")))?;
    parse_commitments(&document).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], document))
}

// ── Error handling ──

/// Application error type that maps to HTTP status codes.
///
/// Bodies are plain text: clients show a 500 body to the user as-is.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<SubmissionFormatError> for AppError {
    fn from(e: SubmissionFormatError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<ChainError> for AppError {
    fn from(e: ChainError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, msg).into_response()
    }
}
