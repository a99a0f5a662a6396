//! HTTP relay: accepts greeting submissions and sends the `greet`
//! transaction on the member's behalf, so the member's address never
//! touches the chain.

pub mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;

use crate::ports::chain::GreeterChain;

use self::routes::{commitments_handler, greet_handler, AppState};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the relay routes.
///
/// - `POST /api/greet`
/// - `GET /identityCommitments.json` (only when `commitments` is set)
pub fn router<C: GreeterChain + 'static>(chain: Arc<C>, commitments: Option<PathBuf>) -> Router {
    let state = AppState { chain, commitments };
    Router::new()
        .route("/api/greet", post(greet_handler::<C>))
        .route("/identityCommitments.json", get(commitments_handler::<C>))
        .with_state(state)
}

/// Bind and serve the relay in a background task.
///
/// Returns the server task and the bound address (useful with port 0).
pub async fn start_relay<C: GreeterChain + 'static>(
    chain: Arc<C>,
    commitments: Option<PathBuf>,
    addr: SocketAddr,
) -> Result<(JoinHandle<()>, SocketAddr), RelayError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;
    let bound_addr = listener.local_addr()?;

    let app = router(chain, commitments);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("relay server stopped: {e}");
        }
    });

    Ok((handle, bound_addr))
}
