//! Serving the mock over TCP.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::routes::create_router;
use crate::AppState;

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Mock service listening on http://{}/api", addr);
    axum::serve(listener, create_router(state)).await
}

/// Bind `addr` and serve in the background.
///
/// Returns the bound address, which differs from `addr` when port 0 was
/// requested.
pub async fn spawn(
    addr: SocketAddr,
    state: AppState,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            error!("Mock service error: {}", e);
        }
    });
    Ok((bound, handle))
}
