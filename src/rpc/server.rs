//! HTTP Server
//!
//! Axum-based control surface over the node: dump the chain, mine a block,
//! list and add peers.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::rpc::methods::{add_peer, get_blocks, get_peers, mine_block, RpcState};

/// Build the control-surface router
pub fn router(state: RpcState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/blocks", get(get_blocks))
        .route("/mineBlock", post(mine_block))
        .route("/peers", get(get_peers))
        .route("/addPeer", post(add_peer))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the specified address
pub async fn start_rpc_server(state: RpcState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for HTTP");
    axum::serve(listener, router(state)).await
}
