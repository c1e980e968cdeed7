//! HTTP Method Implementations
//!
//! Each handler maps one control-surface route onto a node operation.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::consensus::Block;
use crate::node::{Node, NodeError};

/// Handler state shared by every route
pub type RpcState = Arc<Node>;

/// Body of `POST /mineBlock`
#[derive(Debug, Deserialize, Serialize)]
pub struct MineBlockRequest {
    pub data: String,
}

/// Body of `POST /addPeer`
#[derive(Debug, Deserialize, Serialize)]
pub struct AddPeerRequest {
    pub peer: String,
}

/// Error response as status plus plain-text reason
pub type RpcError = (StatusCode, String);

impl From<NodeError> for (StatusCode, String) {
    fn from(err: NodeError) -> Self {
        let status = match err {
            NodeError::BlockRejected(_) => StatusCode::CONFLICT,
            NodeError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        (status, err.to_string())
    }
}

/// Returns the full chain
pub async fn get_blocks(State(node): State<RpcState>) -> Json<Vec<Block>> {
    Json(node.chain_snapshot())
}

/// Mines a block with the given data on the current tip
pub async fn mine_block(
    State(node): State<RpcState>,
    Json(request): Json<MineBlockRequest>,
) -> Result<Json<Block>, RpcError> {
    let block = node.submit_local_block(&request.data)?;
    Ok(Json(block))
}

/// Returns the addresses of connected peers
pub async fn get_peers(State(node): State<RpcState>) -> Json<Vec<String>> {
    Json(node.list_peers().iter().map(|addr| addr.to_string()).collect())
}

/// Connects to a new peer
pub async fn add_peer(
    State(node): State<RpcState>,
    Json(request): Json<AddPeerRequest>,
) -> Result<StatusCode, RpcError> {
    node.add_peer(&request.peer).await?;
    Ok(StatusCode::OK)
}
