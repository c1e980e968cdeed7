//! P2P transport
//!
//! Accepts inbound connections, opens outbound ones, and runs a reader and
//! a writer task per connection. Framing lives in [`MessageCodec`]; parsed
//! messages are handed to a [`MessageHandler`]. Every write is bounded by the
//! send timeout, and a peer that cannot keep up is dropped on its own.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_SEND_TIMEOUT, MAX_MESSAGE_SIZE, PEER_QUEUE_CAPACITY,
};
use crate::p2p::{
    ConnectionDirection, Message, MessageCodec, P2pError, P2pResult, PeerId, PeerInfo, PeerRegistry,
};

/// Receives every well-formed message read from a peer
pub trait MessageHandler: Send + Sync + 'static {
    /// Handle `message` from `peer`. Must not block on I/O.
    fn handle_message(&self, peer: PeerId, message: Message);
}

/// Transport settings
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Timeout for establishing outbound connections
    pub connect_timeout: Duration,
    /// Timeout for writing a single message to a peer
    pub send_timeout: Duration,
    /// Largest accepted frame in bytes
    pub max_message_size: usize,
    /// Outbound messages queued per peer
    pub queue_capacity: usize,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            max_message_size: MAX_MESSAGE_SIZE,
            queue_capacity: PEER_QUEUE_CAPACITY,
        }
    }
}

/// Everything a connection task needs
#[derive(Clone)]
pub struct P2pContext {
    pub registry: Arc<PeerRegistry>,
    pub handler: Arc<dyn MessageHandler>,
    pub config: P2pConfig,
}

/// Bind the P2P listener
pub async fn bind(addr: SocketAddr) -> P2pResult<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for peers");
    Ok(listener)
}

/// Accept connections forever, registering each one
pub async fn accept_loop(listener: TcpListener, ctx: P2pContext) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                spawn_connection(stream, addr, ConnectionDirection::Inbound, &ctx);
            }
            Err(e) => {
                warn!(error = %e, "Accept error");
            }
        }
    }
}

/// Strip a `ws://` or `tcp://` scheme and any trailing slash from a peer address.
///
/// Only lets old address strings parse; the transport is raw TCP either way,
/// so a WebSocket-only peer still cannot complete a handshake.
pub fn normalize_address(address: &str) -> &str {
    let address = address.trim();
    let address = address
        .strip_prefix("ws://")
        .or_else(|| address.strip_prefix("tcp://"))
        .unwrap_or(address);
    address.trim_end_matches('/')
}

/// Open an outbound connection and register it.
///
/// Fails on timeout or connection error; there is no retry.
pub async fn connect(address: &str, ctx: &P2pContext) -> P2pResult<PeerInfo> {
    let target = normalize_address(address);
    if target.is_empty() {
        return Err(P2pError::InvalidAddress(address.to_string()));
    }
    debug!(addr = target, "Connecting to peer");

    let after = ctx.config.connect_timeout;
    let stream = match timeout(after, TcpStream::connect(target)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(P2pError::Io(e)),
        Err(_) => {
            return Err(P2pError::ConnectionTimeout {
                addr: target.to_string(),
                after,
            })
        }
    };
    let addr = stream.peer_addr()?;

    Ok(spawn_connection(stream, addr, ConnectionDirection::Outbound, ctx))
}

/// Register a connected stream and start its reader and writer tasks
pub fn spawn_connection(
    stream: TcpStream,
    addr: SocketAddr,
    direction: ConnectionDirection,
    ctx: &P2pContext,
) -> PeerInfo {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY");
    }

    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel(ctx.config.queue_capacity);

    let info = ctx.registry.register(addr, direction, outbound_tx);

    let reader = tokio::spawn(read_loop(read_half, info.id, ctx.clone()));
    tokio::spawn(write_loop(
        write_half,
        outbound_rx,
        info.id,
        reader.abort_handle(),
        ctx.clone(),
    ));

    info
}

async fn read_loop(read_half: OwnedReadHalf, peer: PeerId, ctx: P2pContext) {
    let mut frames = FramedRead::new(read_half, MessageCodec::new(ctx.config.max_message_size));

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(message) => {
                debug!(peer = %peer, command = message.command(), "Received message");
                ctx.handler.handle_message(peer, message);
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Connection failed");
                break;
            }
        }
    }

    debug!(peer = %peer, "Reader finished");
    ctx.registry.unregister(peer);
}

async fn write_loop(
    write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Message>,
    peer: PeerId,
    reader: AbortHandle,
    ctx: P2pContext,
) {
    let mut frames = FramedWrite::new(write_half, MessageCodec::new(ctx.config.max_message_size));

    while let Some(message) = outbound.recv().await {
        let result = match timeout(ctx.config.send_timeout, frames.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(P2pError::SendTimeout(ctx.config.send_timeout)),
        };
        match result {
            Ok(()) => {}
            Err(e) if e.is_transport_failure() => {
                warn!(peer = %peer, error = %e, "Write failed, dropping peer");
                break;
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "Failed to encode message");
            }
        }
    }

    reader.abort();
    ctx.registry.unregister(peer);
    let _ = frames.get_mut().shutdown().await;
}
