// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP listener: accepts connections and handles them without blocking the
//! placement engine — one handler task per connection, spawned off the
//! accept loop, with no Unix-socket/attach/auth machinery since this
//! protocol has no use for it (§6.1: one JSON request per connection).

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fleet_wire::{read_request, write_response, ProtocolError};

use crate::coordinator::Coordinator;

/// Binds `addr` and runs the accept loop until `shutdown` is cancelled.
/// Returns the bound address so callers that asked for an ephemeral port
/// (`:0`) can discover what was actually chosen.
pub async fn serve<C: fleet_core::Clock + 'static>(
    addr: &str,
    coordinator: Arc<Coordinator<C>>,
    request_timeout: std::time::Duration,
    shutdown: CancellationToken,
) -> std::io::Result<std::net::SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "listening");

    tokio::spawn(accept_loop(listener, coordinator, request_timeout, shutdown));
    Ok(bound)
}

async fn accept_loop<C: fleet_core::Clock + 'static>(
    listener: TcpListener,
    coordinator: Arc<Coordinator<C>>,
    request_timeout: std::time::Duration,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("listener shutting down");
                return;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let coordinator = Arc::clone(&coordinator);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, &coordinator, request_timeout).await {
                                log_connection_error(err);
                            }
                        });
                    }
                    Err(err) => error!(%err, "accept error"),
                }
            }
        }
    }
}

async fn handle_connection<C: fleet_core::Clock>(
    mut stream: tokio::net::TcpStream,
    coordinator: &Coordinator<C>,
    request_timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.split();
    let request = read_request(&mut reader, request_timeout).await?;
    info!(?request, "received request");
    let response = coordinator.handle_request(request).await;
    write_response(&mut writer, &response, request_timeout).await
}

fn log_connection_error(err: ProtocolError) {
    match err {
        ProtocolError::ConnectionClosed => debug!("client disconnected before sending a request"),
        ProtocolError::Timeout => warn!("connection timed out"),
        other => error!(error = %other, "connection error"),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
