// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test harness: boots a real coordinator daemon (TCP listener plus
//! reaper) on an ephemeral localhost port and drives it with a raw
//! wire-protocol client, the way an agent or operator tool would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use fleet_agents::AgentCreator;
use fleet_core::{Clock, FakeClock, SystemClock};
use fleet_daemon::coordinator::Coordinator;
use fleet_placement::PlacementConfig;
use fleet_wire::{decode, encode, Request, Response};

/// Generous bound for `wait_for` loops; the placement engine and reaper
/// react within milliseconds, this just guards against a hung test.
pub const WAIT_MAX_MS: u64 = 2_000;

/// A coordinator daemon bound to `127.0.0.1:0`, with its listener and
/// (optionally) its reaper running as real background tasks.
pub struct TestServer<C: Clock + 'static = SystemClock> {
    pub addr: SocketAddr,
    pub coordinator: Arc<Coordinator<C>>,
    shutdown: CancellationToken,
}

impl TestServer<SystemClock> {
    /// A server with no agent creator: generic agents must be registered by
    /// hand, provisioning (§4.2.1 Phase B) is never reachable.
    pub async fn start() -> Self {
        Self::start_with(None, PlacementConfig::default()).await
    }

    pub async fn start_with(creator: Option<Arc<dyn AgentCreator>>, config: PlacementConfig) -> Self {
        let coordinator = Arc::new(Coordinator::new(creator, config));
        Self::serve(coordinator, Some(Duration::from_millis(20))).await
    }
}

impl TestServer<FakeClock> {
    /// A server whose liveness clock is controlled by the caller. The
    /// reaper loop is not spawned; call `force_reap` to sweep deterministically.
    pub async fn start_with_clock(config: PlacementConfig, clock: FakeClock) -> Self {
        let coordinator = Arc::new(Coordinator::with_clock(None, config, clock));
        Self::serve(coordinator, None).await
    }

    pub async fn force_reap(&self) {
        self.coordinator.reap_dead_agents().await;
    }
}

impl<C: Clock + 'static> TestServer<C> {
    async fn serve(coordinator: Arc<Coordinator<C>>, reaper_interval: Option<Duration>) -> Self {
        let shutdown = CancellationToken::new();
        let addr = fleet_daemon::listener::serve(
            "127.0.0.1:0",
            Arc::clone(&coordinator),
            Duration::from_secs(5),
            shutdown.clone(),
        )
        .await
        .expect("bind ephemeral port");
        if let Some(interval) = reaper_interval {
            fleet_daemon::reaper::spawn(Arc::clone(&coordinator), interval, shutdown.clone());
        }
        Self { addr, coordinator, shutdown }
    }

    pub async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.expect("connect to coordinator");
        TestClient { stream }
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.coordinator.close().await;
    }
}

/// One short-lived connection to a `TestServer`, mirroring how a real agent
/// opens a connection per request (§6.1).
pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    pub async fn call(&mut self, request: &Request) -> Response {
        let payload = encode(request).expect("encode request");
        self.stream.write_all(&(payload.len() as u32).to_be_bytes()).await.expect("write length prefix");
        self.stream.write_all(&payload).await.expect("write payload");
        self.stream.flush().await.expect("flush");

        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).await.expect("read length prefix");
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await.expect("read payload");
        decode(&buf).expect("decode response")
    }
}

/// Polls `predicate` until it returns true or `max_ms` elapses, sleeping
/// between attempts. Returns whether the predicate was ever satisfied.
pub async fn wait_for<F>(max_ms: u64, mut predicate: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(max_ms);
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
