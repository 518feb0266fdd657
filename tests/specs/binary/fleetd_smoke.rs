// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Smoke-tests the compiled `fleetd` binary itself (configuration from the
//! environment, real socket bind, real shutdown path) rather than exercising
//! `fleet_daemon` in-process as the other specs do.

use std::process::Command as StdCommand;
use std::time::Duration;

use assert_cmd::cargo::CommandCargoExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use fleet_wire::{decode, encode, Request, Response};

const BIND_ADDR: &str = "127.0.0.1:17712";

#[tokio::test]
async fn fleetd_binary_binds_its_configured_address_and_answers_check() {
    let mut child = StdCommand::cargo_bin("fleetd")
        .expect("fleetd binary built by this workspace")
        .env("FLEET_BIND_ADDR", BIND_ADDR)
        .env_remove("FLEET_LOCAL_AGENT_COMMAND")
        .env_remove("FLEET_AGENT_MODE")
        .spawn()
        .expect("spawn fleetd");

    let mut stream = connect_with_retries(BIND_ADDR).await;

    let payload = encode(&Request::Check).expect("encode request");
    stream.write_all(&(payload.len() as u32).to_be_bytes()).await.expect("write length prefix");
    stream.write_all(&payload).await.expect("write payload");
    stream.flush().await.expect("flush");

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.expect("read length prefix");
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.expect("read payload");
    let response: Response = decode(&buf).expect("decode response");
    assert_eq!(response, Response::Pong);

    let _ = child.kill();
    let _ = child.wait();
}

async fn connect_with_retries(addr: &str) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("fleetd never started listening on {addr}");
}
