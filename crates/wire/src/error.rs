// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the length-prefixed JSON wire protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message exceeds maximum size ({0} bytes)")]
    MessageTooLarge(usize),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for message")]
    Timeout,
}
