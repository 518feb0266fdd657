// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator RPC protocol (§6.1).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod dto;
mod error;
mod framing;
mod request;
mod response;

pub use dto::{
    AgentFilter, AgentKindSnapshot, AgentSnapshot, CredentialRecord, DispatchRecord,
    GridTaskFilter, GridTaskInput, JobDefinition, JobDefinitionKind, JobStateUpdate, NextTask,
    RegistrationRecord,
};
pub use error::ProtocolError;
pub use framing::{decode, encode, read_message, read_request, write_message, write_response, MAX_MESSAGE_SIZE};
pub use request::Request;
pub use response::Response;
