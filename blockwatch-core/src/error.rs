use std::time::Duration;

use thiserror::Error;

use crate::models::ServerKey;

/// A probe that didn't produce a usable status.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty response")]
    EmptyResponse,
}

/// User-facing subscription validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("{0} is already added")]
    AlreadySubscribed(ServerKey),

    #[error("{0} was not added")]
    NotSubscribed(ServerKey),
}

/// Sending or deleting a message through the messaging gateway failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("messaging gateway error: {0}")]
    Gateway(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidServerKey {
    #[error("Server address cannot be empty")]
    EmptyHost,

    #[error("Server host too long (max 253 characters, got {0})")]
    HostTooLong(usize),

    #[error("Server host contains invalid characters: {0}")]
    InvalidHost(String),

    #[error("Invalid server port: {0}")]
    InvalidPort(String),
}
