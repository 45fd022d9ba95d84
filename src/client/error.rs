// ABOUTME: Error types for opening, binding and using an SMPP transceiver session
// ABOUTME: SmppError covers session setup and teardown, SubmitError covers a single submission

use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::datatypes::CommandStatus;
use std::io;
use thiserror::Error;

/// Failure to open, bind or close a session
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// Framing or decoding failure on the SMPP stream
    #[error("Transport error: {0}")]
    Transport(#[from] ConnectionError),

    /// An outbound PDU could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] CodecError),

    /// SMPP protocol error indicated by command_status field
    #[error("Protocol error: {0:?}")]
    Protocol(CommandStatus),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Unexpected PDU received (wrong response type for request)
    #[error("Unexpected PDU: expected {expected}, got {actual}")]
    UnexpectedPdu {
        expected: &'static str,
        actual: &'static str,
    },

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

/// Failure to hand one submit_sm to the session
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("session is closed")]
    SessionClosed,

    #[error("cannot encode submit_sm: {0}")]
    Encode(#[from] CodecError),
}
