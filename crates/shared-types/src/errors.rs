//! # Error Types
//!
//! Error taxonomy shared across the bridge subsystems.
//!
//! Per the propagation policy, none of these terminate a worker loop: store
//! errors abort a single tick, decrypt errors are local to one record,
//! action errors are local to one queued action, and broker errors trigger
//! reconnect-on-next-use.

use thiserror::Error;

/// Errors from the chat-log store.
///
/// Treated as transient: a failed tick leaves the cursor unchanged and is
/// retried on the next scheduled tick.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("log store unavailable: {0}")]
    Unavailable(String),

    /// A query against the store failed.
    #[error("log store query failed: {0}")]
    Query(String),
}

/// Errors from the decryption provider.
///
/// Local to one record; the batch continues and the message stays
/// undecrypted.
#[derive(Debug, Clone, Error)]
pub enum DecryptError {
    /// The ciphertext was rejected by the provider.
    #[error("cipher rejected: {0}")]
    Cipher(String),

    /// The record's structured payload could not be parsed.
    #[error("malformed record payload: {0}")]
    Payload(String),
}

/// Errors from the external action dispatcher.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The dispatcher rejected or failed the action.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors from the broker transport and bridge.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// No live session and lazy reconnect also failed.
    #[error("not connected to broker")]
    NotConnected,

    /// Connect attempt exceeded the bounded timeout.
    #[error("broker connect timed out after {0}s")]
    ConnectTimeout(u64),

    /// Underlying transport I/O failure.
    #[error("broker transport error: {0}")]
    Transport(String),

    /// The transport session was closed by the peer.
    #[error("broker session closed")]
    Closed,
}

/// Errors from normalizing inbound commands into actions.
///
/// Malformed commands are dropped with a logged reason, never propagated to
/// the transport callback.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// Reply type the bridge does not handle.
    #[error("unsupported reply type: {0}")]
    UnsupportedType(String),

    /// Room identifier that does not parse as a channel id.
    #[error("invalid room id: {0}")]
    InvalidRoom(String),

    /// Payload that does not parse as a reply at all.
    #[error("malformed reply payload: {0}")]
    Malformed(String),
}

/// Errors from reading or writing persisted configuration.
///
/// Never fatal to the pipeline; the store falls back to defaults.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Config file could not be read or written.
    #[error("config io error: {0}")]
    Io(String),

    /// Config file contents did not parse.
    #[error("config parse error: {0}")]
    Parse(String),
}
