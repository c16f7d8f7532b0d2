// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Error types for nav-lifecycle

use thiserror::Error;

/// Result type alias for nav-lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while coordinating a navigation
#[derive(Debug, Error)]
pub enum Error {
    /// A `waitUntil` value is not one of the recognised aliases
    ///
    /// Raised synchronously when a [`LifecycleWatcher`](crate::LifecycleWatcher) is
    /// constructed, before any subscription is created. Valid values are
    /// `load`, `domcontentloaded`, `networkidle0` and `networkidle2`.
    #[error("Unknown value for options.waitUntil: {0}")]
    InvalidWaitCondition(String),

    /// The transport to the browser went away while a navigation was pending
    #[error("Navigation failed because browser has disconnected!")]
    TerminatedDisconnected,

    /// The frame being watched was removed from the frame tree mid-navigation
    #[error("Navigating frame was detached")]
    TerminatedFrameDetached,

    /// The watcher was disposed before any outcome was delivered
    #[error("Navigation watcher was disposed")]
    Disposed,

    /// No Tokio runtime is available to drive a watcher
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Timeout waiting for the navigation to complete
    ///
    /// The caller owns the clock: the watcher never times itself out. The message
    /// carries the timeout that elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Protocol-level error (malformed event parameters)
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel closed unexpectedly
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns true for the outcomes that end a wait without success.
    pub fn is_termination(&self) -> bool {
        match self {
            Error::TerminatedDisconnected | Error::TerminatedFrameDetached => true,
            Error::Context(_, inner) => inner.is_termination(),
            _ => false,
        }
    }
}
