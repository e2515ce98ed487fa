//! Error types for the deskmemo widget.
//!
//! Most failures in the widget core are logged and swallowed by the caller;
//! this enum is what the fallible building blocks return before that happens.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the deskmemo application.
#[derive(Error, Debug)]
pub enum MemoError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A directive arriving at the window owner could not be validated.
    #[error("Invalid directive: {message}")]
    InvalidDirective { message: String },

    /// The window owner is gone; directives can no longer be delivered.
    #[error("Directive channel closed")]
    ChannelClosed,

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
