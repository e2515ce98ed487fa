//! One-way directives from the widget to the window-owning process.
//!
//! The set of directives is closed. On the wire a directive is a JSON object
//! naming its channel plus an optional payload, for example
//! `{"channel":"set-always-on-top","payload":true}`; anything else is rejected
//! by [`Directive::decode`] at the process boundary. [`ChannelSink`] carries
//! the encoded form, so the window owner decodes everything it applies.
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{MemoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum Directive {
    /// Enable or disable drag/edit pass-through for the note content region
    #[serde(rename = "set-click-through")]
    ClickThrough(bool),
    /// Request or release OS always-on-top stacking
    #[serde(rename = "set-always-on-top")]
    AlwaysOnTop(bool),
    /// Register or unregister the OS login item
    #[serde(rename = "toggle-auto-start")]
    AutoStart(bool),
    /// Terminate the application
    #[serde(rename = "quit")]
    Quit,
}

impl Directive {
    /// Validates and decodes a directive received from another process.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| MemoError::InvalidDirective {
            message: e.to_string(),
        })
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Delivery side of the directive channel.
///
/// Sending never blocks and is never retried; callers log failures and move
/// on.
pub trait DirectiveSink: Send + Sync {
    fn send(&self, directive: Directive) -> Result<()>;
}

/// Sends a directive, logging instead of returning a delivery failure.
pub fn send_or_log(sink: &dyn DirectiveSink, directive: Directive) {
    trace!("Sending directive {:?}", directive);
    if let Err(e) = sink.send(directive) {
        warn!("Directive {:?} was not delivered: {}", directive, e);
    }
}

/// [`DirectiveSink`] backed by an unbounded tokio channel to the window owner.
/// Directives travel encoded.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the window owner loop consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DirectiveSink for ChannelSink {
    fn send(&self, directive: Directive) -> Result<()> {
        let message = directive.encode()?;
        self.tx.send(message).map_err(|_| MemoError::ChannelClosed)
    }
}
