//! Desktop sticky-notes widget core
//!
//! This library holds the note collection, the lock/pin window mode and the
//! directive protocol between the widget surface and the process that owns
//! the OS window.

mod cli;
mod config;
pub mod directive;
mod errors;
pub mod kv_store;
mod note;
mod position_tracker;
mod storage;
mod types;
mod widget;
mod window_mode;
mod window_owner;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use directive::{ChannelSink, Directive, DirectiveSink};
pub use errors::*;
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore, SharedStore};
pub use note::*;
pub use position_tracker::*;
pub use storage::*;
pub use types::*;
pub use widget::*;
pub use window_mode::*;
pub use window_owner::*;
