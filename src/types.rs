//! Shared types for the deskmemo application.
use clap::Subcommand;

use crate::{MemoError, NoteId};

/// A specialized Result type for deskmemo operations.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Available subcommands for the deskmemo application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new note
    Add {
        /// Title of the note (defaults to the placeholder title)
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note (defaults to the placeholder content)
        #[clap(short, long)]
        content: Option<String>,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: NoteId,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: NoteId,
    },

    /// List notes the way the widget shows them
    List {
        /// Show every note instead of the collapsed view
        #[clap(short, long)]
        all: bool,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Lock the widget in place
    Lock,

    /// Unlock the widget for moving and editing
    Unlock,

    /// Keep the widget above other windows
    Pin,

    /// Let other windows cover the widget again
    Unpin,

    /// Show lock, pin and position state
    Status,

    /// Register or unregister start at login
    Autostart {
        /// "on" or "off"
        #[clap(value_parser = ["on", "off"])]
        state: String,
    },

    /// Run the window owner and position tracker until Ctrl-C
    Run,
}
