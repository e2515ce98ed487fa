//! CLI module for the deskmemo application
//!
//! Drives the widget without a real window: directives go to an in-process
//! window owner backed by [`LoggingBackend`].
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::{
    run_event_loop, saved_position, ChannelSink, Commands, Config, Intent, LoggingBackend,
    MemoError, Note, NoteId, PositionSource, PositionTracker, Result, SharedStore, Widget,
    WidgetView, WindowOwner,
};

/// Window stand-in for headless runs: it stays wherever it was last saved.
struct HeadlessWindow {
    origin: Option<(i32, i32)>,
}

impl PositionSource for HeadlessWindow {
    fn position(&self) -> Option<(i32, i32)> {
        self.origin
    }
}

type OwnerTask = JoinHandle<WindowOwner<LoggingBackend>>;

/// CLI Application handler - turns commands into widget intents
pub struct App {
    /// Shared persisted state
    store: SharedStore,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    pub fn new(store: SharedStore, config: Config, verbose: bool) -> Self {
        Self {
            store,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        if let Commands::Run = command {
            return self.run_widget().await;
        }

        let (mut widget, owner) = self.start_widget();
        let outcome = self.execute(&mut widget, command);

        // Dropping the widget drops the last sender and ends the owner loop.
        drop(widget);
        join_owner(owner).await?;
        outcome
    }

    fn start_widget(&self) -> (Widget, OwnerTask) {
        let (sink, rx) = ChannelSink::channel();
        let owner = tokio::spawn(run_event_loop(rx, WindowOwner::new(LoggingBackend::default())));
        let widget = Widget::start(Arc::clone(&self.store), Arc::new(sink), &self.config);
        (widget, owner)
    }

    fn execute(&self, widget: &mut Widget, command: Commands) -> Result<()> {
        match command {
            Commands::Add { title, content } => self.add_note(widget, title, content),
            Commands::Edit { id, title, content } => self.edit_note(widget, id, title, content),
            Commands::Delete { id } => self.delete_note(widget, id),
            Commands::List { all, json } => {
                if all {
                    widget.dispatch(Intent::Expand);
                }
                self.display_view(&widget.view(), json)?;
            }
            Commands::Lock => set_lock(widget, true),
            Commands::Unlock => set_lock(widget, false),
            Commands::Pin => set_pin(widget, true),
            Commands::Unpin => set_pin(widget, false),
            Commands::Status => self.display_status(widget),
            Commands::Autostart { state } => {
                let enabled = state == "on";
                widget.dispatch(Intent::SetAutoStart(enabled));
                println!("Start at login {}", if enabled { "enabled" } else { "disabled" });
            }
            Commands::Run => {
                return Err(MemoError::ApplicationError {
                    message: "run needs its own widget session".to_string(),
                })
            }
        }
        Ok(())
    }

    fn add_note(&self, widget: &mut Widget, title: Option<String>, content: Option<String>) {
        if widget.mode().is_locked() {
            println!("The widget is locked; unlock it before adding notes.");
            return;
        }

        widget.dispatch(Intent::AddNote);
        let Some(id) = widget.notes().editing() else {
            warn!("Add did not open a new note");
            return;
        };

        if title.is_some() || content.is_some() {
            let current = widget.notes().get(id).cloned();
            if let Some(note) = current {
                widget.dispatch(Intent::CommitEdit {
                    id,
                    title: title.unwrap_or(note.title),
                    content: content.unwrap_or(note.content),
                });
            }
        }
        println!("Note created with ID: {}", id);
    }

    fn edit_note(
        &self,
        widget: &mut Widget,
        id: NoteId,
        title: Option<String>,
        content: Option<String>,
    ) {
        if widget.mode().is_locked() {
            println!("The widget is locked; unlock it before editing notes.");
            return;
        }

        let Some(note) = widget.notes().get(id).cloned() else {
            println!("No note with ID {}", id);
            return;
        };

        widget.dispatch(Intent::BeginEdit(id));
        widget.dispatch(Intent::CommitEdit {
            id,
            title: title.unwrap_or(note.title),
            content: content.unwrap_or(note.content),
        });
        println!("Note {} updated", id);
    }

    fn delete_note(&self, widget: &mut Widget, id: NoteId) {
        if widget.mode().is_locked() {
            println!("The widget is locked; unlock it before deleting notes.");
            return;
        }

        let Some(note) = widget.notes().get(id).cloned() else {
            println!("No note with ID {}", id);
            return;
        };

        widget.dispatch(Intent::DeleteNote(id));
        println!("Note '{}' ({}) has been deleted.", note.title, note.id);
    }

    /// Display the widget view in the requested format
    fn display_view(&self, view: &WidgetView, json: bool) -> Result<()> {
        let projection = &view.projection;
        if json {
            println!("{}", serde_json::to_string_pretty(&projection.notes)?);
            return Ok(());
        }

        if projection.notes.is_empty() {
            println!("No notes yet, add one.");
            return Ok(());
        }

        for (i, note) in projection.notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(40));
            }
            self.display_note(note);
        }

        if projection.can_expand {
            println!("\n{} more (use --all to show them)", projection.hidden);
        }
        Ok(())
    }

    fn display_note(&self, note: &Note) {
        let created = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(note.date)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        println!("ID: {} | Created: {}", note.id, created);
        println!("Title: {}", note.title);
        if self.verbose {
            println!("\n{}", note.content);
        } else {
            let preview = note.content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            if !preview.is_empty() {
                println!("\n{}", preview);
            }
        }
        if note.image.is_some() {
            println!("[image attached]");
        }
    }

    fn display_status(&self, widget: &Widget) {
        let mode = widget.mode().mode();
        println!("Locked: {}", mode.locked);
        println!("Pinned: {}", mode.pinned);
        println!("Notes:  {}", widget.notes().len());
        match saved_position(self.store.as_ref()) {
            Some((x, y)) => println!("Position: {}, {}", x, y),
            None => println!("Position: not saved yet"),
        }
    }

    /// Runs the widget until Ctrl-C, sampling the window position meanwhile.
    async fn run_widget(&self) -> Result<()> {
        let (mut widget, owner) = self.start_widget();

        let source = Arc::new(HeadlessWindow {
            origin: saved_position(self.store.as_ref()),
        });
        let mut tracker = PositionTracker::new(Arc::clone(&self.store), source, &self.config);
        tracker.start();

        info!("Widget running; press Ctrl-C to quit");
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }

        // Stop sampling before the window goes away so no stale coordinates
        // are written during shutdown.
        tracker.stop().await?;
        widget.dispatch(Intent::Quit);
        drop(widget);
        join_owner(owner).await
    }
}

fn set_lock(widget: &mut Widget, locked: bool) {
    if widget.mode().is_locked() != locked {
        widget.dispatch(Intent::ToggleLock);
    }
    println!("Widget {}", if locked { "locked" } else { "unlocked" });
}

fn set_pin(widget: &mut Widget, pinned: bool) {
    if widget.mode().is_pinned() != pinned {
        widget.dispatch(Intent::TogglePin);
    }
    println!("Widget {}", if pinned { "pinned on top" } else { "unpinned" });
}

async fn join_owner(owner: OwnerTask) -> Result<()> {
    owner.await.map(|_| ()).map_err(|e| MemoError::ApplicationError {
        message: format!("Window owner task failed: {}", e),
    })
}
