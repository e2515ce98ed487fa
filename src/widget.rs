//! UI layer of the widget.
//!
//! The widget owns a [`NoteStore`] and a [`WindowModeController`]; a front-end
//! only dispatches [`Intent`]s and renders the [`WidgetView`] it gets back.
use std::sync::Arc;

use log::debug;

use crate::{
    directive::send_or_log, Config, Directive, DirectiveSink, Flow, Interactivity, NoteId,
    NoteStore, Projection, SharedStore, WindowModeController,
};

/// User actions the front-end can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddNote,
    BeginEdit(NoteId),
    CommitEdit {
        id: NoteId,
        title: String,
        content: String,
    },
    CancelEdit,
    DeleteNote(NoteId),
    ToggleLock,
    TogglePin,
    SetAutoStart(bool),
    Expand,
    Collapse,
    Quit,
}

/// Everything a front-end needs to draw the widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub projection: Projection,
    pub locked: bool,
    pub pinned: bool,
    pub editing: Option<NoteId>,
    pub interactivity: Interactivity,
    /// The add button is hidden while locked
    pub add_button_visible: bool,
}

pub struct Widget {
    notes: NoteStore,
    mode: WindowModeController,
    sink: Arc<dyn DirectiveSink>,
    expanded: bool,
}

impl Widget {
    /// Restores notes and window mode from `store`. The restored mode is sent
    /// to the window owner before this returns.
    pub fn start(store: SharedStore, sink: Arc<dyn DirectiveSink>, config: &Config) -> Self {
        let mode = WindowModeController::restore(Arc::clone(&store), Arc::clone(&sink));
        mode.apply_startup();
        let notes = NoteStore::load(store, config);
        Self::from_parts(notes, mode, sink)
    }

    pub fn from_parts(
        notes: NoteStore,
        mode: WindowModeController,
        sink: Arc<dyn DirectiveSink>,
    ) -> Self {
        Self {
            notes,
            mode,
            sink,
            expanded: false,
        }
    }

    pub fn dispatch(&mut self, intent: Intent) -> Flow {
        debug!("Dispatching {:?}", intent);
        let locked = self.mode.is_locked();
        match intent {
            Intent::AddNote => {
                self.notes.add(locked);
            }
            Intent::BeginEdit(id) => {
                self.notes.begin_edit(id, locked);
            }
            Intent::CommitEdit { id, title, content } => {
                self.notes.update(id, &title, &content, locked);
            }
            Intent::CancelEdit => self.notes.cancel_edit(),
            Intent::DeleteNote(id) => {
                self.notes.remove(id, locked);
            }
            Intent::ToggleLock => {
                if self.mode.toggle_lock() {
                    self.notes.cancel_edit();
                }
            }
            Intent::TogglePin => {
                self.mode.toggle_pin();
            }
            Intent::SetAutoStart(enabled) => {
                send_or_log(self.sink.as_ref(), Directive::AutoStart(enabled));
            }
            Intent::Expand => self.expanded = true,
            Intent::Collapse => self.expanded = false,
            Intent::Quit => {
                send_or_log(self.sink.as_ref(), Directive::Quit);
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    pub fn view(&self) -> WidgetView {
        let locked = self.mode.is_locked();
        WidgetView {
            projection: self.notes.project(self.expanded),
            locked,
            pinned: self.mode.is_pinned(),
            editing: self.notes.editing(),
            interactivity: self.mode.interactivity(),
            add_button_visible: !locked,
        }
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn mode(&self) -> &WindowModeController {
        &self.mode
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}
