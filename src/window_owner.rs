//! The window-owning side of the directive channel.
//!
//! [`WindowOwner`] applies incoming directives to a [`WindowBackend`]. Setters
//! are idempotent: a directive repeating the value already applied does not
//! reach the backend again. Messages that fail [`Directive::decode`] are
//! logged and dropped by [`run_event_loop`].
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::Directive;

/// OS window operations the widget relies on. Window creation and chrome are
/// the backend's business.
pub trait WindowBackend: Send {
    /// Toggle drag/edit pass-through for the note content region. Must never
    /// make the whole window ignore the pointer.
    fn set_click_through(&mut self, enabled: bool);
    fn set_always_on_top(&mut self, on_top: bool);
    fn set_auto_start(&mut self, enabled: bool);
    fn quit(&mut self);
}

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies directives to a backend, skipping repeats.
pub struct WindowOwner<B: WindowBackend> {
    backend: B,
    click_through: Option<bool>,
    always_on_top: Option<bool>,
    auto_start: Option<bool>,
}

impl<B: WindowBackend> WindowOwner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            click_through: None,
            always_on_top: None,
            auto_start: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle(&mut self, directive: Directive) -> Flow {
        debug!("Window owner received {:?}", directive);
        match directive {
            Directive::ClickThrough(enabled) => {
                if apply_once(&mut self.click_through, enabled) {
                    self.backend.set_click_through(enabled);
                }
            }
            Directive::AlwaysOnTop(on_top) => {
                if apply_once(&mut self.always_on_top, on_top) {
                    self.backend.set_always_on_top(on_top);
                }
            }
            Directive::AutoStart(enabled) => {
                if apply_once(&mut self.auto_start, enabled) {
                    self.backend.set_auto_start(enabled);
                }
            }
            Directive::Quit => {
                info!("Quit requested");
                self.backend.quit();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }
}

/// Records `value` and reports whether it differs from what was applied last.
fn apply_once(last: &mut Option<bool>, value: bool) -> bool {
    if *last == Some(value) {
        return false;
    }
    *last = Some(value);
    true
}

/// Drains encoded directives into `owner` until `Quit` arrives or every sender
/// is gone.
pub async fn run_event_loop<B: WindowBackend>(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut owner: WindowOwner<B>,
) -> WindowOwner<B> {
    info!("Window owner event loop started");
    while let Some(raw) = rx.recv().await {
        let directive = match Directive::decode(&raw) {
            Ok(directive) => directive,
            Err(e) => {
                warn!("Dropping directive {:?}: {}", raw, e);
                continue;
            }
        };
        if owner.handle(directive) == Flow::Quit {
            info!("Window owner event loop stopping on quit");
            return owner;
        }
    }
    warn!("Directive channel closed, window owner event loop stopping");
    owner
}

/// Backend for running without a real window: every effect is logged.
#[derive(Debug, Default)]
pub struct LoggingBackend {
    pub quit_requested: bool,
}

impl WindowBackend for LoggingBackend {
    fn set_click_through(&mut self, enabled: bool) {
        info!("[window] content click-through: {}", enabled);
    }

    fn set_always_on_top(&mut self, on_top: bool) {
        info!("[window] always on top: {}", on_top);
    }

    fn set_auto_start(&mut self, enabled: bool) {
        info!("[window] start at login: {}", enabled);
    }

    fn quit(&mut self) {
        self.quit_requested = true;
    }
}
