//! Lock and pin state of the widget window.
//!
//! `locked` and `pinned` are two independent booleans. Locking only changes
//! how the note content region reacts to the pointer; pinning only changes OS
//! stacking. Neither is ever derived from the other.
//!
//! Locking must never turn the whole window click-through: the lock toggle
//! lives in the context menu, which stays interactive in every state so the
//! user can always unlock again.
use std::sync::Arc;

use log::{debug, error, info};

use crate::{
    directive::send_or_log,
    kv_store::{keys, read_flag, write_value},
    Directive, DirectiveSink, SharedStore,
};

/// Persisted window mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowMode {
    pub locked: bool,
    pub pinned: bool,
}

/// Parts of the widget surface that react to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Title bar with the add button; the drag handle when unlocked
    Header,
    /// Note cards and their edit/delete controls
    Content,
    /// Right-click menu hosting the lock toggle
    ContextMenu,
}

/// How the surface responds to the pointer for the current lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interactivity {
    pub window_draggable: bool,
    pub content_pointer_events: bool,
    /// Always true: the lock toggle is never suppressed
    pub toggle_reachable: bool,
}

impl Interactivity {
    pub fn for_lock(locked: bool) -> Self {
        Interactivity {
            window_draggable: !locked,
            content_pointer_events: !locked,
            toggle_reachable: true,
        }
    }

    /// Whether `region` accepts pointer input.
    pub fn accepts_pointer(&self, region: Region) -> bool {
        match region {
            Region::Header | Region::Content => self.content_pointer_events,
            Region::ContextMenu => self.toggle_reachable,
        }
    }
}

/// Owns [`WindowMode`], persists every transition and forwards it to the
/// window owner.
pub struct WindowModeController {
    mode: WindowMode,
    store: SharedStore,
    sink: Arc<dyn DirectiveSink>,
}

impl WindowModeController {
    /// Restores the mode from the store. Absent or malformed values default to
    /// `false`. Call before the window is shown.
    pub fn restore(store: SharedStore, sink: Arc<dyn DirectiveSink>) -> Self {
        let mode = WindowMode {
            locked: read_flag(store.as_ref(), keys::LOCKED, false),
            pinned: read_flag(store.as_ref(), keys::PINNED, false),
        };
        info!("Restored window mode: locked={}, pinned={}", mode.locked, mode.pinned);
        Self { mode, store, sink }
    }

    /// Directives that bring a fresh window in line with the restored mode.
    pub fn startup_directives(&self) -> [Directive; 2] {
        [
            Directive::ClickThrough(self.mode.locked),
            Directive::AlwaysOnTop(self.mode.pinned),
        ]
    }

    pub fn apply_startup(&self) {
        for directive in self.startup_directives() {
            send_or_log(self.sink.as_ref(), directive);
        }
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.mode.locked
    }

    pub fn is_pinned(&self) -> bool {
        self.mode.pinned
    }

    pub fn interactivity(&self) -> Interactivity {
        Interactivity::for_lock(self.mode.locked)
    }

    /// Flips `locked`. Returns the new value.
    pub fn toggle_lock(&mut self) -> bool {
        self.set_locked(!self.mode.locked);
        self.mode.locked
    }

    /// Flips `pinned`. Returns the new value.
    pub fn toggle_pin(&mut self) -> bool {
        self.set_pinned(!self.mode.pinned);
        self.mode.pinned
    }

    /// Sets `locked`; persists it, then sends [`Directive::ClickThrough`].
    /// Setting the current value does nothing.
    pub fn set_locked(&mut self, locked: bool) {
        if self.mode.locked == locked {
            debug!("Lock already {}", locked);
            return;
        }
        self.mode.locked = locked;
        info!("Widget {}", if locked { "locked" } else { "unlocked" });
        self.persist(keys::LOCKED, locked);
        send_or_log(self.sink.as_ref(), Directive::ClickThrough(locked));
    }

    /// Sets `pinned`; persists it, then sends [`Directive::AlwaysOnTop`].
    /// Setting the current value does nothing.
    pub fn set_pinned(&mut self, pinned: bool) {
        if self.mode.pinned == pinned {
            debug!("Pin already {}", pinned);
            return;
        }
        self.mode.pinned = pinned;
        info!("Widget {}", if pinned { "pinned" } else { "unpinned" });
        self.persist(keys::PINNED, pinned);
        send_or_log(self.sink.as_ref(), Directive::AlwaysOnTop(pinned));
    }

    /// Returns both flags to their defaults. Process-level only, not a user action.
    pub fn reset(&mut self) {
        self.set_locked(false);
        self.set_pinned(false);
    }

    fn persist(&self, key: &str, value: bool) {
        if let Err(e) = write_value(self.store.as_ref(), key, &value) {
            error!("Failed to persist '{}': {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::{kv_store::read_value, MemoError, MemoryStore, Result};

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Directive>>,
        fail: bool,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<Directive> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl DirectiveSink for RecordingSink {
        fn send(&self, directive: Directive) -> Result<()> {
            if self.fail {
                return Err(MemoError::ChannelClosed);
            }
            self.sent.lock().unwrap().push(directive);
            Ok(())
        }
    }

    fn controller() -> (Arc<MemoryStore>, Arc<RecordingSink>, WindowModeController) {
        let mem = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let ctl = WindowModeController::restore(mem.clone(), sink.clone());
        (mem, sink, ctl)
    }

    #[test]
    fn restores_persisted_flags() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::LOCKED, json!(true));
        mem.seed(keys::PINNED, json!("garbage"));
        let sink = Arc::new(RecordingSink::default());

        let ctl = WindowModeController::restore(mem, sink.clone());
        assert_eq!(ctl.mode(), WindowMode { locked: true, pinned: false });

        ctl.apply_startup();
        assert_eq!(
            sink.sent(),
            vec![Directive::ClickThrough(true), Directive::AlwaysOnTop(false)]
        );
    }

    #[test]
    fn lock_round_trip_repeats_directives_and_persisted_value() {
        let (mem, sink, mut ctl) = controller();

        assert!(ctl.toggle_lock());
        let after_first = read_value::<bool>(&*mem, keys::LOCKED).unwrap();
        assert!(!ctl.toggle_lock());
        assert!(ctl.toggle_lock());

        assert_eq!(
            sink.sent(),
            vec![
                Directive::ClickThrough(true),
                Directive::ClickThrough(false),
                Directive::ClickThrough(true),
            ]
        );
        assert_eq!(read_value::<bool>(&*mem, keys::LOCKED).unwrap(), after_first);
        assert_eq!(mem.write_count(), 3);
    }

    #[test]
    fn lock_and_pin_are_independent() {
        let (mem, _sink, mut ctl) = controller();

        ctl.toggle_pin();
        assert!(!ctl.is_locked());
        ctl.toggle_lock();
        assert!(ctl.is_pinned());
        ctl.toggle_pin();
        assert!(ctl.is_locked());

        assert_eq!(read_value::<bool>(&*mem, keys::LOCKED).unwrap(), Some(true));
        assert_eq!(read_value::<bool>(&*mem, keys::PINNED).unwrap(), Some(false));
    }

    #[test]
    fn setting_the_same_value_is_silent() {
        let (mem, sink, mut ctl) = controller();
        ctl.set_locked(false);
        ctl.set_pinned(false);
        assert!(sink.sent().is_empty());
        assert_eq!(mem.write_count(), 0);
    }

    #[test]
    fn toggle_stays_reachable_while_locked() {
        let (_mem, _sink, mut ctl) = controller();
        ctl.set_locked(true);

        let surface = ctl.interactivity();
        assert!(!surface.window_draggable);
        assert!(!surface.accepts_pointer(Region::Content));
        assert!(!surface.accepts_pointer(Region::Header));
        assert!(surface.accepts_pointer(Region::ContextMenu));
    }

    #[test]
    fn delivery_failure_keeps_user_intent() {
        let mem = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let mut ctl = WindowModeController::restore(mem.clone(), sink);

        ctl.toggle_pin();
        assert!(ctl.is_pinned());
        assert_eq!(read_value::<bool>(&*mem, keys::PINNED).unwrap(), Some(true));
    }

    #[test]
    fn reset_returns_to_defaults() {
        let (_mem, _sink, mut ctl) = controller();
        ctl.set_locked(true);
        ctl.set_pinned(true);
        ctl.reset();
        assert_eq!(ctl.mode(), WindowMode::default());
    }
}
