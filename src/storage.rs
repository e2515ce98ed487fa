//! The note collection.
//!
//! [`NoteStore`] owns the notes in memory, mirrors every change to the
//! key-value store under the `notes` key and computes the sorted, possibly
//! truncated [`Projection`] the widget renders.
use log::{debug, error, info, trace, warn};

use crate::{
    kv_store::{keys, read_value, write_value},
    now_millis, Config, IdGenerator, Note, NoteId, SharedStore,
};

/// Display view of the collection: sorted newest first and possibly truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Notes to render, sorted descending by date
    pub notes: Vec<Note>,
    /// How many notes were cut off by the truncation
    pub hidden: usize,
    /// Whether an "expand" affordance should be offered
    pub can_expand: bool,
    /// Whether a "collapse" affordance should be offered
    pub can_collapse: bool,
}

/// Owns the note collection and its durable mirror.
///
/// The collection is kept in storage order (new notes are prepended) and only
/// sorted when projected for display. Every effective mutation writes the full
/// collection back to the store before returning.
pub struct NoteStore {
    /// Notes in storage order
    notes: Vec<Note>,

    /// Durable key-value store
    store: SharedStore,

    /// Issues fresh note ids
    ids: IdGenerator,

    /// Note currently open for editing
    editing: Option<NoteId>,

    /// Notes shown while collapsed
    collapsed_limit: usize,

    /// Millisecond clock for ids and dates
    clock: fn() -> i64,
}

impl NoteStore {
    /// Loads the persisted collection.
    ///
    /// Missing or malformed data is never an error: the store falls back to a
    /// single welcome note and writes that back so memory and disk agree.
    ///
    /// # Arguments
    ///
    /// * `store` - The key-value store holding the `notes` key
    /// * `config` - Supplies the collapsed display limit
    pub fn load(store: SharedStore, config: &Config) -> Self {
        Self::load_with_clock(store, config, now_millis)
    }

    /// Same as [`NoteStore::load`] with an explicit millisecond clock.
    pub fn load_with_clock(store: SharedStore, config: &Config, clock: fn() -> i64) -> Self {
        let loaded = match read_value::<Vec<Note>>(store.as_ref(), keys::NOTES) {
            Ok(Some(notes)) => {
                info!("Loaded {} notes", notes.len());
                Some(notes)
            }
            Ok(None) => {
                info!("No persisted notes found, starting with the welcome note");
                None
            }
            Err(e) => {
                warn!("Persisted notes are malformed, starting with the welcome note: {}", e);
                None
            }
        };

        let needs_write = loaded.is_none();
        let notes = loaded.unwrap_or_else(|| {
            let now = clock();
            vec![Note::welcome(NoteId::from(now), now)]
        });

        let mut note_store = Self {
            ids: IdGenerator::seeded(&notes),
            notes,
            store,
            editing: None,
            collapsed_limit: config.collapsed_limit,
            clock,
        };

        if needs_write {
            note_store.persist();
        }
        note_store
    }

    /// Creates a placeholder note at the front of the collection and opens it
    /// for editing.
    ///
    /// Ids come from a monotonic generator, so rapid successive adds never
    /// collide. Ignored while `locked`.
    ///
    /// # Returns
    ///
    /// The new note's id, or `None` if the store is locked or no unused id is
    /// left
    pub fn add(&mut self, locked: bool) -> Option<NoteId> {
        if locked {
            debug!("Ignoring add while locked");
            return None;
        }

        let now = (self.clock)();
        let Some(id) = self.ids.next_id(now) else {
            warn!("No note id left above the largest existing one, add refused");
            return None;
        };
        let note = Note::placeholder(id, now);

        self.notes.insert(0, note);
        self.editing = Some(id);
        info!("Added note {}", id);

        self.persist();
        Some(id)
    }

    /// Opens an existing note for editing. Ignored while locked or for an
    /// unknown id.
    pub fn begin_edit(&mut self, id: NoteId, locked: bool) -> bool {
        if locked || self.get(id).is_none() {
            return false;
        }
        self.editing = Some(id);
        true
    }

    /// Closes the edit session without touching any note.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replaces the title and content of the note with `id`.
    ///
    /// The note's `date` is left alone: it records creation, so editing a note
    /// does not move it in the display order. Unknown ids and locked state are
    /// no-ops and do not write.
    ///
    /// # Returns
    ///
    /// Whether a note was changed
    pub fn update(&mut self, id: NoteId, title: &str, content: &str, locked: bool) -> bool {
        if locked {
            debug!("Ignoring update of {} while locked", id);
            return false;
        }

        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            debug!("Update of unknown note {} ignored", id);
            return false;
        };

        note.title = title.to_string();
        note.content = content.to_string();
        if self.editing == Some(id) {
            self.editing = None;
        }
        info!("Updated note {}", id);

        self.persist();
        true
    }

    /// Removes the note with `id`. Unknown ids and locked state are no-ops and
    /// do not write.
    pub fn remove(&mut self, id: NoteId, locked: bool) -> bool {
        if locked {
            debug!("Ignoring delete of {} while locked", id);
            return false;
        }

        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!("Delete of unknown note {} ignored", id);
            return false;
        }

        if self.editing == Some(id) {
            self.editing = None;
        }
        info!("Deleted note {}", id);

        self.persist();
        true
    }

    /// Computes the display projection.
    ///
    /// Notes are sorted by date, newest first, with ties broken by id so the
    /// order is stable. When `expanded` is false only the first
    /// `collapsed_limit` notes are returned.
    pub fn project(&self, expanded: bool) -> Projection {
        let mut sorted = self.notes.clone();
        sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let total = sorted.len();
        let overflowing = total > self.collapsed_limit;
        if !expanded {
            sorted.truncate(self.collapsed_limit);
        }

        Projection {
            hidden: total - sorted.len(),
            notes: sorted,
            can_expand: overflowing && !expanded,
            can_collapse: overflowing && expanded,
        }
    }

    /// Notes in storage order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Note currently open for editing, if any
    pub fn editing(&self) -> Option<NoteId> {
        self.editing
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Writes the full collection. Failures are logged and swallowed; the
    /// in-memory collection stays authoritative.
    fn persist(&self) {
        trace!("Persisting {} notes", self.notes.len());
        if let Err(e) = write_value(self.store.as_ref(), keys::NOTES, &self.notes) {
            error!("Failed to persist notes: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{MemoryStore, PLACEHOLDER_TITLE, WELCOME_TITLE};

    fn fixed_clock() -> i64 {
        1_700_000_000_000
    }

    fn empty_store() -> (Arc<MemoryStore>, NoteStore) {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::NOTES, json!([]));
        let store = NoteStore::load_with_clock(mem.clone(), &Config::default(), fixed_clock);
        (mem, store)
    }

    fn persisted(mem: &MemoryStore) -> Vec<Note> {
        read_value::<Vec<Note>>(mem, keys::NOTES).unwrap().unwrap()
    }

    fn note(id: i64, date: i64) -> Note {
        Note {
            id: NoteId::from(id),
            title: format!("note {}", id),
            content: String::new(),
            image: None,
            date,
        }
    }

    #[test]
    fn missing_notes_yield_written_welcome_note() {
        let mem = Arc::new(MemoryStore::new());
        let store = NoteStore::load_with_clock(mem.clone(), &Config::default(), fixed_clock);

        assert_eq!(store.len(), 1);
        assert_eq!(store.notes()[0].title, WELCOME_TITLE);
        assert_eq!(persisted(&mem), store.notes());
    }

    #[test]
    fn corrupted_notes_yield_exactly_one_default_note() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::NOTES, json!({"definitely": "not a list"}));

        let store = NoteStore::load(mem.clone(), &Config::default());
        assert_eq!(store.len(), 1);
        assert_eq!(store.notes()[0].title, WELCOME_TITLE);
    }

    #[test]
    fn persisted_empty_list_stays_empty() {
        let (mem, store) = empty_store();
        assert!(store.is_empty());
        assert_eq!(mem.write_count(), 0);
    }

    #[test]
    fn add_prepends_placeholder_and_opens_editor() {
        let (mem, mut store) = empty_store();
        let first = store.add(false).unwrap();
        let second = store.add(false).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.notes()[0].id, second);
        assert_eq!(store.notes()[0].title, PLACEHOLDER_TITLE);
        assert_eq!(store.editing(), Some(second));
        assert_eq!(persisted(&mem), store.notes());
        assert_eq!(mem.write_count(), 2);
    }

    #[test]
    fn locked_mutations_do_not_write() {
        let (mem, mut store) = empty_store();
        let id = store.add(false).unwrap();
        let writes = mem.write_count();
        let snapshot = store.notes().to_vec();

        assert_eq!(store.add(true), None);
        assert!(!store.update(id, "x", "y", true));
        assert!(!store.remove(id, true));
        assert!(!store.begin_edit(id, true));

        assert_eq!(store.notes(), snapshot.as_slice());
        assert_eq!(mem.write_count(), writes);
    }

    #[test]
    fn unknown_ids_are_ignored_without_writing() {
        let (mem, mut store) = empty_store();
        store.add(false);
        let writes = mem.write_count();

        assert!(!store.update(NoteId::from(1), "a", "b", false));
        assert!(!store.remove(NoteId::from(1), false));
        assert_eq!(mem.write_count(), writes);
    }

    #[test]
    fn update_keeps_date_and_image() {
        let mem = Arc::new(MemoryStore::new());
        let mut original = note(7, 100);
        original.image = Some("data:image/png;base64,AAAA".to_string());
        mem.seed(keys::NOTES, json!([original]));
        let mut store = NoteStore::load(mem.clone(), &Config::default());

        assert!(store.update(NoteId::from(7), "Groceries", "Milk", false));
        let edited = store.get(NoteId::from(7)).unwrap();
        assert_eq!(edited.date, 100);
        assert_eq!(edited.image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(persisted(&mem), store.notes());
    }

    #[test]
    fn update_and_remove_close_the_matching_edit_session() {
        let (_mem, mut store) = empty_store();
        let a = store.add(false).unwrap();
        assert!(store.update(a, "t", "c", false));
        assert_eq!(store.editing(), None);

        let b = store.add(false).unwrap();
        assert!(store.begin_edit(a, false));
        assert!(store.remove(b, false));
        assert_eq!(store.editing(), Some(a));
        store.cancel_edit();
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn add_then_remove_restores_persisted_bytes() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::NOTES, json!([note(1, 10), note(2, 20)]));
        let mut store = NoteStore::load(mem.clone(), &Config::default());
        let before = serde_json::to_vec(&store.notes()).unwrap();

        let id = store.add(false).unwrap();
        store.remove(id, false);

        assert_eq!(serde_json::to_vec(&store.notes()).unwrap(), before);
        assert_eq!(serde_json::to_vec(&persisted(&mem)).unwrap(), before);
    }

    #[test]
    fn projection_sorts_and_truncates() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(
            keys::NOTES,
            json!([note(1, 10), note(2, 40), note(3, 30), note(4, 20), note(5, 40)]),
        );
        let store = NoteStore::load(mem, &Config::default());

        let collapsed = store.project(false);
        let ids: Vec<i64> = collapsed.notes.iter().map(|n| n.id.as_i64()).collect();
        assert_eq!(ids, vec![5, 2, 3]);
        assert_eq!(collapsed.hidden, 2);
        assert!(collapsed.can_expand);
        assert!(!collapsed.can_collapse);

        let expanded = store.project(true);
        assert_eq!(expanded.notes.len(), 5);
        assert!(expanded.notes.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(expanded.hidden, 0);
        assert!(!expanded.can_expand);
        assert!(expanded.can_collapse);
    }

    #[test]
    fn short_collection_offers_no_affordances() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::NOTES, json!([note(1, 10), note(2, 20), note(3, 30)]));
        let store = NoteStore::load(mem, &Config::default());

        for expanded in [false, true] {
            let projection = store.project(expanded);
            assert_eq!(projection.notes.len(), 3);
            assert!(!projection.can_expand);
            assert!(!projection.can_collapse);
        }
    }

    #[test]
    fn add_is_refused_when_ids_are_exhausted() {
        let mem = Arc::new(MemoryStore::new());
        mem.seed(keys::NOTES, json!([note(i64::MAX, 10)]));
        let mut store = NoteStore::load_with_clock(mem.clone(), &Config::default(), fixed_clock);

        assert_eq!(store.add(false), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.editing(), None);
        assert_eq!(mem.write_count(), 0);
    }

    #[test]
    fn write_failures_keep_the_in_memory_change() {
        let (mem, mut store) = empty_store();
        mem.set_fail_writes(true);

        let id = store.add(false).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_some());
        assert_eq!(mem.write_count(), 0);
    }
}
