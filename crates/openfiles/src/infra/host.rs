//! Boundary traits for the host editor environment.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::errors::{HostError, ReadError};
use crate::domain::model::FileHandle;

/// Reads file contents on demand.
pub trait ContentReader {
    fn read_file_bytes(&self, file: &FileHandle) -> Result<Vec<u8>, ReadError>;
}

/// Services the host editor provides to the panel.
pub trait EditorHost: ContentReader + Send + Sync {
    /// Currently open files in the host's own order.
    fn list_open_files(&self) -> Result<Vec<FileHandle>, HostError>;

    /// Bring a file into view, opening it if needed.
    fn open_file_in_editor(&self, file: &FileHandle) -> Result<(), HostError>;

    fn create_temporary_file(&self, prefix: &str, suffix: &str) -> Result<FileHandle, HostError>;

    fn write_text_utf8(&self, file: &FileHandle, content: &str) -> Result<(), HostError>;

    fn subscribe(&self, listener: Arc<dyn EditorListener>) -> Result<SubscriptionId, HostError>;

    /// Unknown or already removed ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Editor lifecycle callbacks.
pub trait EditorListener: Send + Sync {
    fn file_opened(&self, file: &FileHandle);
    fn file_closed(&self, file: &FileHandle);
    fn selection_changed(&self, selected: Option<&FileHandle>);
}

/// Kind of editor lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Opened,
    Closed,
    SelectionChanged,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleEvent::Opened => "opened",
            LifecycleEvent::Closed => "closed",
            LifecycleEvent::SelectionChanged => "selection-changed",
        };
        f.write_str(label)
    }
}

/// Handle returned by [`EditorHost::subscribe`] and used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener bookkeeping shared by host implementations.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Arc<dyn EditorListener>)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn EditorListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit_opened(&self, file: &FileHandle) {
        for listener in self.current() {
            listener.file_opened(file);
        }
    }

    pub fn emit_closed(&self, file: &FileHandle) {
        for listener in self.current() {
            listener.file_closed(file);
        }
    }

    pub fn emit_selection_changed(&self, selected: Option<&FileHandle>) {
        for listener in self.current() {
            listener.selection_changed(selected);
        }
    }

    // Listeners run without the lock held so they may unsubscribe themselves.
    fn current(&self) -> Vec<Arc<dyn EditorListener>> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
