//! In-memory host used to embed the panel without an editor, mainly in tests.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::domain::errors::{HostError, ReadError};
use crate::domain::model::FileHandle;
use crate::infra::host::{ContentReader, EditorHost, EditorListener, ListenerRegistry, SubscriptionId};

const TEMP_ROOT: &str = "/memory/tmp";

/// Host whose files, contents, and failures are all scripted by the caller.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
    listeners: ListenerRegistry,
    list_calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    open: Vec<FileHandle>,
    contents: HashMap<PathBuf, Vec<u8>>,
    editor_requests: Vec<FileHandle>,
    temp_files: usize,
    unavailable: Option<String>,
    fail_writes: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open file with its contents without notifying listeners.
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> FileHandle {
        let file = FileHandle::from_path(path);
        let mut state = self.state.lock();
        state.contents.insert(file.path().to_path_buf(), contents.into());
        if !state.open.contains(&file) {
            state.open.push(file.clone());
        }
        file
    }

    /// Register an open file whose contents cannot be read.
    pub fn add_unreadable_file(&self, path: impl Into<PathBuf>) -> FileHandle {
        let file = FileHandle::from_path(path);
        let mut state = self.state.lock();
        if !state.open.contains(&file) {
            state.open.push(file.clone());
        }
        file
    }

    /// Forget a file's contents, as if it were deleted on disk while still open.
    pub fn delete_contents(&self, path: &Path) {
        self.state.lock().contents.remove(path);
    }

    /// Replace the reported open order without notifying listeners.
    pub fn set_open_files(&self, files: Vec<FileHandle>) {
        self.state.lock().open = files;
    }

    /// Open a file as the user would, notifying listeners.
    pub fn open(&self, file: &FileHandle) {
        let newly_opened = {
            let mut state = self.state.lock();
            if state.open.contains(file) {
                false
            } else {
                state.open.push(file.clone());
                true
            }
        };
        if newly_opened {
            self.listeners.emit_opened(file);
        } else {
            self.listeners.emit_selection_changed(Some(file));
        }
    }

    /// Close a file, notifying listeners when it was open.
    pub fn close(&self, file: &FileHandle) {
        let removed = {
            let mut state = self.state.lock();
            let before = state.open.len();
            state.open.retain(|open| open != file);
            state.open.len() != before
        };
        if removed {
            self.listeners.emit_closed(file);
        }
    }

    pub fn select(&self, file: Option<&FileHandle>) {
        self.listeners.emit_selection_changed(file);
    }

    /// Make every host service call fail with [`HostError::Unavailable`].
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.state.lock().unavailable = reason.map(str::to_string);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Files passed to [`EditorHost::open_file_in_editor`], in call order.
    pub fn editor_requests(&self) -> Vec<FileHandle> {
        self.state.lock().editor_requests.clone()
    }

    pub fn text_of(&self, path: &Path) -> Option<String> {
        self.state
            .lock()
            .contents
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_available(&self) -> Result<(), HostError> {
        match &self.state.lock().unavailable {
            Some(reason) => Err(HostError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl ContentReader for MemoryHost {
    fn read_file_bytes(&self, file: &FileHandle) -> Result<Vec<u8>, ReadError> {
        let state = self.state.lock();
        if let Some(reason) = &state.unavailable {
            return Err(ReadError::Unavailable {
                path: file.path().to_path_buf(),
                message: reason.clone(),
            });
        }
        state
            .contents
            .get(file.path())
            .cloned()
            .ok_or_else(|| ReadError::Io {
                path: file.path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
            })
    }
}

impl EditorHost for MemoryHost {
    fn list_open_files(&self) -> Result<Vec<FileHandle>, HostError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.state.lock().open.clone())
    }

    fn open_file_in_editor(&self, file: &FileHandle) -> Result<(), HostError> {
        self.check_available()?;
        self.state.lock().editor_requests.push(file.clone());
        self.open(file);
        Ok(())
    }

    fn create_temporary_file(&self, prefix: &str, suffix: &str) -> Result<FileHandle, HostError> {
        self.check_available()?;
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(HostError::Io {
                path: PathBuf::from(TEMP_ROOT),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"),
            });
        }
        state.temp_files += 1;
        let path = Path::new(TEMP_ROOT).join(format!("{prefix}{}{suffix}", state.temp_files));
        state.contents.insert(path.clone(), Vec::new());
        Ok(FileHandle::from_path(path))
    }

    fn write_text_utf8(&self, file: &FileHandle, content: &str) -> Result<(), HostError> {
        self.check_available()?;
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(HostError::Io {
                path: file.path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"),
            });
        }
        state
            .contents
            .insert(file.path().to_path_buf(), content.as_bytes().to_vec());
        Ok(())
    }

    fn subscribe(&self, listener: Arc<dyn EditorListener>) -> Result<SubscriptionId, HostError> {
        self.check_available()?;
        Ok(self.listeners.add(listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}
