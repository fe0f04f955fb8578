//! Filesystem-backed host used by the command-line harness.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::errors::{HostError, ReadError};
use crate::domain::model::FileHandle;
use crate::infra::host::{ContentReader, EditorHost, EditorListener, ListenerRegistry, SubscriptionId};

/// Host whose "editor" is a list of local files kept in memory.
#[derive(Debug)]
pub struct LocalHost {
    open: RwLock<Vec<FileHandle>>,
    active: RwLock<Option<FileHandle>>,
    temp_dir: PathBuf,
    listeners: ListenerRegistry,
}

impl LocalHost {
    /// Create a host with the given files open, in order.
    pub fn with_files(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut open: Vec<FileHandle> = Vec::new();
        for path in paths {
            let file = FileHandle::from_path(absolute(&path));
            if !open.contains(&file) {
                open.push(file);
            }
        }
        let active = open.first().cloned();
        Self {
            open: RwLock::new(open),
            active: RwLock::new(active),
            temp_dir: std::env::temp_dir(),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Directory used for generated temporary files.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// File most recently brought into view.
    pub fn active(&self) -> Option<FileHandle> {
        self.active.read().clone()
    }

    /// Close a file, notifying listeners when it was open.
    pub fn close_file(&self, file: &FileHandle) -> bool {
        let removed = {
            let mut open = self.open.write();
            let before = open.len();
            open.retain(|existing| existing != file);
            open.len() != before
        };
        if removed {
            {
                let mut active = self.active.write();
                if active.as_ref() == Some(file) {
                    *active = self.open.read().first().cloned();
                }
            }
            tracing::debug!(path = %file, "closed file");
            self.listeners.emit_closed(file);
        }
        removed
    }
}

impl ContentReader for LocalHost {
    fn read_file_bytes(&self, file: &FileHandle) -> Result<Vec<u8>, ReadError> {
        fs::read(file.path()).map_err(|source| ReadError::Io {
            path: file.path().to_path_buf(),
            source,
        })
    }
}

impl EditorHost for LocalHost {
    fn list_open_files(&self) -> Result<Vec<FileHandle>, HostError> {
        Ok(self.open.read().clone())
    }

    fn open_file_in_editor(&self, file: &FileHandle) -> Result<(), HostError> {
        let newly_opened = {
            let mut open = self.open.write();
            if open.contains(file) {
                false
            } else {
                open.push(file.clone());
                true
            }
        };
        *self.active.write() = Some(file.clone());

        if newly_opened {
            tracing::debug!(path = %file, "opened file");
            self.listeners.emit_opened(file);
        } else {
            self.listeners.emit_selection_changed(Some(file));
        }
        Ok(())
    }

    fn create_temporary_file(&self, prefix: &str, suffix: &str) -> Result<FileHandle, HostError> {
        let named = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(|source| HostError::Io {
                path: self.temp_dir.clone(),
                source,
            })?;
        let (_, path) = named.keep().map_err(|err| HostError::Io {
            path: self.temp_dir.clone(),
            source: err.error,
        })?;
        Ok(FileHandle::from_path(path))
    }

    fn write_text_utf8(&self, file: &FileHandle, content: &str) -> Result<(), HostError> {
        fs::write(file.path(), content).map_err(|source| HostError::Io {
            path: file.path().to_path_buf(),
            source,
        })
    }

    fn subscribe(&self, listener: Arc<dyn EditorListener>) -> Result<SubscriptionId, HostError> {
        Ok(self.listeners.add(listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
