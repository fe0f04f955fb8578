//! Domain models for open files, snapshots, and rendered reports.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::domain::language::LanguageTags;

/// Reference to a file known to the host editor.
///
/// Identity is the path: two handles with the same path are the same file even if the host
/// reports different display names for them.
#[derive(Debug, Clone, Serialize)]
pub struct FileHandle {
    name: String,
    path: PathBuf,
    extension: Option<String>,
}

impl FileHandle {
    /// Build a handle whose name and extension are derived from the final path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        Self {
            name,
            path,
            extension,
        }
    }

    /// Build a handle with an explicit display name, as reported by hosts with virtual files.
    pub fn with_name(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let mut handle = Self::from_path(path);
        handle.name = name.into();
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileHandle {}

impl Hash for FileHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Ordered, immutable view of the files open in the host at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: Arc<[FileHandle]>,
}

impl Snapshot {
    /// Build a snapshot in the given order. Repeated handles keep their first position.
    pub fn new(files: impl IntoIterator<Item = FileHandle>) -> Self {
        let mut unique: Vec<FileHandle> = Vec::new();
        for file in files {
            if !unique.contains(&file) {
                unique.push(file);
            }
        }
        Self {
            files: unique.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileHandle> {
        self.files.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileHandle> {
        self.files.iter()
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a FileHandle;
    type IntoIter = std::slice::Iter<'a, FileHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Rendered Markdown document describing every file of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownReport {
    text: String,
    sections: usize,
    failures: usize,
}

impl MarkdownReport {
    pub(crate) fn new(text: String, sections: usize, failures: usize) -> Self {
        Self {
            text,
            sections,
            failures,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of files rendered, including those replaced by an error note.
    pub fn sections(&self) -> usize {
        self.sections
    }

    /// Number of files whose contents could not be read.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl fmt::Display for MarkdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One row of the panel list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelEntry {
    pub label: String,
    pub tooltip: String,
    pub icon_hint: String,
}

impl PanelEntry {
    /// Row for `file`: its name, its full path as tooltip, and its language tag as icon hint.
    pub fn for_file(file: &FileHandle, languages: &LanguageTags) -> Self {
        Self {
            label: file.name().to_string(),
            tooltip: file.path().display().to_string(),
            icon_hint: languages.tag_for(file.extension()).to_string(),
        }
    }
}
