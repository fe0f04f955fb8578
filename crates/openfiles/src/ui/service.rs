//! Per-project registry for the open-files panel.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ui::panel::OpenFilesPanel;

/// Holds the project's panel once its tool window has been created.
#[derive(Debug, Default)]
pub struct OpenFilesService {
    panel: RwLock<Option<Arc<OpenFilesPanel>>>,
}

impl OpenFilesService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_panel(&self, panel: Arc<OpenFilesPanel>) {
        *self.panel.write() = Some(panel);
    }

    pub fn panel(&self) -> Option<Arc<OpenFilesPanel>> {
        self.panel.read().clone()
    }

    /// Refresh the registered panel, if any. Returns whether a panel was refreshed.
    pub fn refresh_panel(&self) -> bool {
        match self.panel() {
            Some(panel) => {
                panel.refresh();
                true
            }
            None => false,
        }
    }
}
