//! Wiring the panel into a host tool window.

use std::fmt;
use std::sync::Arc;

use crate::domain::errors::ExportError;
use crate::infra::config::Config;
use crate::infra::dispatch::UiQueue;
use crate::infra::host::EditorHost;
use crate::ui::panel::OpenFilesPanel;
use crate::ui::service::OpenFilesService;

/// Everything the host knows about one open project.
#[derive(Clone)]
pub struct ProjectContext {
    pub host: Arc<dyn EditorHost>,
    pub queue: UiQueue,
    pub config: Config,
    pub service: Arc<OpenFilesService>,
}

impl ProjectContext {
    pub fn new(host: Arc<dyn EditorHost>, queue: UiQueue, config: Config) -> Self {
        Self {
            host,
            queue,
            config,
            service: Arc::new(OpenFilesService::new()),
        }
    }
}

impl fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectContext")
            .field("queue", &self.queue)
            .field("config", &self.config)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Create the panel for a project's tool window and register it with the project service.
pub fn create_tool_window_content(
    project: &ProjectContext,
) -> Result<Arc<OpenFilesPanel>, ExportError> {
    let panel = Arc::new(OpenFilesPanel::new(
        Arc::clone(&project.host),
        project.queue.clone(),
        &project.config,
    )?);
    project.service.set_panel(Arc::clone(&panel));
    tracing::debug!(title = panel.title(), "created open files tool window");
    Ok(panel)
}
