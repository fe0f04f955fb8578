//! Commands registrable in the host's action and menu system.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ui::service::OpenFilesService;

/// Context the host passes when updating or performing an action.
#[derive(Debug, Clone, Default)]
pub struct ActionEvent {
    /// Service of the project the action was invoked in, if any.
    pub project: Option<Arc<OpenFilesService>>,
}

impl ActionEvent {
    pub fn for_project(service: Arc<OpenFilesService>) -> Self {
        Self {
            project: Some(service),
        }
    }
}

/// How the host should display an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub enabled: bool,
    pub visible: bool,
}

impl Presentation {
    fn enabled_and_visible(value: bool) -> Self {
        Self {
            enabled: value,
            visible: value,
        }
    }
}

pub trait Action: Send + Sync {
    fn id(&self) -> &'static str;

    fn text(&self) -> &'static str;

    fn update(&self, event: &ActionEvent) -> Presentation;

    fn perform(&self, event: &ActionEvent);
}

/// Refreshes the open-files panel of the current project.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshOpenFilesAction;

impl RefreshOpenFilesAction {
    pub const ID: &'static str = "openfiles.refresh";
}

impl Action for RefreshOpenFilesAction {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn text(&self) -> &'static str {
        "Refresh Open Files"
    }

    fn update(&self, event: &ActionEvent) -> Presentation {
        Presentation::enabled_and_visible(event.project.is_some())
    }

    fn perform(&self, event: &ActionEvent) {
        if let Some(service) = &event.project
            && !service.refresh_panel()
        {
            tracing::debug!("refresh requested before the panel was created");
        }
    }
}

/// Actions keyed by id.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every action this crate provides.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RefreshOpenFilesAction);
        registry
    }

    pub fn register(&mut self, action: impl Action + 'static) {
        self.actions.insert(action.id(), Box::new(action));
    }

    pub fn get(&self, id: &str) -> Option<&dyn Action> {
        self.actions.get(id).map(|action| &**action)
    }

    /// Perform an action if it exists and is enabled for `event`.
    pub fn perform(&self, id: &str, event: &ActionEvent) -> bool {
        match self.get(id) {
            Some(action) if action.update(event).enabled => {
                action.perform(event);
                true
            }
            Some(_) => false,
            None => {
                tracing::warn!(id, "unknown action");
                false
            }
        }
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}
