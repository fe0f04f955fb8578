//! The open-files panel exposed to the host.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::app::export::MarkdownExporter;
use crate::app::preview::{PreviewOptions, PreviewOutcome, PreviewService};
use crate::app::tracker::OpenFilesTracker;
use crate::domain::errors::ExportError;
use crate::domain::language::LanguageTags;
use crate::domain::model::{PanelEntry, Snapshot};
use crate::infra::config::Config;
use crate::infra::dispatch::UiQueue;
use crate::infra::host::EditorHost;

/// Commands the panel exposes as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Refresh,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Message the host should show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Lists the host's open files and turns them into a Markdown preview on request.
///
/// Every operation catches its own failures and reports them through [`OpenFilesPanel::notice`];
/// nothing is returned to the host as an error.
pub struct OpenFilesPanel {
    title: String,
    host: Arc<dyn EditorHost>,
    tracker: Arc<OpenFilesTracker>,
    preview: PreviewService,
    entries: Arc<RwLock<Vec<PanelEntry>>>,
    notice: Mutex<Option<Notice>>,
}

impl OpenFilesPanel {
    /// Build the panel, subscribe to host lifecycle events, and load the initial list.
    pub fn new(host: Arc<dyn EditorHost>, queue: UiQueue, config: &Config) -> Result<Self, ExportError> {
        let exporter = MarkdownExporter::from_config(config)?;
        let preview = PreviewService::new(
            Arc::clone(&host),
            queue.clone(),
            exporter,
            PreviewOptions::from_config(config),
        );
        let tracker = Arc::new(OpenFilesTracker::new(Arc::clone(&host)));

        let entries = Arc::new(RwLock::new(Vec::new()));
        let languages = config.language_tags();
        let sink = Arc::clone(&entries);
        tracker.observe(move |snapshot| {
            *sink.write() = build_entries(snapshot, &languages);
        });

        let panel = Self {
            title: config.panel.title(),
            host,
            tracker,
            preview,
            entries,
            notice: Mutex::new(None),
        };

        if let Err(err) = panel.tracker.subscribe(&queue) {
            tracing::warn!(error = %err, "failed to subscribe to editor events");
            panel.set_notice(
                NoticeLevel::Error,
                format!("Open files will not update automatically: {err}"),
            );
        }
        panel.refresh();
        Ok(panel)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rows to display, one per open file in host order.
    pub fn entries(&self) -> Vec<PanelEntry> {
        self.entries.read().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tracker.snapshot()
    }

    /// Latest notice, left in place until replaced or taken.
    pub fn notice(&self) -> Option<Notice> {
        self.notice.lock().clone()
    }

    pub fn take_notice(&self) -> Option<Notice> {
        self.notice.lock().take()
    }

    pub fn trigger(&self, command: PanelCommand) {
        tracing::debug!(?command, "panel command");
        match command {
            PanelCommand::Refresh => {
                self.refresh();
            }
            PanelCommand::Preview => self.preview(),
        }
    }

    /// Reload the list from the host. Returns the new snapshot when the host answered.
    pub fn refresh(&self) -> Option<Snapshot> {
        match self.tracker.refresh() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                self.set_notice(NoticeLevel::Error, format!("Error refreshing open files: {err}"));
                None
            }
        }
    }

    /// Write a Markdown preview of every open file and open it in the editor.
    pub fn preview(&self) {
        let Some(snapshot) = self.refresh() else {
            return;
        };
        match self.preview.create_preview(&snapshot) {
            Ok(PreviewOutcome::NothingOpen) => {
                self.set_notice(NoticeLevel::Info, "No open files to preview");
            }
            Ok(PreviewOutcome::Created { file, report }) => {
                let text = match report.failures() {
                    0 => format!("Preview of {} files written to {file}", report.sections()),
                    failures => format!(
                        "Preview of {} files written to {file} ({failures} unreadable)",
                        report.sections()
                    ),
                };
                self.set_notice(NoticeLevel::Success, text);
            }
            Err(err) => {
                tracing::warn!(error = %err, "preview failed");
                self.set_notice(NoticeLevel::Error, format!("Error creating preview: {err}"));
            }
        }
    }

    /// Reopen the file shown at `index`. Returns `false` when no such row exists.
    pub fn activate(&self, index: usize) -> bool {
        let Some(file) = self.tracker.snapshot().get(index).cloned() else {
            return false;
        };
        if let Err(err) = self.host.open_file_in_editor(&file) {
            tracing::warn!(path = %file, error = %err, "failed to reopen file");
            self.set_notice(NoticeLevel::Error, format!("Error opening {}: {err}", file.name()));
        }
        true
    }

    /// Host hook: the panel became visible.
    pub fn on_show(&self) {
        self.refresh();
    }

    /// Host hook: the panel is being torn down.
    pub fn on_dispose(&self) {
        self.tracker.dispose();
    }

    fn set_notice(&self, level: NoticeLevel, text: impl Into<String>) {
        *self.notice.lock() = Some(Notice {
            level,
            text: text.into(),
        });
    }
}

impl fmt::Debug for OpenFilesPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFilesPanel")
            .field("title", &self.title)
            .field("tracker", &self.tracker)
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

fn build_entries(snapshot: &Snapshot, languages: &LanguageTags) -> Vec<PanelEntry> {
    snapshot
        .iter()
        .map(|file| PanelEntry::for_file(file, languages))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_host::MemoryHost;

    fn panel(host: &Arc<MemoryHost>, queue: &UiQueue) -> OpenFilesPanel {
        OpenFilesPanel::new(host.clone(), queue.clone(), &Config::default()).unwrap()
    }

    #[test]
    fn initial_entries_mirror_open_files() {
        let host = Arc::new(MemoryHost::new());
        host.add_file("/w/main.rs", "fn main() {}");
        host.add_file("/w/README", "hi");
        let panel = panel(&host, &UiQueue::new());

        assert_eq!(panel.title(), "Open Files:");
        assert_eq!(
            panel.entries(),
            vec![
                PanelEntry {
                    label: "main.rs".into(),
                    tooltip: "/w/main.rs".into(),
                    icon_hint: "rust".into(),
                },
                PanelEntry {
                    label: "README".into(),
                    tooltip: "/w/README".into(),
                    icon_hint: "text".into(),
                },
            ]
        );
        assert!(panel.notice().is_none());
    }

    #[test]
    fn host_events_update_entries_after_drain() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let panel = panel(&host, &queue);
        assert!(panel.entries().is_empty());

        host.open(&crate::domain::model::FileHandle::from_path("/w/a.py"));
        assert!(panel.entries().is_empty());
        queue.drain();
        assert_eq!(panel.entries().len(), 1);
    }

    #[test]
    fn activate_reopens_selected_file() {
        let host = Arc::new(MemoryHost::new());
        host.add_file("/w/a.py", "");
        let b = host.add_file("/w/b.py", "");
        let panel = panel(&host, &UiQueue::new());

        assert!(panel.activate(1));
        assert!(!panel.activate(5));
        assert_eq!(host.editor_requests(), vec![b]);
    }

    #[test]
    fn empty_preview_shows_info_notice() {
        let host = Arc::new(MemoryHost::new());
        let panel = panel(&host, &UiQueue::new());
        panel.trigger(PanelCommand::Preview);
        assert_eq!(
            panel.take_notice(),
            Some(Notice {
                level: NoticeLevel::Info,
                text: "No open files to preview".into(),
            })
        );
        assert!(panel.notice().is_none());
    }

    #[test]
    fn preview_writes_and_opens_report() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        host.add_file("/w/a.py", "print(1)");
        let panel = panel(&host, &queue);

        panel.trigger(PanelCommand::Preview);
        let notice = panel.notice().expect("notice");
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.text.contains("open_files_preview_"));

        queue.drain();
        let opened = host.editor_requests();
        assert_eq!(opened.len(), 1);
        let report = host.text_of(opened[0].path()).expect("preview written");
        assert!(report.starts_with("# Open Files Preview\n"));
        assert!(report.contains("```python\nprint(1)\n```"));
        assert_eq!(panel.entries().len(), 2, "preview file shows up once opened");
    }

    #[test]
    fn second_preview_embeds_first_without_breaking_fences() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        host.add_file("/w/a.py", "print(1)");
        let panel = panel(&host, &queue);

        panel.trigger(PanelCommand::Preview);
        queue.drain();
        panel.trigger(PanelCommand::Preview);
        queue.drain();

        let opened = host.editor_requests();
        assert_eq!(opened.len(), 2);
        let first = host.text_of(opened[0].path()).expect("first preview");
        let second = host.text_of(opened[1].path()).expect("second preview");
        let body = first.strip_suffix('\n').unwrap_or(&first);
        let embedded = format!("````markdown\n{body}\n````\n");
        assert!(second.contains(&embedded));
    }

    #[test]
    fn preview_write_failure_shows_error_notice() {
        let host = Arc::new(MemoryHost::new());
        host.add_file("/w/a.py", "print(1)");
        host.set_fail_writes(true);
        let panel = panel(&host, &UiQueue::new());

        panel.trigger(PanelCommand::Preview);
        let notice = panel.notice().expect("notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.starts_with("Error creating preview:"));
    }

    #[test]
    fn unavailable_host_is_reported_not_raised() {
        let host = Arc::new(MemoryHost::new());
        host.set_unavailable(Some("project not ready"));
        let panel = panel(&host, &UiQueue::new());

        let notice = panel.notice().expect("notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("project not ready"));
        assert!(panel.entries().is_empty());

        host.set_unavailable(None);
        host.add_file("/w/a.py", "");
        panel.trigger(PanelCommand::Refresh);
        assert_eq!(panel.entries().len(), 1);
    }

    #[test]
    fn dispose_detaches_from_host() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let panel = panel(&host, &queue);
        assert_eq!(host.listener_count(), 1);

        panel.on_dispose();
        panel.on_dispose();
        assert_eq!(host.listener_count(), 0);

        host.open(&crate::domain::model::FileHandle::from_path("/w/a.py"));
        assert_eq!(queue.drain(), 0);
        assert!(panel.entries().is_empty());

        panel.on_show();
        assert_eq!(panel.entries().len(), 1);
    }
}
