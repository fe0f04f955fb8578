//! Preview pipeline: export a snapshot, write it to a temporary file, and open it.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::app::export::MarkdownExporter;
use crate::domain::errors::{ExportError, HostError, PreviewError};
use crate::domain::model::{FileHandle, MarkdownReport, Snapshot};
use crate::infra::config::Config;
use crate::infra::dispatch::UiQueue;
use crate::infra::host::EditorHost;

/// Naming of generated preview files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    pub file_prefix: String,
    pub file_suffix: String,
}

impl PreviewOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_prefix: config.export.file_prefix(),
            file_suffix: config.export.file_suffix(),
        }
    }
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of a preview request that did not fail.
#[derive(Debug, Clone)]
pub enum PreviewOutcome {
    /// Nothing was open, so no document was written.
    NothingOpen,
    Created {
        file: FileHandle,
        report: MarkdownReport,
    },
}

/// Turns snapshots into preview documents opened in the host editor.
pub struct PreviewService {
    host: Arc<dyn EditorHost>,
    queue: UiQueue,
    exporter: MarkdownExporter,
    options: PreviewOptions,
}

impl PreviewService {
    pub fn new(
        host: Arc<dyn EditorHost>,
        queue: UiQueue,
        exporter: MarkdownExporter,
        options: PreviewOptions,
    ) -> Self {
        Self {
            host,
            queue,
            exporter,
            options,
        }
    }

    /// Render the report for `snapshot` at the current time without writing it anywhere.
    pub fn render(&self, snapshot: &Snapshot) -> Result<MarkdownReport, ExportError> {
        self.exporter
            .export(snapshot, OffsetDateTime::now_utc(), &*self.host)
    }

    /// Write the report for `snapshot` to a new temporary file and ask the host to open it.
    ///
    /// Opening happens on the next drain of the UI queue.
    pub fn create_preview(&self, snapshot: &Snapshot) -> Result<PreviewOutcome, PreviewError> {
        let report = match self.render(snapshot) {
            Ok(report) => report,
            Err(ExportError::EmptyInput) => {
                tracing::debug!("preview requested with no open files");
                return Ok(PreviewOutcome::NothingOpen);
            }
            Err(err) => return Err(PreviewError::Export(err)),
        };

        let file = match self.write(&report) {
            Ok(file) => file,
            Err(source) => return Err(PreviewError::Write { report, source }),
        };
        tracing::info!(
            path = %file,
            files = report.sections(),
            failures = report.failures(),
            "wrote open files preview"
        );

        let host = Arc::clone(&self.host);
        let target = file.clone();
        self.queue.post(move || {
            if let Err(err) = host.open_file_in_editor(&target) {
                tracing::warn!(path = %target, error = %err, "failed to open preview");
            }
        });

        Ok(PreviewOutcome::Created { file, report })
    }

    fn write(&self, report: &MarkdownReport) -> Result<FileHandle, HostError> {
        let file = self
            .host
            .create_temporary_file(&self.options.file_prefix, &self.options.file_suffix)?;
        self.host.write_text_utf8(&file, report.as_str())?;
        Ok(file)
    }
}

impl fmt::Debug for PreviewService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewService")
            .field("exporter", &self.exporter)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_host::MemoryHost;

    fn service(host: &Arc<MemoryHost>, queue: &UiQueue) -> PreviewService {
        PreviewService::new(
            host.clone(),
            queue.clone(),
            MarkdownExporter::new().unwrap(),
            PreviewOptions::default(),
        )
    }

    #[test]
    fn empty_snapshot_writes_nothing() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let outcome = service(&host, &queue)
            .create_preview(&Snapshot::default())
            .unwrap();
        assert!(matches!(outcome, PreviewOutcome::NothingOpen));
        assert!(queue.is_empty());
    }

    #[test]
    fn preview_is_written_then_opened_on_drain() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let file = host.add_file("/w/a.py", "print(1)\n");
        let snapshot = Snapshot::new([file]);

        let outcome = service(&host, &queue).create_preview(&snapshot).unwrap();
        let PreviewOutcome::Created { file, report } = outcome else {
            panic!("expected a preview file");
        };

        assert!(file.name().starts_with("open_files_preview_"));
        assert_eq!(file.extension(), Some("md"));
        assert_eq!(host.text_of(file.path()).as_deref(), Some(report.as_str()));
        assert!(host.editor_requests().is_empty());

        queue.drain();
        assert_eq!(host.editor_requests(), vec![file]);
    }

    #[test]
    fn write_failure_keeps_report() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let snapshot = Snapshot::new([host.add_file("/w/a.py", "print(1)")]);
        host.set_fail_writes(true);

        let err = service(&host, &queue).create_preview(&snapshot).unwrap_err();
        match err {
            PreviewError::Write { report, .. } => {
                assert!(report.as_str().contains("print(1)"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn custom_file_naming_is_used() {
        let host = Arc::new(MemoryHost::new());
        let queue = UiQueue::new();
        let snapshot = Snapshot::new([host.add_file("/w/a.py", "")]);
        let options = PreviewOptions {
            file_prefix: "report-".into(),
            file_suffix: ".markdown".into(),
        };
        let service = PreviewService::new(
            host.clone(),
            queue,
            MarkdownExporter::new().unwrap(),
            options,
        );

        let PreviewOutcome::Created { file, .. } = service.create_preview(&snapshot).unwrap()
        else {
            panic!("expected a preview file");
        };
        assert!(file.name().starts_with("report-"));
        assert!(file.name().ends_with(".markdown"));
    }
}
