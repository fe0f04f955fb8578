//! Markdown export of open-file snapshots.

use std::fmt;
use std::fs;
use std::path::Path;

use minijinja::Environment;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::errors::{ExportError, ReadError};
use crate::domain::language::LanguageTags;
use crate::domain::model::{FileHandle, MarkdownReport, Snapshot};
use crate::infra::config::Config;
use crate::infra::host::ContentReader;

/// Name of the built-in report template.
pub const DEFAULT_TEMPLATE: &str = "open_files_preview";

/// Renders snapshots into a single Markdown document.
pub struct MarkdownExporter {
    env: Environment<'static>,
    template: String,
    languages: LanguageTags,
}

impl MarkdownExporter {
    /// Create an exporter using the built-in template and language table.
    pub fn new() -> Result<Self, ExportError> {
        Ok(Self {
            env: default_environment()?,
            template: DEFAULT_TEMPLATE.to_string(),
            languages: LanguageTags::new(),
        })
    }

    /// Create an exporter using the configured template and language overrides.
    pub fn from_config(config: &Config) -> Result<Self, ExportError> {
        Ok(Self::new()?
            .with_template(config.export.template())
            .with_languages(config.language_tags()))
    }

    /// Select a built-in template by name, or a template file by path.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_languages(mut self, languages: LanguageTags) -> Self {
        self.languages = languages;
        self
    }

    /// Render every file of `snapshot`, reading contents through `reader`.
    ///
    /// A file that cannot be read is replaced by an inline error note and the remaining files are
    /// still rendered. An empty snapshot yields [`ExportError::EmptyInput`] and no document.
    pub fn export<R: ContentReader + ?Sized>(
        &self,
        snapshot: &Snapshot,
        generated_at: OffsetDateTime,
        reader: &R,
    ) -> Result<MarkdownReport, ExportError> {
        if snapshot.is_empty() {
            return Err(ExportError::EmptyInput);
        }

        let sections: Vec<TemplateSection> = snapshot
            .iter()
            .map(|file| self.section_for(file, read_contents(reader, file)))
            .collect();
        let failures = sections.iter().filter(|s| s.error.is_some()).count();

        let context = TemplateContext {
            generated_at: generated_at.format(&Rfc3339)?,
            sections,
        };
        let rendered = self.render_with_template(&context)?;

        tracing::debug!(
            files = snapshot.len(),
            failures,
            bytes = rendered.len(),
            "rendered open files report"
        );
        Ok(MarkdownReport::new(rendered, snapshot.len(), failures))
    }

    fn section_for(&self, file: &FileHandle, contents: Result<String, ReadError>) -> TemplateSection {
        let (contents, error) = match contents {
            Ok(contents) => (contents, None),
            Err(err) => {
                tracing::warn!(path = %file, error = %err, "failed to read open file");
                (String::new(), Some(err.to_string()))
            }
        };
        TemplateSection {
            fence: fence_for(&contents),
            name: file.name().to_string(),
            path: file.path().display().to_string(),
            language: self.languages.tag_for(file.extension()).to_string(),
            contents,
            error,
        }
    }

    fn render_with_template(&self, context: &TemplateContext) -> Result<String, ExportError> {
        let name = self.template.as_str();
        if let Ok(template) = self.env.get_template(name) {
            return template.render(context).map_err(|err| template_error(name, err));
        }

        let template_path = Path::new(name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).map_err(|err| ExportError::Template {
                name: name.to_string(),
                message: format!("failed to load template from path: {err}"),
            })?;
            let mut env = Environment::new();
            configure(&mut env);
            env.add_template("external", &source)
                .map_err(|err| template_error(name, err))?;
            return env
                .get_template("external")
                .and_then(|template| template.render(context))
                .map_err(|err| template_error(name, err));
        }

        Err(ExportError::Template {
            name: name.to_string(),
            message: "not found (built-in or filesystem)".to_string(),
        })
    }
}

impl fmt::Debug for MarkdownExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownExporter")
            .field("template", &self.template)
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

fn read_contents<R: ContentReader + ?Sized>(
    reader: &R,
    file: &FileHandle,
) -> Result<String, ReadError> {
    let bytes = reader.read_file_bytes(file)?;
    let mut text = String::from_utf8(bytes).map_err(|source| ReadError::Decode {
        path: file.path().to_path_buf(),
        source,
    })?;
    // The closing fence supplies the final line break.
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// Backtick fence one longer than any run inside `contents`, and at least three long.
fn fence_for(contents: &str) -> String {
    let longest = contents
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

fn default_environment() -> Result<Environment<'static>, ExportError> {
    let mut env = Environment::new();
    configure(&mut env);
    env.add_template(DEFAULT_TEMPLATE, DEFAULT_MARKDOWN_TEMPLATE)
        .map_err(|err| template_error(DEFAULT_TEMPLATE, err))?;
    Ok(env)
}

fn configure(env: &mut Environment<'_>) {
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
}

fn template_error(name: &str, err: minijinja::Error) -> ExportError {
    ExportError::Template {
        name: name.to_string(),
        message: err.to_string(),
    }
}

#[derive(Serialize)]
struct TemplateContext {
    generated_at: String,
    sections: Vec<TemplateSection>,
}

#[derive(Serialize)]
struct TemplateSection {
    name: String,
    path: String,
    language: String,
    contents: String,
    fence: String,
    error: Option<String>,
}

const DEFAULT_MARKDOWN_TEMPLATE: &str = r#"# Open Files Preview

Generated on: {{ generated_at }}

---

{% for section in sections %}
{% if section.error %}
*Error reading file: {{ section.error }}*
{% else %}
## {{ section.name }}
**Path:** `{{ section.path }}`

{{ section.fence }}{{ section.language }}
{{ section.contents }}
{{ section.fence }}
{% endif %}

---

{% endfor %}
"#;
