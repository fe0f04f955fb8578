//! Extension to fenced-code language tag mapping.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

/// Tag used when an extension is missing or unknown.
pub const PLAIN_TEXT_TAG: &str = "text";

/// Built-in `(extension, tag)` pairs. Extensions are lowercase.
pub static LANGUAGE_TAGS: &[(&str, &str)] = &[
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("java", "java"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("xml", "xml"),
    ("yml", "yaml"),
    ("yaml", "yaml"),
    ("md", "markdown"),
    ("sh", "bash"),
    ("sql", "sql"),
    ("php", "php"),
    ("rb", "ruby"),
    ("go", "go"),
    ("rs", "rust"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("c", "c"),
    ("h", "c"),
    ("cs", "csharp"),
    ("swift", "swift"),
    ("dart", "dart"),
    ("toml", "toml"),
];

static TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LANGUAGE_TAGS.iter().copied().collect());

/// Look up the built-in tag for an extension, ignoring case.
pub fn language_for_extension(extension: Option<&str>) -> &'static str {
    extension
        .and_then(|ext| TABLE.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(PLAIN_TEXT_TAG)
}

/// Built-in table extended with user-configured mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTags {
    overrides: BTreeMap<String, String>,
}

impl LanguageTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer `extension = tag` pairs over the built-in table. Blank tags are ignored.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let overrides = overrides
            .into_iter()
            .filter_map(|(ext, tag)| {
                let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
                let tag = tag.trim();
                (!ext.is_empty() && !tag.is_empty()).then(|| (ext, tag.to_string()))
            })
            .collect();
        Self { overrides }
    }

    pub fn tag_for(&self, extension: Option<&str>) -> &str {
        if let Some(ext) = extension
            && let Some(tag) = self.overrides.get(&ext.to_ascii_lowercase())
        {
            return tag;
        }
        language_for_extension(extension)
    }
}
