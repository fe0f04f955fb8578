//! Configuration management utilities.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::language::LanguageTags;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".openfiles/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub panel: Panel,
    #[serde(default)]
    pub export: Export,
    /// Extra `extension = "tag"` mappings layered over the built-in language table.
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub title: Option<String>,
}

impl Panel {
    fn default_title() -> &'static str {
        "Open Files:"
    }

    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| Self::default_title().to_owned())
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            title: Some(Self::default_title().to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    file_prefix: Option<String>,
    #[serde(default)]
    file_suffix: Option<String>,
}

impl Export {
    fn default_template() -> &'static str {
        "open_files_preview"
    }

    fn default_file_prefix() -> &'static str {
        "open_files_preview_"
    }

    fn default_file_suffix() -> &'static str {
        ".md"
    }

    /// Built-in template name or path to a template file.
    pub fn template(&self) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| Self::default_template().to_owned())
    }

    pub fn file_prefix(&self) -> String {
        self.file_prefix
            .clone()
            .unwrap_or_else(|| Self::default_file_prefix().to_owned())
    }

    pub fn file_suffix(&self) -> String {
        self.file_suffix
            .clone()
            .unwrap_or_else(|| Self::default_file_suffix().to_owned())
    }
}

impl Default for Export {
    fn default() -> Self {
        Self {
            template: Some(Self::default_template().to_owned()),
            file_prefix: Some(Self::default_file_prefix().to_owned()),
            file_suffix: Some(Self::default_file_suffix().to_owned()),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    panel_title: Option<String>,
    template: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self::from_values(
            env::var("OPENFILES_PANEL_TITLE").ok(),
            env::var("OPENFILES_TEMPLATE").ok(),
        )
    }

    /// Blank values count as unset.
    fn from_values(panel_title: Option<String>, template: Option<String>) -> Self {
        let set = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        Self {
            panel_title: set(panel_title),
            template: set(template),
        }
    }

    #[cfg(test)]
    fn for_tests(panel_title: &str, template: &str) -> Self {
        Self {
            panel_title: Some(panel_title.to_owned()),
            template: Some(template.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        let mut languages = self.languages;
        languages.extend(other.languages);
        Self {
            panel: merge_panel(self.panel, other.panel),
            export: merge_export(self.export, other.export),
            languages,
        }
    }

    /// Language table including configured overrides.
    pub fn language_tags(&self) -> LanguageTags {
        LanguageTags::with_overrides(&self.languages)
    }
}

fn merge_panel(mut base: Panel, overlay: Panel) -> Panel {
    if let Some(value) = overlay.title {
        base.title = Some(value);
    }
    base
}

fn merge_export(mut base: Export, overlay: Export) -> Export {
    if let Some(value) = overlay.template {
        base.template = Some(value);
    }
    if let Some(value) = overlay.file_prefix {
        base.file_prefix = Some(value);
    }
    if let Some(value) = overlay.file_suffix {
        base.file_suffix = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("openfiles/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(title) = env.panel_title {
        config.panel.title = Some(title);
    }
    if let Some(template) = env.template {
        config.export.template = Some(template);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.panel.title(), "Open Files:");
        assert_eq!(config.export.template(), "open_files_preview");
        assert_eq!(config.export.file_prefix(), "open_files_preview_");
        assert_eq!(config.export.file_suffix(), ".md");
        assert!(config.languages.is_empty());
    }

    #[test]
    fn embedded_defaults_match_code_defaults() {
        let embedded = Config::from_str(&DEFAULT_CONFIG).expect("parse embedded defaults");
        assert_eq!(embedded, Config::default());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[panel]
title = "Editors"
[languages]
vue = "vue"
h = "c"
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".openfiles"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".openfiles/config.toml"),
            r#"
[export]
file_prefix = "snapshot_"
[languages]
h = "cpp"
"#,
        )?;

        let global_path = Some(global);
        let workspace_path = Some(workspace_dir.join(".openfiles/config.toml"));

        let config =
            Config::load_with_layers(global_path, workspace_path, EnvOverrides::default())?;

        assert_eq!(config.panel.title(), "Editors");
        assert_eq!(config.export.file_prefix(), "snapshot_");
        assert_eq!(config.export.file_suffix(), ".md");
        assert_eq!(config.languages.get("vue").map(String::as_str), Some("vue"));
        assert_eq!(config.languages.get("h").map(String::as_str), Some("cpp"));
        assert_eq!(config.language_tags().tag_for(Some("h")), "cpp");

        Ok(())
    }

    #[test]
    fn workspace_can_reset_title_to_default_value() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(&global, "[panel]\ntitle = \"Editors\"\n")?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(&workspace, "[panel]\ntitle = \"Open Files:\"\n")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.panel.title(), "Open Files:");
        Ok(())
    }

    #[test]
    fn layer_without_title_keeps_earlier_title() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(&global, "[panel]\ntitle = \"Editors\"\n")?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(&workspace, "[panel]\n")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.panel.title(), "Editors");
        Ok(())
    }

    #[test]
    fn blank_env_values_are_ignored() -> Result<()> {
        let overrides = EnvOverrides::from_values(Some("  ".into()), Some(String::new()));
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.panel.title(), "Open Files:");
        assert_eq!(config.export.template(), "open_files_preview");
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("Open editors", "/tmp/report.j2");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.panel.title(), "Open editors");
        assert_eq!(config.export.template(), "/tmp/report.j2");
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn find_repo_root_walks_up_to_git_dir() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested)?;
        fs::create_dir_all(temp.path().join(".git"))?;
        assert_eq!(find_repo_root(&nested), Some(temp.path().to_path_buf()));
        Ok(())
    }
}
