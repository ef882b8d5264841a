//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.expstats.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working and wiki directories.
pub const CONFIG_FILE_NAME: &str = ".expstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Field marker labels used by the record parser.
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the experiment pages.
    #[serde(default = "default_wiki_dir")]
    pub wiki_dir: PathBuf,

    /// Report file. Relative paths are resolved against `wiki_dir`.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Chart directory. Relative paths are resolved against `wiki_dir`.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            wiki_dir: default_wiki_dir(),
            output: default_output(),
            images_dir: default_images_dir(),
        }
    }
}

fn default_wiki_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("Stats.md")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

/// Record file discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// File extensions treated as pages.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Page file names that are never records.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Only pages whose name starts with a digit are records.
    #[serde(default = "default_true")]
    pub numeric_prefix: bool,

    /// How deep to descend below the wiki directory (1 = top level only).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excludes: default_excludes(),
            numeric_prefix: true,
            max_depth: default_max_depth(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_excludes() -> Vec<String> {
    vec!["Home.md", "Stats.md", "Template.md", "_Sidebar.md", "_Footer.md"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_depth() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Marker labels of the experiment page template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsConfig {
    #[serde(default = "default_title_label")]
    pub title: String,
    #[serde(default = "default_placeholder_id")]
    pub placeholder_id: String,
    #[serde(default = "default_date_label")]
    pub date: String,
    #[serde(default = "default_recorder_label")]
    pub recorder: String,
    #[serde(default = "default_model_label")]
    pub model: String,
    #[serde(default = "default_target_label")]
    pub target: String,
    #[serde(default = "default_rating_label")]
    pub rating: String,
    #[serde(default = "default_tags_label")]
    pub tags: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            title: default_title_label(),
            placeholder_id: default_placeholder_id(),
            date: default_date_label(),
            recorder: default_recorder_label(),
            model: default_model_label(),
            target: default_target_label(),
            rating: default_rating_label(),
            tags: default_tags_label(),
        }
    }
}

fn default_title_label() -> String {
    "実験".to_string()
}

fn default_placeholder_id() -> String {
    "ID".to_string()
}

fn default_date_label() -> String {
    "日付".to_string()
}

fn default_recorder_label() -> String {
    "記録者".to_string()
}

fn default_model_label() -> String {
    "モデル".to_string()
}

fn default_target_label() -> String {
    "対象".to_string()
}

fn default_rating_label() -> String {
    "評価".to_string()
}

fn default_tags_label() -> String {
    "タグ".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Navigation link printed under the title.
    #[serde(default = "default_home_link")]
    pub home_link: String,

    /// Include the recorder table.
    #[serde(default = "default_true")]
    pub include_recorders: bool,

    /// Limit the tag table to this many rows (all when unset).
    #[serde(default)]
    pub max_tags: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            home_link: default_home_link(),
            include_recorders: true,
            max_tags: None,
        }
    }
}

fn default_home_link() -> String {
    "[[Home|← トップへ]]".to_string()
}

/// Chart rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Render charts at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Image width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,

    /// Models with fewer experiments are left out of the model chart.
    #[serde(default = "default_min_model_experiments")]
    pub min_model_experiments: usize,

    /// Maximum number of bars in the tag chart.
    #[serde(default = "default_chart_max_tags")]
    pub max_tags: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_chart_width(),
            height: default_chart_height(),
            min_model_experiments: default_min_model_experiments(),
            max_tags: default_chart_max_tags(),
        }
    }
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    600
}

fn default_min_model_experiments() -> usize {
    1
}

fn default_chart_max_tags() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the working directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a wiki directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.is_file() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Paths given
    /// on the command line are relative to the working directory.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref wiki_dir) = args.wiki_dir {
            self.general.wiki_dir = wiki_dir.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = from_working_dir(output);
        }
        if let Some(ref images_dir) = args.images_dir {
            self.general.images_dir = from_working_dir(images_dir);
        }

        if args.no_charts {
            self.charts.enabled = false;
        }
    }

    /// Resolved path of the report file.
    pub fn report_path(&self) -> PathBuf {
        self.in_wiki_dir(&self.general.output)
    }

    /// Resolved chart directory.
    pub fn images_path(&self) -> PathBuf {
        self.in_wiki_dir(&self.general.images_dir)
    }

    fn in_wiki_dir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.general.wiki_dir.join(path)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn from_working_dir(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, PathBuf::from("Stats.md"));
        assert_eq!(config.fields.rating, "評価");
        assert!(config.scanner.numeric_prefix);
        assert!(config.scanner.excludes.contains(&"Template.md".to_string()));
        assert!(config.charts.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
wiki_dir = "wiki"
output = "pages/Stats.md"

[scanner]
extensions = ["md", "markdown"]
numeric_prefix = false

[fields]
model = "Model"

[charts]
width = 800
min_model_experiments = 2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.wiki_dir, PathBuf::from("wiki"));
        assert_eq!(config.report_path(), PathBuf::from("wiki/pages/Stats.md"));
        assert_eq!(config.images_path(), PathBuf::from("wiki/images"));
        assert_eq!(config.scanner.extensions, vec!["md", "markdown"]);
        assert!(!config.scanner.numeric_prefix);
        assert_eq!(config.fields.model, "Model");
        assert_eq!(config.fields.date, "日付");
        assert_eq!(config.charts.width, 800);
        assert_eq!(config.charts.height, 600);
        assert_eq!(config.charts.min_model_experiments, 2);
    }

    #[test]
    fn test_logging_is_not_a_config_setting() {
        assert!(!Config::default_toml().contains("verbose"));

        // Older files that still carry the key keep loading.
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = crate::cli::tests::make_args();
        args.wiki_dir = Some(PathBuf::from("wiki"));
        args.no_charts = true;
        args.verbose = true;
        config.merge_with_args(&args);

        assert_eq!(config.general.wiki_dir, PathBuf::from("wiki"));
        assert_eq!(config.report_path(), PathBuf::from("wiki/Stats.md"));
        assert!(!config.charts.enabled);
    }

    #[test]
    fn test_absolute_output_is_kept() {
        let mut config = Config::default();
        let absolute = std::env::temp_dir().join("Stats.md");
        config.general.output = absolute.clone();
        assert_eq!(config.report_path(), absolute);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[fields]"));
        assert!(toml_str.contains("[charts]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed, Config::default());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[charts]\nenabled = false\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(!config.charts.enabled);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[charts\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
