//! Record file discovery.
//!
//! This module lists the wiki directory and selects the pages that are
//! experiment records, leaving index, template and navigation pages out.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for record discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Page extensions to include (e.g., ["md"])
    pub extensions: Vec<String>,
    /// File names that are never records (e.g., ["Home.md", "Template.md"])
    pub excludes: Vec<String>,
    /// Require the file stem to start with an ASCII digit
    pub numeric_prefix: bool,
    /// Directory depth to descend (1 = wiki root only)
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&crate::config::ScannerConfig::default())
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            numeric_prefix: config.numeric_prefix,
            max_depth: config.max_depth.max(1),
        }
    }
}

/// A page selected as an experiment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute or wiki-relative path as discovered
    pub path: PathBuf,
    /// File stem, used as the default record ID
    pub stem: String,
}

/// Contents of one record file, or the reason it could not be read.
#[derive(Debug)]
pub enum LoadedFile {
    Loaded { file: ScannedFile, content: String },
    Skipped { file: ScannedFile, reason: String },
}

impl LoadedFile {
    /// The scanned file, whether or not it could be read.
    pub fn file(&self) -> &ScannedFile {
        match self {
            LoadedFile::Loaded { file, .. } | LoadedFile::Skipped { file, .. } => file,
        }
    }
}

/// Scanner for experiment record files.
pub struct RecordScanner {
    config: ScanConfig,
    wiki_root: PathBuf,
}

impl RecordScanner {
    /// Create a new record scanner.
    pub fn new(wiki_root: PathBuf, config: ScanConfig) -> Self {
        Self { config, wiki_root }
    }

    /// List all record files, sorted by path.
    ///
    /// Fails only when the wiki directory itself cannot be read.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.wiki_root.exists() {
            return Err(anyhow!(
                "Wiki directory not found: {}",
                self.wiki_root.display()
            ));
        }
        if !self.wiki_root.is_dir() {
            return Err(anyhow!(
                "Wiki path is not a directory: {}",
                self.wiki_root.display()
            ));
        }

        // Read the root eagerly so permission problems surface as fatal.
        fs::read_dir(&self.wiki_root).with_context(|| {
            format!("Failed to read wiki directory: {}", self.wiki_root.display())
        })?;

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.wiki_root)
            .min_depth(1)
            .max_depth(self.config.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.matches(path) {
                debug!("Not a record file: {}", path.display());
                continue;
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            files.push(ScannedFile {
                path: path.to_path_buf(),
                stem,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Scan and read every record file.
    ///
    /// Unreadable files are returned as [`LoadedFile::Skipped`].
    pub fn load(&self) -> Result<Vec<LoadedFile>> {
        let files = self.scan()?;
        Ok(files.into_iter().map(read_file).collect())
    }

    /// Check if a path names a record file.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if self.is_excluded(name) {
            return false;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self
            .config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        {
            return false;
        }

        if self.config.numeric_prefix {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if !stem.starts_with(|c: char| c.is_ascii_digit()) {
                return false;
            }
        }

        true
    }

    /// Check if a name matches exclusion patterns.
    fn is_excluded(&self, name: &str) -> bool {
        if is_hidden(std::ffi::OsStr::new(name)) {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

fn read_file(file: ScannedFile) -> LoadedFile {
    match fs::read_to_string(&file.path) {
        Ok(content) => LoadedFile::Loaded { file, content },
        Err(e) => {
            warn!("Failed to read {}: {}", file.path.display(), e);
            LoadedFile::Skipped {
                reason: e.to_string(),
                file,
            }
        }
    }
}
