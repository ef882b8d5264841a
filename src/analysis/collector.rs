//! Turning loaded pages into records.

use crate::models::ExperimentRecord;
use crate::parser::RecordParser;
use crate::scanner::LoadedFile;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A record file that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of parsing all loaded pages.
#[derive(Debug, Default)]
pub struct Collected {
    /// Parsed records in file order, with unique IDs.
    pub records: Vec<ExperimentRecord>,
    /// Files that were unreadable or not records.
    pub skipped: Vec<SkippedFile>,
}

/// Parse every loaded page. Failures are collected, never propagated.
pub fn collect_records(
    files: Vec<LoadedFile>,
    parser: &RecordParser,
    show_progress: bool,
) -> Collected {
    let pb = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // Every file's own stem is reserved up front so a title ID can never
    // take the ID another page falls back to.
    let stems: HashSet<String> = files.iter().map(|f| f.file().stem.clone()).collect();

    let mut collected = Collected::default();
    let mut seen: HashSet<String> = HashSet::new();

    for file in files {
        match file {
            LoadedFile::Loaded { file, content } => {
                pb.set_message(file.stem.clone());
                match parser.parse(&file.stem, &file.path, &content) {
                    Ok(mut record) => {
                        let taken = seen.contains(&record.id)
                            || (record.id != file.stem && stems.contains(&record.id));
                        if taken {
                            warn!(
                                "Experiment ID {} in {} is already in use, using file name {}",
                                record.id,
                                file.path.display(),
                                file.stem
                            );
                            record.id = file.stem.clone();
                        }
                        if seen.insert(record.id.clone()) {
                            collected.records.push(record);
                        } else {
                            warn!("Skipping {}: duplicate ID {}", file.path.display(), record.id);
                            collected.skipped.push(SkippedFile {
                                path: file.path,
                                reason: format!("duplicate ID {}", record.id),
                            });
                        }
                    }
                    Err(e) => {
                        debug!("Skipping {}: {}", file.path.display(), e);
                        collected.skipped.push(SkippedFile {
                            path: file.path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            LoadedFile::Skipped { file, reason } => {
                collected.skipped.push(SkippedFile {
                    path: file.path,
                    reason,
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldsConfig;
    use crate::scanner::ScannedFile;

    fn loaded(stem: &str, content: &str) -> LoadedFile {
        LoadedFile::Loaded {
            file: ScannedFile {
                path: PathBuf::from(format!("{}.md", stem)),
                stem: stem.to_string(),
            },
            content: content.to_string(),
        }
    }

    fn parser() -> RecordParser {
        RecordParser::new(&FieldsConfig::default()).unwrap()
    }

    #[test]
    fn test_collect_skips_invalid_pages() {
        let files = vec![
            loaded("001", "# 実験 001: a\n**評価: ◎**\n"),
            loaded("002", ""),
            LoadedFile::Skipped {
                file: ScannedFile {
                    path: PathBuf::from("003.md"),
                    stem: "003".to_string(),
                },
                reason: "permission denied".to_string(),
            },
        ];

        let collected = collect_records(files, &parser(), false);

        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.skipped.len(), 2);
        assert_eq!(collected.skipped[1].reason, "permission denied");
    }

    #[test]
    fn test_duplicate_title_ids_fall_back_to_stem() {
        let files = vec![
            loaded("001", "# 実験 A: a\n**評価: ◎**\n"),
            loaded("002", "# 実験 A: b\n**評価: ○**\n"),
        ];

        let collected = collect_records(files, &parser(), false);
        let ids: Vec<&str> = collected.records.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["A", "002"]);
    }

    #[test]
    fn test_title_id_cannot_take_another_pages_stem() {
        let files = vec![
            loaded("001", "# 実験 002: a\n**評価: ◎**\n"),
            loaded("002", "# 実験 002: b\n**評価: ❌**\n"),
        ];

        let collected = collect_records(files, &parser(), false);
        let ids: Vec<&str> = collected.records.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["001", "002"]);
        assert!(collected.skipped.is_empty());

        let stats = crate::analysis::compute_stats(&collected.records);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ratings.failed, 1);
    }

    #[test]
    fn test_same_stem_in_subdirectories_is_skipped() {
        let nested = |dir: &str| LoadedFile::Loaded {
            file: ScannedFile {
                path: PathBuf::from(format!("{}/001.md", dir)),
                stem: "001".to_string(),
            },
            content: "**評価: ○**\n".to_string(),
        };

        let collected = collect_records(vec![nested("a"), nested("b")], &parser(), false);

        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.skipped[0].reason, "duplicate ID 001");
    }
}
