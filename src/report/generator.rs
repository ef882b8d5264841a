//! Stats page generation.
//!
//! This module renders the statistics into the wiki's Stats page
//! (Markdown) or a JSON document, and writes the result to disk.

use crate::charts::RenderedChart;
use crate::config::ReportConfig;
use crate::models::{
    percentage, ChartLink, ModelStats, Rating, Report, ReportMetadata, Stats, UNKNOWN_LABEL,
};
use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Generate the complete Stats page.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# 統計・分析\n\n");
    if !config.home_link.is_empty() {
        output.push_str(&format!("{}\n\n", config.home_link));
    }

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str("---\n\n");

    output.push_str(&generate_summary_section(&report.stats, &report.metadata));
    output.push_str(&generate_rating_section(&report.stats));
    output.push_str(&generate_model_section(&report.stats.models));
    output.push_str(&generate_tag_section(&report.stats, config.max_tags));

    if config.include_recorders {
        output.push_str(&generate_recorder_section(&report.stats.recorders));
    }

    output.push_str("---\n\n");
    output.push_str(&generate_chart_section(&report.charts));
    output.push_str("---\n\n");

    output.push_str(&generate_footer());

    output
}

/// Generate the "last updated" line.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let as_of = metadata
        .as_of
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());

    format!("最終更新: {}\n\n", as_of)
}

/// Generate the summary section.
fn generate_summary_section(stats: &Stats, metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## サマリー\n\n");
    section.push_str(&format!("- **総実験数:** {}\n", stats.total));
    section.push_str(&format!(
        "- **成功率 (○以上):** {:.1}%\n",
        stats.success_rate()
    ));

    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        section.push_str(&format!(
            "- **期間:** {} 〜 {}\n",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ));
    }
    if stats.undated > 0 {
        section.push_str(&format!("- **日付不明:** {}\n", stats.undated));
    }
    if metadata.files_skipped > 0 {
        section.push_str(&format!(
            "- **解析できなかったファイル:** {}\n",
            metadata.files_skipped
        ));
    }
    section.push('\n');

    if stats.total == 0 {
        section.push_str("実験データが見つかりません。\n\n");
    }

    section
}

/// Generate the rating breakdown, including the unknown bucket.
fn generate_rating_section(stats: &Stats) -> String {
    let mut section = String::new();

    section.push_str("## 評価別内訳\n\n");
    section.push_str("| 評価 | 件数 | 割合 |\n");
    section.push_str("|------|------|------|\n");

    for rating in Rating::ALL {
        let count = stats.ratings.get(rating);
        section.push_str(&format!(
            "| {} {} | {} | {:.1}% |\n",
            rating.symbol(),
            rating.label(),
            count,
            percentage(count, stats.total)
        ));
    }
    section.push_str(&format!(
        "| {} | {} | {:.1}% |\n\n",
        UNKNOWN_LABEL,
        stats.ratings.unknown,
        percentage(stats.ratings.unknown, stats.total)
    ));

    section
}

/// Generate the per-model table.
fn generate_model_section(models: &[ModelStats]) -> String {
    let mut section = String::new();

    section.push_str("## モデル別統計\n\n");
    section.push_str("| モデル | 実験数 | ◎ | ○ | △ | ❌ | 不明 | 成功率 |\n");
    section.push_str("|--------|--------|---|---|---|---|------|--------|\n");

    for model in models {
        let r = &model.ratings;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {:.1}% |\n",
            cell(&model.model),
            model.total(),
            r.exceeded,
            r.as_expected,
            r.below,
            r.failed,
            r.unknown,
            model.success_rate()
        ));
    }
    section.push('\n');

    section
}

/// Generate the tag table with links to the related experiments.
fn generate_tag_section(stats: &Stats, max_tags: Option<usize>) -> String {
    let mut section = String::new();

    section.push_str("## タグ別統計\n\n");
    section.push_str("| タグ | 出現回数 | 関連実験 |\n");
    section.push_str("|------|----------|----------|\n");

    let limit = max_tags.unwrap_or(stats.tags.len());
    for tag in stats.tags.iter().take(limit) {
        let links: Vec<String> = tag
            .experiments
            .iter()
            .map(|id| format!("[[{}]]", cell(id)))
            .collect();
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            cell(&tag.tag),
            tag.count,
            links.join(", ")
        ));
    }
    section.push('\n');

    if stats.untagged > 0 {
        section.push_str(&format!("タグなしの実験: {}\n\n", stats.untagged));
    }

    section
}

/// Generate the per-recorder table.
fn generate_recorder_section(recorders: &[(String, usize)]) -> String {
    let mut section = String::new();

    section.push_str("## 記録者別統計\n\n");
    section.push_str("| 記録者 | 実験数 |\n");
    section.push_str("|--------|--------|\n");

    for (recorder, count) in recorders {
        section.push_str(&format!("| {} | {} |\n", cell(recorder), count));
    }
    section.push('\n');

    section
}

/// Generate the chart section for the charts that were rendered.
fn generate_chart_section(charts: &[ChartLink]) -> String {
    let mut section = String::new();

    section.push_str("## グラフ\n\n");

    if charts.is_empty() {
        section.push_str("表示できるグラフはありません。\n\n");
        return section;
    }

    for chart in charts {
        section.push_str(&format!("### {}\n", chart.title));
        section.push_str(&format!("![{}]({})\n\n", chart.title, chart.href));
    }

    section
}

/// Generate the page footer.
fn generate_footer() -> String {
    "**自動生成:** このページは `expstats` により自動更新されます。\n".to_string()
}

/// Escape a value for use inside a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Build report links for the rendered charts, relative to the report file.
pub fn chart_links(charts: &[RenderedChart], report_path: &Path) -> Vec<ChartLink> {
    let report_dir = report_path.parent().unwrap_or_else(|| Path::new(""));

    charts
        .iter()
        .map(|chart| ChartLink {
            title: chart.title.clone(),
            href: relative_href(report_dir, &chart.path),
        })
        .collect()
}

/// Link from `base_dir` to `target` using `/` separators.
///
/// Both paths are made absolute against the working directory first, so a
/// report given on the command line and a chart directory taken from the
/// wiki config still relate correctly.
fn relative_href(base_dir: &Path, target: &Path) -> String {
    let base = absolute(base_dir);
    let target_abs = absolute(target);

    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target_abs.components().collect();

    // Different roots (e.g. Windows drives) have no relative link.
    if base_parts.first() != target_parts.first() {
        return target.to_string_lossy().replace('\\', "/");
    }

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    parts.extend(
        target_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );

    if parts.first().map(String::as_str) == Some("..") {
        parts.join("/")
    } else {
        format!("./{}", parts.join("/"))
    }
}

/// Absolute, lexically normalized form of `path` (`.` and `..` resolved).
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Make sure the report can be written before any output is produced.
///
/// Creates the parent directory and opens the file without truncating it,
/// so an existing report is left as it was.
pub fn prepare_report_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        bail!("Report path is a directory: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            debug!("Creating report directory: {}", parent.display());
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Report is not writable: {}", path.display()))?;

    Ok(())
}

/// Write the report, replacing any previous version.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating report directory: {}", parent.display());
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Report written to {} ({} bytes)", path.display(), content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_stats;
    use crate::models::ExperimentRecord;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn record(id: &str, model: &str, tags: &[&str], rating: Option<Rating>) -> ExperimentRecord {
        let mut record = ExperimentRecord::empty(id);
        record.model = Some(model.to_string());
        record.tags = tags.iter().map(|t| t.to_string()).collect();
        record.rating = rating;
        record.date = NaiveDate::from_ymd_opt(2024, 2, id.parse().unwrap_or(1));
        record
    }

    fn create_test_report(records: Vec<ExperimentRecord>) -> Report {
        let stats = compute_stats(&records);
        Report {
            metadata: ReportMetadata {
                wiki_dir: "wiki".to_string(),
                as_of: stats.last_date,
                files_parsed: records.len(),
                files_skipped: 0,
            },
            stats,
            charts: vec![ChartLink {
                title: "評価推移".to_string(),
                href: "./images/timeline.svg".to_string(),
            }],
            records,
        }
    }

    fn three_records() -> Vec<ExperimentRecord> {
        vec![
            record("1", "SDXL", &["風景"], Some(Rating::Exceeded)),
            record("2", "SDXL", &["風景", "夜景"], Some(Rating::AsExpected)),
            record("3", "DALL-E|3", &[], Some(Rating::Failed)),
        ]
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(three_records());
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.starts_with("# 統計・分析\n\n[[Home|← トップへ]]\n\n"));
        assert!(markdown.contains("最終更新: 2024-02-03"));
        assert!(markdown.contains("- **総実験数:** 3\n"));
        assert!(markdown.contains("- **成功率 (○以上):** 66.7%\n"));
        assert!(markdown.contains("| ◎ 期待以上 | 1 | 33.3% |"));
        assert!(markdown.contains("| ○ 期待通り | 1 | 33.3% |"));
        assert!(markdown.contains("| △ 期待以下 | 0 | 0.0% |"));
        assert!(markdown.contains("| ❌ 失敗 | 1 | 33.3% |"));
        assert!(markdown.contains("| 不明 | 0 | 0.0% |"));
        assert!(markdown.contains("| SDXL | 2 | 1 | 1 | 0 | 0 | 0 | 100.0% |"));
        assert!(markdown.contains("| DALL-E\\|3 | 1 |"));
        assert!(markdown.contains("| 風景 | 2 | [[1]], [[2]] |"));
        assert!(markdown.contains("タグなしの実験: 1"));
        assert!(markdown.contains("![評価推移](./images/timeline.svg)"));
    }

    #[test]
    fn test_zero_experiments() {
        let mut report = create_test_report(Vec::new());
        report.charts.clear();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("最終更新: -"));
        assert!(markdown.contains("- **総実験数:** 0\n"));
        assert!(markdown.contains("実験データが見つかりません。"));
        assert!(markdown.contains("表示できるグラフはありません。"));
    }

    #[test]
    fn test_report_config_options() {
        let report = create_test_report(three_records());
        let config = ReportConfig {
            home_link: String::new(),
            include_recorders: false,
            max_tags: Some(1),
        };
        let markdown = generate_markdown_report(&report, &config);

        assert!(!markdown.contains("[[Home"));
        assert!(!markdown.contains("## 記録者別統計"));
        assert!(markdown.contains("| 風景 |"));
        assert!(!markdown.contains("| 夜景 |"));
    }

    #[test]
    fn test_markdown_is_deterministic() {
        let config = ReportConfig::default();
        let a = generate_markdown_report(&create_test_report(three_records()), &config);
        let b = generate_markdown_report(&create_test_report(three_records()), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(three_records());
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"stats\""));
        assert!(json.contains("\"as_expected\": 1"));
        assert!(json.contains("\"records\""));
        assert!(!json.contains("raw_text"));
    }

    #[test]
    fn test_json_records_have_uniform_shape() {
        let mut sparse = ExperimentRecord::empty("9");
        sparse.source = PathBuf::from("9.md");
        let mut full = record("1", "SDXL", &["風景"], Some(Rating::Exceeded));
        full.date_text = Some("2024-02-01".to_string());
        full.recorder = Some("hana".to_string());
        full.target = Some("風景".to_string());

        let json = generate_json_report(&create_test_report(vec![full, sparse])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = value["records"].as_array().unwrap();

        let keys = |v: &serde_json::Value| -> Vec<String> {
            let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        };
        assert_eq!(keys(&records[0]), keys(&records[1]));
        assert!(records[1]["date_text"].is_null());
        assert!(records[1]["model"].is_null());
        assert!(records[1]["recorder"].is_null());
    }

    #[test]
    fn test_chart_links_are_relative() {
        let charts = vec![RenderedChart {
            title: "タグクラウド".to_string(),
            path: PathBuf::from("./wiki/images/tag_cloud.svg"),
        }];

        let links = chart_links(&charts, Path::new("wiki/Stats.md"));
        assert_eq!(links[0].href, "./images/tag_cloud.svg");

        let links = chart_links(&charts, Path::new("elsewhere/Stats.md"));
        assert_eq!(links[0].href, "../wiki/images/tag_cloud.svg");

        let links = chart_links(&charts, Path::new("wiki/pages/Stats.md"));
        assert_eq!(links[0].href, "../images/tag_cloud.svg");
    }

    #[test]
    fn test_chart_links_with_absolute_report_path() {
        let cwd = std::env::current_dir().unwrap();
        let charts = vec![RenderedChart {
            title: "評価推移".to_string(),
            path: PathBuf::from("wiki/images/timeline.svg"),
        }];

        let links = chart_links(&charts, &cwd.join("wiki").join("Stats.md"));
        assert_eq!(links[0].href, "./images/timeline.svg");

        let links = chart_links(&charts, &cwd.join("wiki").join("..").join("wiki/Stats.md"));
        assert_eq!(links[0].href, "./images/timeline.svg");
    }

    #[test]
    fn test_prepare_report_path() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("nested").join("Stats.md");
        prepare_report_path(&path).unwrap();
        assert!(path.is_file());

        std::fs::write(&path, "previous").unwrap();
        prepare_report_path(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");

        assert!(prepare_report_path(dir.path()).is_err());

        std::fs::write(dir.path().join("blocker"), "file").unwrap();
        assert!(prepare_report_path(&dir.path().join("blocker").join("Stats.md")).is_err());
    }

    #[test]
    fn test_write_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("Stats.md");

        write_report("first version, longer", &path).unwrap();
        write_report("second", &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
