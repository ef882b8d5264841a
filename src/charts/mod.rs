//! Chart rendering.
//!
//! Three SVG charts are derived from the statistics: the rating
//! timeline, a per-model success comparison, and tag frequencies.
//! A chart that cannot be rendered is skipped; the others still run.

pub mod models;
pub mod svg;
pub mod tags;
pub mod timeline;

use crate::config::ChartsConfig;
use crate::models::Stats;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub use models::ModelComparisonChart;
pub use tags::TagFrequencyChart;
pub use timeline::TimelineChart;

/// Errors from rendering or writing one chart.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no data for the {0} chart")]
    NoData(&'static str),
    #[error("invalid chart path: {0}")]
    InvalidPath(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for all charts.
pub trait Chart {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Heading used when the chart is embedded in the report.
    fn title(&self) -> &'static str;

    /// Output file name inside the images directory.
    fn file_name(&self) -> &'static str;

    /// Render the chart as an SVG document.
    fn render(&self, stats: &Stats, config: &ChartsConfig) -> Result<String, ChartError>;
}

/// A chart that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub title: String,
    pub path: PathBuf,
}

/// The charts in report order.
pub fn all_charts() -> Vec<Box<dyn Chart>> {
    vec![
        Box::new(TimelineChart),
        Box::new(ModelComparisonChart),
        Box::new(TagFrequencyChart),
    ]
}

/// A chart rendered in memory and not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChart {
    pub name: &'static str,
    pub title: &'static str,
    pub file_name: &'static str,
    pub svg: String,
}

/// Render every chart that has data. Nothing touches the disk.
pub fn render_charts(stats: &Stats, config: &ChartsConfig) -> Vec<PendingChart> {
    let mut pending = Vec::new();

    for chart in all_charts() {
        match chart.render(stats, config) {
            Ok(svg) => pending.push(PendingChart {
                name: chart.name(),
                title: chart.title(),
                file_name: chart.file_name(),
                svg,
            }),
            Err(ChartError::NoData(name)) => {
                warn!("Skipping {} chart: no data", name);
            }
            Err(e) => {
                warn!("Skipping {} chart: {}", chart.name(), e);
            }
        }
    }

    pending
}

/// Write rendered charts into `images_dir`.
///
/// Write failures are logged and skipped; the returned list holds only the
/// charts that were written.
pub fn write_charts(charts: &[PendingChart], images_dir: &Path) -> Vec<RenderedChart> {
    let mut rendered = Vec::new();

    for chart in charts {
        let path = images_dir.join(chart.file_name);
        match svg::write_svg(&chart.svg, &path) {
            Ok(()) => {
                info!("Rendered {} chart", chart.name);
                rendered.push(RenderedChart {
                    title: chart.title.to_string(),
                    path,
                });
            }
            Err(e) => {
                warn!("Skipping {} chart: {}", chart.name, e);
            }
        }
    }

    rendered
}

/// Plot area inside a chart, in pixels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn new(width: f64, height: f64, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right: (width - right).max(left + 1.0),
            bottom: (height - bottom).max(top + 1.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Map `value` in `[0, max]` to a y coordinate.
    pub fn y_for(&self, value: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return self.bottom;
        }
        self.bottom - (value / max).clamp(0.0, 1.0) * self.height()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ExperimentRecord, Rating};
    use chrono::NaiveDate;

    pub(crate) fn sample_stats() -> Stats {
        let mut records = Vec::new();
        for (i, (model, rating, tags)) in [
            ("SDXL", Some(Rating::Exceeded), vec!["風景"]),
            ("SDXL", Some(Rating::Below), vec!["風景", "夜景"]),
            ("DALL-E <3>", Some(Rating::AsExpected), vec!["人物"]),
            ("Midjourney", None, vec![]),
        ]
        .into_iter()
        .enumerate()
        {
            let mut record = ExperimentRecord::empty(format!("{:03}", i + 1));
            record.date = NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1);
            record.model = Some(model.to_string());
            record.rating = rating;
            record.tags = tags.into_iter().map(String::from).collect();
            records.push(record);
        }
        crate::analysis::compute_stats(&records)
    }

    #[test]
    fn test_write_charts_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let pending = render_charts(&sample_stats(), &ChartsConfig::default());
        let rendered = write_charts(&pending, dir.path());

        assert_eq!(rendered.len(), 3);
        for name in ["timeline.svg", "model_comparison.svg", "tag_cloud.svg"] {
            assert!(dir.path().join(name).is_file(), "{} missing", name);
        }
    }

    #[test]
    fn test_render_charts_skips_empty_stats() {
        let pending = render_charts(&Stats::default(), &ChartsConfig::default());
        assert!(pending.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let rendered = write_charts(&pending, dir.path());
        assert!(rendered.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_charts_continues_after_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("timeline.svg")).unwrap();

        let pending = render_charts(&sample_stats(), &ChartsConfig::default());
        let rendered = write_charts(&pending, dir.path());
        let names: Vec<_> = rendered
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["model_comparison.svg", "tag_cloud.svg"]);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let stats = sample_stats();
        let config = ChartsConfig::default();
        for chart in all_charts() {
            assert_eq!(
                chart.render(&stats, &config).unwrap(),
                chart.render(&stats, &config).unwrap()
            );
        }
    }

    #[test]
    fn test_plot_area_mapping() {
        let area = PlotArea::new(100.0, 100.0, 10.0, 10.0, 10.0, 10.0);
        assert_eq!(area.width(), 80.0);
        assert_eq!(area.y_for(0.0, 4.0), 90.0);
        assert_eq!(area.y_for(4.0, 4.0), 10.0);
        assert_eq!(area.y_for(8.0, 4.0), 10.0);
        assert_eq!(area.y_for(1.0, 0.0), 90.0);
    }
}
