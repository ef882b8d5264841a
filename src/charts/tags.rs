//! Tag frequency chart.

use super::svg::{Anchor, SvgDocument};
use super::{Chart, ChartError, PlotArea};
use crate::config::ChartsConfig;
use crate::models::Stats;

const BAR_COLOR: &str = "coral";

/// Horizontal bars of the most frequent tags.
pub struct TagFrequencyChart;

impl Chart for TagFrequencyChart {
    fn name(&self) -> &'static str {
        "tag frequency"
    }

    fn title(&self) -> &'static str {
        "タグクラウド"
    }

    fn file_name(&self) -> &'static str {
        "tag_cloud.svg"
    }

    fn render(&self, stats: &Stats, config: &ChartsConfig) -> Result<String, ChartError> {
        let tags: Vec<_> = stats.tags.iter().take(config.max_tags.max(1)).collect();
        if tags.is_empty() {
            return Err(ChartError::NoData(self.name()));
        }

        let mut doc = SvgDocument::new(config.width, config.height);
        let area = PlotArea::new(doc.width(), doc.height(), 160.0, 60.0, 60.0, 60.0);
        let max_count = tags.iter().map(|t| t.count).max().unwrap_or(1).max(1) as f64;

        doc.text(doc.width() / 2.0, 32.0, "Tag Frequency", 18, Anchor::Middle);

        let x_for = |count: f64| area.left + count / max_count * area.width();
        // At most ~10 grid lines.
        let every = (max_count as usize / 10).max(1);
        for tick in (0..=max_count as usize).step_by(every) {
            let x = x_for(tick as f64);
            doc.grid_line(x, area.top, x, area.bottom);
            doc.text(x, area.bottom + 18.0, &tick.to_string(), 11, Anchor::Middle);
        }
        doc.line(area.left, area.top, area.left, area.bottom, "#333333", 1.0);

        let row = area.height() / tags.len() as f64;
        let bar_height = row * 0.7;

        for (i, tag) in tags.iter().enumerate() {
            let center = area.top + (i as f64 + 0.5) * row;
            let width = x_for(tag.count as f64) - area.left;

            doc.rect(area.left, center - bar_height / 2.0, width, bar_height, BAR_COLOR, 0.8);
            doc.text(area.left - 8.0, center + 4.0, &tag.tag, 12, Anchor::End);
            doc.text(
                area.left + width + 6.0,
                center + 4.0,
                &tag.count.to_string(),
                12,
                Anchor::Start,
            );
        }

        doc.text(doc.width() / 2.0, doc.height() - 12.0, "Frequency", 13, Anchor::Middle);
        doc.text_rotated(22.0, area.top + area.height() / 2.0, "Tag", 13, Anchor::Middle, -90);

        Ok(doc.finish())
    }
}
