//! Per-model success rate comparison.

use super::svg::{Anchor, SvgDocument};
use super::{Chart, ChartError, PlotArea};
use crate::config::ChartsConfig;
use crate::models::{ModelStats, Stats};

const BAR_COLOR: &str = "steelblue";
const Y_MAX: f64 = 105.0;

/// Vertical bars of the success rate (○ or better) per model.
pub struct ModelComparisonChart;

impl ModelComparisonChart {
    fn models<'a>(&self, stats: &'a Stats, config: &ChartsConfig) -> Vec<&'a ModelStats> {
        stats
            .models
            .iter()
            .filter(|m| m.total() >= config.min_model_experiments.max(1))
            .collect()
    }
}

impl Chart for ModelComparisonChart {
    fn name(&self) -> &'static str {
        "model comparison"
    }

    fn title(&self) -> &'static str {
        "モデル別比較"
    }

    fn file_name(&self) -> &'static str {
        "model_comparison.svg"
    }

    fn render(&self, stats: &Stats, config: &ChartsConfig) -> Result<String, ChartError> {
        let models = self.models(stats, config);
        if models.is_empty() {
            return Err(ChartError::NoData(self.name()));
        }

        let mut doc = SvgDocument::new(config.width, config.height);
        let area = PlotArea::new(doc.width(), doc.height(), 80.0, 60.0, 40.0, 120.0);

        doc.text(
            doc.width() / 2.0,
            32.0,
            "Model Comparison - Success Rate",
            18,
            Anchor::Middle,
        );

        for pct in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let y = area.y_for(pct, Y_MAX);
            doc.grid_line(area.left, y, area.right, y);
            doc.text(area.left - 8.0, y + 4.0, &format!("{:.0}", pct), 12, Anchor::End);
        }
        doc.line(area.left, area.bottom, area.right, area.bottom, "#333333", 1.0);

        let slot = area.width() / models.len() as f64;
        let bar_width = slot * 0.6;

        for (i, model) in models.iter().enumerate() {
            let rate = model.success_rate();
            let center = area.left + (i as f64 + 0.5) * slot;
            let top = area.y_for(rate, Y_MAX);

            doc.rect(center - bar_width / 2.0, top, bar_width, area.bottom - top, BAR_COLOR, 0.8);
            doc.text(center, top - 6.0, &format!("{:.1}%", rate), 12, Anchor::Middle);
            doc.text_rotated(
                center,
                area.bottom + 18.0,
                &format!("{} (n={})", model.model, model.total()),
                12,
                Anchor::End,
                -15,
            );
        }

        doc.text(doc.width() / 2.0, doc.height() - 12.0, "Model", 13, Anchor::Middle);
        doc.text_rotated(
            22.0,
            area.top + area.height() / 2.0,
            "Success Rate (%)",
            13,
            Anchor::Middle,
            -90,
        );

        Ok(doc.finish())
    }
}
