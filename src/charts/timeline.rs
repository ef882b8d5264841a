//! Rating-over-time chart.

use super::svg::{Anchor, SvgDocument};
use super::{Chart, ChartError, PlotArea};
use crate::config::ChartsConfig;
use crate::models::{score_of, Rating, Stats};

const LINE_COLOR: &str = "#1f77b4";
const SUCCESS_COLOR: &str = "#2ca02c";
const MAX_SCORE: f64 = 4.0;

/// Rating score of each dated experiment, plus the cumulative success rate.
pub struct TimelineChart;

impl Chart for TimelineChart {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn title(&self) -> &'static str {
        "評価推移"
    }

    fn file_name(&self) -> &'static str {
        "timeline.svg"
    }

    fn render(&self, stats: &Stats, config: &ChartsConfig) -> Result<String, ChartError> {
        let points = &stats.timeline;
        if points.is_empty() {
            return Err(ChartError::NoData(self.name()));
        }

        let mut doc = SvgDocument::new(config.width, config.height);
        let area = PlotArea::new(doc.width(), doc.height(), 90.0, 60.0, 70.0, 110.0);

        doc.text(
            doc.width() / 2.0,
            32.0,
            "Experiment Rating Timeline",
            18,
            Anchor::Middle,
        );

        // Left axis: rating score, 0 = unknown.
        let mut levels = vec![(0.0, "Unknown")];
        for rating in Rating::ALL.iter().rev() {
            levels.push((rating.score() as f64, rating.axis_label()));
        }
        for (score, label) in levels {
            let y = area.y_for(score, MAX_SCORE);
            doc.grid_line(area.left, y, area.right, y);
            doc.text(area.left - 8.0, y + 4.0, label, 12, Anchor::End);
        }

        // Right axis: cumulative success rate.
        for pct in [0.0, 50.0, 100.0] {
            let y = area.y_for(pct, 100.0);
            doc.text(area.right + 8.0, y + 4.0, &format!("{:.0}%", pct), 11, Anchor::Start);
        }

        doc.line(area.left, area.bottom, area.right, area.bottom, "#333333", 1.0);
        doc.line(area.left, area.top, area.left, area.bottom, "#333333", 1.0);

        let step = area.width() / points.len() as f64;
        let x_for = |i: usize| area.left + (i as f64 + 0.5) * step;

        let rating_line: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (x_for(i), area.y_for(score_of(p.rating) as f64, MAX_SCORE)))
            .collect();
        let success_line: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (x_for(i), area.y_for(p.cumulative_success_rate, 100.0)))
            .collect();

        doc.polyline(&success_line, SUCCESS_COLOR, 1.5, true);
        doc.polyline(&rating_line, LINE_COLOR, 2.0, false);
        for &(x, y) in &rating_line {
            doc.circle(x, y, 5.0, LINE_COLOR);
        }

        for (i, point) in points.iter().enumerate() {
            let label = format!("{} ({})", point.id, point.date.format("%m/%d"));
            doc.text_rotated(x_for(i), area.bottom + 16.0, &label, 11, Anchor::End, -45);
        }

        doc.text(
            doc.width() / 2.0,
            doc.height() - 12.0,
            "Experiment ID (date)",
            13,
            Anchor::Middle,
        );
        doc.text_rotated(22.0, area.top + area.height() / 2.0, "Rating", 13, Anchor::Middle, -90);

        // Legend
        let legend_x = area.right - 190.0;
        doc.line(legend_x, area.top - 18.0, legend_x + 24.0, area.top - 18.0, LINE_COLOR, 2.0);
        doc.text(legend_x + 30.0, area.top - 14.0, "Rating", 11, Anchor::Start);
        doc.line(
            legend_x + 80.0,
            area.top - 18.0,
            legend_x + 104.0,
            area.top - 18.0,
            SUCCESS_COLOR,
            1.5,
        );
        doc.text(legend_x + 110.0, area.top - 14.0, "Success rate", 11, Anchor::Start);

        Ok(doc.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::tests::sample_stats;

    #[test]
    fn test_timeline_has_point_per_dated_experiment() {
        let svg = TimelineChart
            .render(&sample_stats(), &ChartsConfig::default())
            .unwrap();

        assert_eq!(svg.matches("<circle").count(), 4);
        assert!(svg.contains("001 (01/01)"));
        assert!(svg.contains("Exceeded"));
        assert!(svg.contains("Unknown"));
    }

    #[test]
    fn test_timeline_without_dates() {
        let mut stats = sample_stats();
        stats.timeline.clear();
        assert!(matches!(
            TimelineChart.render(&stats, &ChartsConfig::default()),
            Err(ChartError::NoData("timeline"))
        ));
    }
}
