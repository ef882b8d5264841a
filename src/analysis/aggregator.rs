//! Record aggregation and statistics.
//!
//! This module computes the aggregate statistics over parsed experiment
//! records. Missing values land in explicit unknown buckets so every
//! view accounts for every record.

use crate::models::{
    percentage, ExperimentRecord, ModelStats, RatingCounts, Stats, TagStats, TimelinePoint,
    UNKNOWN_LABEL,
};
use std::collections::HashMap;

/// Compute all statistics for the given records.
pub fn compute_stats(records: &[ExperimentRecord]) -> Stats {
    let mut ratings = RatingCounts::default();
    for record in records {
        ratings.add(record.rating);
    }

    let timeline = build_timeline(records);
    let first_date = timeline.first().map(|p| p.date);
    let last_date = timeline.last().map(|p| p.date);

    Stats {
        total: records.len(),
        ratings,
        models: model_stats(records),
        tags: tag_stats(records),
        untagged: records.iter().filter(|r| r.tags.is_empty()).count(),
        recorders: recorder_counts(records),
        undated: records.len() - timeline.len(),
        timeline,
        first_date,
        last_date,
    }
}

/// Per-model statistics, most used first, ties by name.
pub fn model_stats(records: &[ExperimentRecord]) -> Vec<ModelStats> {
    let mut grouped: HashMap<&str, RatingCounts> = HashMap::new();

    for record in records {
        grouped
            .entry(record.model_or_unknown())
            .or_default()
            .add(record.rating);
    }

    let mut models: Vec<ModelStats> = grouped
        .into_iter()
        .map(|(model, ratings)| ModelStats {
            model: model.to_string(),
            ratings,
        })
        .collect();

    models.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.model.cmp(&b.model)));
    models
}

/// Tag frequencies, most frequent first, ties by tag.
pub fn tag_stats(records: &[ExperimentRecord]) -> Vec<TagStats> {
    let mut grouped: HashMap<&str, Vec<String>> = HashMap::new();

    for record in records {
        for tag in &record.tags {
            grouped
                .entry(tag.as_str())
                .or_default()
                .push(record.id.clone());
        }
    }

    let mut tags: Vec<TagStats> = grouped
        .into_iter()
        .map(|(tag, experiments)| TagStats {
            tag: tag.to_string(),
            count: experiments.len(),
            experiments,
        })
        .collect();

    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags
}

/// Experiments per recorder, most active first.
pub fn recorder_counts(records: &[ExperimentRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let recorder = record.recorder.as_deref().unwrap_or(UNKNOWN_LABEL);
        *counts.entry(recorder).or_default() += 1;
    }

    let mut recorders: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();

    recorders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    recorders
}

/// Dated records in chronological order with the running success rate.
///
/// Records without a parsed date are left out.
pub fn build_timeline(records: &[ExperimentRecord]) -> Vec<TimelinePoint> {
    let mut dated: Vec<&ExperimentRecord> = records.iter().filter(|r| r.date.is_some()).collect();
    dated.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut successes = 0;
    dated
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if record.is_success() {
                successes += 1;
            }
            Some(TimelinePoint {
                date: record.date?,
                id: record.id.clone(),
                rating: record.rating,
                cumulative_success_rate: percentage(successes, i + 1),
            })
        })
        .collect()
}

/// Get the `n` most used models.
pub fn top_models(stats: &Stats, n: usize) -> Vec<&ModelStats> {
    stats.models.iter().take(n).collect()
}

/// Get the `n` most frequent tags.
pub fn top_tags(stats: &Stats, n: usize) -> Vec<&TagStats> {
    stats.tags.iter().take(n).collect()
}
