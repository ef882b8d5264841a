//! Data models for the experiment statistics.
//!
//! This module contains the core data structures used throughout
//! the application: the rating scale, parsed experiment records,
//! and the aggregate statistics rendered into reports and charts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Bucket name used for missing or unrecognized values in the report.
pub const UNKNOWN_LABEL: &str = "不明";

/// Outcome rating of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// ❌ - the experiment failed
    Failed,
    /// △ - below expectations
    Below,
    /// ○ - as expected
    AsExpected,
    /// ◎ - exceeded expectations
    Exceeded,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Rating {
    /// All ratings in report order (best first).
    pub const ALL: [Rating; 4] = [
        Rating::Exceeded,
        Rating::AsExpected,
        Rating::Below,
        Rating::Failed,
    ];

    /// Returns the wiki glyph for this rating.
    pub fn symbol(&self) -> &'static str {
        match self {
            Rating::Exceeded => "◎",
            Rating::AsExpected => "○",
            Rating::Below => "△",
            Rating::Failed => "❌",
        }
    }

    /// Returns the wiki label for this rating.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Exceeded => "期待以上",
            Rating::AsExpected => "期待通り",
            Rating::Below => "期待以下",
            Rating::Failed => "失敗",
        }
    }

    /// Short English label used on chart axes.
    pub fn axis_label(&self) -> &'static str {
        match self {
            Rating::Exceeded => "Exceeded",
            Rating::AsExpected => "Met",
            Rating::Below => "Below",
            Rating::Failed => "Failed",
        }
    }

    /// Trend score: 4 for ◎ down to 1 for ❌.
    pub fn score(&self) -> u8 {
        match self {
            Rating::Exceeded => 4,
            Rating::AsExpected => 3,
            Rating::Below => 2,
            Rating::Failed => 1,
        }
    }

    /// Whether this rating counts as a success (○ or better).
    pub fn is_success(&self) -> bool {
        matches!(self, Rating::Exceeded | Rating::AsExpected)
    }

    /// Parse a rating glyph.
    ///
    /// `〇` (U+3007) is accepted as an alias of `○` and a trailing
    /// variation selector is ignored. Anything else yields `None`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim().trim_end_matches('\u{FE0F}') {
            "◎" => Some(Rating::Exceeded),
            "○" | "〇" => Some(Rating::AsExpected),
            "△" => Some(Rating::Below),
            "❌" => Some(Rating::Failed),
            _ => None,
        }
    }
}

/// Trend score for an optional rating (0 when unknown).
pub fn score_of(rating: Option<Rating>) -> u8 {
    rating.map(|r| r.score()).unwrap_or(0)
}

/// One parsed experiment page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Experiment identifier (file stem or title ID).
    pub id: String,
    /// Parsed date, if the date field was present and valid.
    pub date: Option<NaiveDate>,
    /// Raw date text as written on the page.
    pub date_text: Option<String>,
    /// Name of the generative model used.
    pub model: Option<String>,
    /// Tag labels, in page order without duplicates.
    pub tags: Vec<String>,
    /// Outcome rating.
    pub rating: Option<Rating>,
    /// Person who recorded the experiment.
    pub recorder: Option<String>,
    /// Subject of the experiment.
    pub target: Option<String>,
    /// File the record was parsed from.
    pub source: PathBuf,
    /// Original page content.
    #[serde(skip)]
    pub raw_text: String,
}

impl ExperimentRecord {
    /// Creates a record with only an ID and no extracted fields.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: None,
            date_text: None,
            model: None,
            tags: Vec::new(),
            rating: None,
            recorder: None,
            target: None,
            source: PathBuf::new(),
            raw_text: String::new(),
        }
    }

    /// Model name, or the unknown bucket.
    pub fn model_or_unknown(&self) -> &str {
        self.model.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// Whether this record counts as a success.
    pub fn is_success(&self) -> bool {
        self.rating.map(|r| r.is_success()).unwrap_or(false)
    }
}

/// Per-rating counts, including the unknown bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub exceeded: usize,
    pub as_expected: usize,
    pub below: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl RatingCounts {
    /// Count one (possibly unknown) rating.
    pub fn add(&mut self, rating: Option<Rating>) {
        match rating {
            Some(Rating::Exceeded) => self.exceeded += 1,
            Some(Rating::AsExpected) => self.as_expected += 1,
            Some(Rating::Below) => self.below += 1,
            Some(Rating::Failed) => self.failed += 1,
            None => self.unknown += 1,
        }
    }

    /// Count for a known rating.
    pub fn get(&self, rating: Rating) -> usize {
        match rating {
            Rating::Exceeded => self.exceeded,
            Rating::AsExpected => self.as_expected,
            Rating::Below => self.below,
            Rating::Failed => self.failed,
        }
    }

    /// Sum of all buckets.
    pub fn total(&self) -> usize {
        self.exceeded + self.as_expected + self.below + self.failed + self.unknown
    }

    /// Records rated ○ or better.
    pub fn successes(&self) -> usize {
        self.exceeded + self.as_expected
    }

    /// Success rate in percent (0 when empty).
    pub fn success_rate(&self) -> f64 {
        percentage(self.successes(), self.total())
    }
}

/// `part / whole` in percent, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Statistics for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub model: String,
    pub ratings: RatingCounts,
}

impl ModelStats {
    pub fn total(&self) -> usize {
        self.ratings.total()
    }

    pub fn success_rate(&self) -> f64 {
        self.ratings.success_rate()
    }
}

/// Frequency of one tag and the experiments carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    pub tag: String,
    pub count: usize,
    pub experiments: Vec<String>,
}

/// One point of the rating trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub id: String,
    pub rating: Option<Rating>,
    /// Success rate over this and all earlier dated experiments.
    pub cumulative_success_rate: f64,
}

/// Aggregate statistics over all parsed records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of parsed records.
    pub total: usize,
    /// Rating breakdown; sums to `total`.
    pub ratings: RatingCounts,
    /// Per-model statistics, most used first.
    pub models: Vec<ModelStats>,
    /// Tag frequencies, most frequent first.
    pub tags: Vec<TagStats>,
    /// Records without any tag.
    pub untagged: usize,
    /// Experiments per recorder, most active first.
    pub recorders: Vec<(String, usize)>,
    /// Dated experiments in chronological order.
    pub timeline: Vec<TimelinePoint>,
    /// Records whose date is missing or unparseable.
    pub undated: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Stats {
    /// Overall success rate in percent.
    pub fn success_rate(&self) -> f64 {
        self.ratings.success_rate()
    }
}

/// Metadata about a statistics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Wiki directory that was scanned.
    pub wiki_dir: String,
    /// "Last updated" stamp shown in the report.
    pub as_of: Option<NaiveDate>,
    /// Record files that were parsed.
    pub files_parsed: usize,
    /// Record files that could not be read or were not records.
    pub files_skipped: usize,
}

/// The complete statistics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub stats: Stats,
    /// Chart image links (relative to the report) that were rendered.
    pub charts: Vec<ChartLink>,
    /// Parsed records, in file order.
    pub records: Vec<ExperimentRecord>,
}

/// A rendered chart embedded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartLink {
    pub title: String,
    pub href: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_symbols_are_exact() {
        assert_eq!(Rating::Exceeded.symbol(), "\u{25CE}");
        assert_eq!(Rating::AsExpected.symbol(), "\u{25CB}");
        assert_eq!(Rating::Below.symbol(), "\u{25B3}");
        assert_eq!(Rating::Failed.symbol(), "\u{274C}");
    }

    #[test]
    fn test_rating_from_symbol() {
        for rating in Rating::ALL {
            assert_eq!(Rating::from_symbol(rating.symbol()), Some(rating));
        }
        assert_eq!(Rating::from_symbol("〇"), Some(Rating::AsExpected));
        assert_eq!(Rating::from_symbol(" ❌\u{FE0F} "), Some(Rating::Failed));
        assert_eq!(Rating::from_symbol("?"), None);
        assert_eq!(Rating::from_symbol(""), None);
    }

    #[test]
    fn test_rating_ordering_and_score() {
        assert!(Rating::Failed < Rating::Below);
        assert!(Rating::AsExpected < Rating::Exceeded);
        assert_eq!(Rating::Exceeded.score(), 4);
        assert_eq!(score_of(None), 0);
        assert!(Rating::AsExpected.is_success());
        assert!(!Rating::Below.is_success());
    }

    #[test]
    fn test_rating_counts_sum_to_total() {
        let mut counts = RatingCounts::default();
        for rating in [
            Some(Rating::Exceeded),
            Some(Rating::AsExpected),
            Some(Rating::Failed),
            None,
        ] {
            counts.add(rating);
        }

        assert_eq!(counts.total(), 4);
        assert_eq!(counts.successes(), 2);
        assert_eq!(counts.get(Rating::Below), 0);
        assert_eq!(counts.success_rate(), 50.0);
    }

    #[test]
    fn test_percentage_of_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_model_or_unknown() {
        let mut record = ExperimentRecord::empty("001");
        assert_eq!(record.model_or_unknown(), UNKNOWN_LABEL);
        record.model = Some("SDXL".to_string());
        assert_eq!(record.model_or_unknown(), "SDXL");
    }
}
