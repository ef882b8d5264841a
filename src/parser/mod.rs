//! Experiment page parsing.
//!
//! Turns the content of one wiki page into an [`ExperimentRecord`].
//! Parsing is best-effort: a missing or malformed field is left empty
//! and never fails the page. Only the rating is strictly validated,
//! and an unrecognized symbol degrades to "unknown".

pub mod patterns;

pub use patterns::FieldPatterns;

use crate::config::FieldsConfig;
use crate::models::{ExperimentRecord, Rating};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Date formats accepted in the date field.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Reasons a page is not an experiment record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("page is empty")]
    Empty,
    #[error("page is an unfilled template")]
    Template,
}

/// Parser for experiment pages.
#[derive(Debug, Clone)]
pub struct RecordParser {
    patterns: FieldPatterns,
    fields: FieldsConfig,
}

impl RecordParser {
    /// Create a parser for the given marker labels.
    pub fn new(fields: &FieldsConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: FieldPatterns::new(fields)?,
            fields: fields.clone(),
        })
    }

    /// Parse one page.
    ///
    /// `stem` is the file stem, used as the record ID unless the page
    /// title carries a real ID.
    pub fn parse(
        &self,
        stem: &str,
        source: &Path,
        content: &str,
    ) -> Result<ExperimentRecord, RecordError> {
        if content.trim().is_empty() {
            return Err(RecordError::Empty);
        }

        let p = &self.patterns;
        let mut record = ExperimentRecord::empty(stem);
        record.source = source.to_path_buf();
        record.raw_text = content.to_string();

        let title_id = FieldPatterns::capture(&p.title, content);
        let is_placeholder = title_id.as_deref() == Some(self.fields.placeholder_id.as_str());
        if let Some(id) = title_id.filter(|_| !is_placeholder) {
            record.id = id;
        }

        record.date_text = FieldPatterns::capture(&p.date, content);
        record.model = FieldPatterns::capture(&p.model, content);
        record.recorder = FieldPatterns::capture(&p.recorder, content);
        record.target = FieldPatterns::capture(&p.target, content);
        record.tags = p.tags(content);

        self.apply_fallbacks(&mut record);
        record.rating = self.extract_rating(stem, content);

        record.date = record.date_text.as_deref().and_then(parse_date);
        if record.date.is_none() {
            if let Some(ref text) = record.date_text {
                debug!("{}: unparseable date {:?}", stem, text);
            }
        }

        if is_placeholder
            && record.date.is_none()
            && record.model.is_none()
            && record.rating.is_none()
        {
            return Err(RecordError::Template);
        }

        Ok(record)
    }

    /// Fill fields the template markers missed from looser matches on the raw text.
    fn apply_fallbacks(&self, record: &mut ExperimentRecord) {
        let p = &self.patterns;
        let text = &record.raw_text;

        if record.date_text.is_none() {
            record.date_text = FieldPatterns::capture(&p.date_loose, text);
        }
        if record.model.is_none() {
            record.model = FieldPatterns::capture(&p.model_loose, text);
        }
    }

    /// The bold rating marker wins; an unrecognized symbol there is unknown.
    /// Without the marker a loose `評価: <symbol>` match is tried.
    fn extract_rating(&self, stem: &str, content: &str) -> Option<Rating> {
        let p = &self.patterns;

        match FieldPatterns::capture(&p.rating, content) {
            Some(text) => {
                let rating = parse_rating(&text);
                if rating.is_none() {
                    debug!("{}: unrecognized rating {:?}", stem, text);
                }
                rating
            }
            None => FieldPatterns::capture(&p.rating_loose, content)
                .and_then(|text| parse_rating(&text)),
        }
    }

    /// Serialize the date, model, tags and rating of a record in template
    /// form. Parsing the result yields the same four fields.
    pub fn render_fields(&self, record: &ExperimentRecord) -> String {
        let mut out = String::new();

        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .or_else(|| record.date_text.clone());
        if let Some(date) = date {
            out.push_str(&format!("- {}: {}\n", self.fields.date, date));
        }

        if let Some(ref model) = record.model {
            out.push_str(&format!("- {}: {}\n", self.fields.model, model));
        }

        if let Some(rating) = record.rating {
            out.push_str(&format!("**{}: {}**\n", self.fields.rating, rating.symbol()));
        }

        if !record.tags.is_empty() {
            let tags: Vec<String> = record.tags.iter().map(|t| format!("`{}`", t)).collect();
            out.push_str(&format!("**{}:** {}\n", self.fields.tags, tags.join(" ")));
        }

        out
    }
}

/// Parse a rating field value, accepting a trailing label after the glyph.
fn parse_rating(text: &str) -> Option<Rating> {
    Rating::from_symbol(text).or_else(|| {
        text.split_whitespace()
            .next()
            .and_then(Rating::from_symbol)
    })
}

/// Parse a date field value. Trailing text after the date is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let first = text.split_whitespace().next().unwrap_or(text);

    for candidate in [text, first] {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }
    None
}
