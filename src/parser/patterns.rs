//! Field marker patterns of the experiment page template.
//!
//! Every pattern the parser uses is built here from the configured
//! marker labels, so a template change is a single-point update.

use crate::config::FieldsConfig;
use regex::Regex;

/// Colon accepted after a marker label (half- or full-width).
const COLON: &str = "[:：]";

/// Compiled patterns for one set of marker labels.
#[derive(Debug, Clone)]
pub struct FieldPatterns {
    /// `# 実験 <ID>: title`
    pub title: Regex,
    /// `- 日付: <value>`
    pub date: Regex,
    /// `日付: <value>` anywhere in the page
    pub date_loose: Regex,
    /// `- 記録者: <value>`
    pub recorder: Regex,
    /// `- モデル: <value>`
    pub model: Regex,
    /// `モデル: <value>` anywhere in the page
    pub model_loose: Regex,
    /// `- 対象: <value>`
    pub target: Regex,
    /// `**評価: <symbol>**`
    pub rating: Regex,
    /// `評価: <symbol>` anywhere in the page
    pub rating_loose: Regex,
    /// `**タグ:** ...` line
    pub tags_line: Regex,
    /// `` `tag` `` or `` \`tag\` `` inside the tag line
    pub tag_item: Regex,
}

impl FieldPatterns {
    /// Compile the patterns for the given labels.
    pub fn new(fields: &FieldsConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            title: Regex::new(&format!(
                r"(?m)^#[ \t]*{}[ \t]+(.+?)[ \t]*{}",
                regex::escape(&fields.title),
                COLON
            ))?,
            date: bullet_field(&fields.date)?,
            date_loose: loose_field(&fields.date)?,
            recorder: bullet_field(&fields.recorder)?,
            model: bullet_field(&fields.model)?,
            model_loose: loose_field(&fields.model)?,
            target: bullet_field(&fields.target)?,
            rating: Regex::new(&format!(
                r"\*\*[ \t]*{}[ \t]*{}[ \t]*([^*\r\n]+?)[ \t]*\*\*",
                regex::escape(&fields.rating),
                COLON
            ))?,
            rating_loose: Regex::new(&format!(
                r"{}[ \t]*{}[ \t]*(?:\*\*)?[ \t]*([◎○〇△❌])",
                regex::escape(&fields.rating),
                COLON
            ))?,
            tags_line: Regex::new(&format!(
                r"\*\*[ \t]*{}[ \t]*{}?[ \t]*\*\*[^\r\n]*",
                regex::escape(&fields.tags),
                COLON
            ))?,
            tag_item: Regex::new(r"\\?`([^`\\]+)\\?`")?,
        })
    }

    /// Returns the first capture of `pattern` in `text`, trimmed and non-empty.
    pub fn capture(pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_value(m.as_str()))
            .filter(|v| !v.is_empty())
    }

    /// Tags on the tag line, in order, without duplicates.
    pub fn tags(&self, text: &str) -> Vec<String> {
        let Some(line) = self.tags_line.find(text) else {
            return Vec::new();
        };

        let mut tags: Vec<String> = Vec::new();
        for caps in self.tag_item.captures_iter(line.as_str()) {
            let tag = caps[1].trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

fn bullet_field(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?m)^[ \t]*[-*][ \t]*{}[ \t]*{}[ \t]*(.+?)[ \t]*\r?$",
        regex::escape(label),
        COLON
    ))
}

fn loose_field(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"{}[ \t]*{}[ \t]*([^\r\n]+)",
        regex::escape(label),
        COLON
    ))
}

/// Strip surrounding whitespace and bold markers from a field value.
fn clean_value(value: &str) -> String {
    value.trim().trim_matches('*').trim().to_string()
}
