use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::Field;

/// One discovered endpoint event produced by the crawl pipeline.
///
/// Every attribute is optional. Unset attributes (empty strings, no
/// timestamp) are left out of the serialized form entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "endpoint", skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attribute: String,
}

impl CrawlResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Current value of `field`, or an empty string when unset.
    pub fn field_value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Timestamp => match self.timestamp {
                Some(ts) => Cow::Owned(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
                None => Cow::Borrowed(""),
            },
            Field::Method => Cow::Borrowed(&self.method),
            Field::Body => Cow::Borrowed(&self.body),
            Field::Url => Cow::Borrowed(&self.url),
            Field::Source => Cow::Borrowed(&self.source),
            Field::Tag => Cow::Borrowed(&self.tag),
            Field::Attribute => Cow::Borrowed(&self.attribute),
        }
    }

    /// Copy of this result keeping only `fields`; everything else is reset.
    pub fn project(&self, fields: &[Field]) -> CrawlResult {
        let keep = |field: Field| fields.contains(&field);
        CrawlResult {
            timestamp: self.timestamp.filter(|_| keep(Field::Timestamp)),
            method: keep_string(&self.method, keep(Field::Method)),
            body: keep_string(&self.body, keep(Field::Body)),
            url: keep_string(&self.url, keep(Field::Url)),
            source: keep_string(&self.source, keep(Field::Source)),
            tag: keep_string(&self.tag, keep(Field::Tag)),
            attribute: keep_string(&self.attribute, keep(Field::Attribute)),
        }
    }

    /// True when every attribute is at its default value.
    pub fn is_empty(&self) -> bool {
        self == &CrawlResult::default()
    }
}

fn keep_string(value: &str, keep: bool) -> String {
    if keep {
        value.to_string()
    } else {
        String::new()
    }
}
