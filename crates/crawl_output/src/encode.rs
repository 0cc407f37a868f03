use std::borrow::Cow;
use std::fmt::Write;

use crawl_model::{CrawlResult, Field};
use thiserror::Error;

use crate::color::Colorizer;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("could not encode result as json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON object per event.
    Json,
    /// One human-readable, optionally colored line per event.
    Text,
}

/// Turns a [`CrawlResult`] into the bytes of one output line (without the
/// trailing newline). An empty encoding means the event is suppressed.
#[derive(Debug, Clone)]
pub struct Encoder {
    mode: OutputMode,
    colors: Colorizer,
    verbose: bool,
    fields: Vec<Field>,
}

impl Encoder {
    /// `fields` restricts the output to those fields; empty means the default set.
    pub fn new(mode: OutputMode, colors: bool, verbose: bool, fields: Vec<Field>) -> Self {
        Self {
            mode,
            colors: Colorizer::new(colors),
            verbose,
            fields,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn encode(&self, result: &CrawlResult) -> Result<Vec<u8>, EncodeError> {
        match self.mode {
            OutputMode::Json => self.encode_json(result),
            OutputMode::Text => Ok(self.encode_text(result).into_bytes()),
        }
    }

    fn encode_json(&self, result: &CrawlResult) -> Result<Vec<u8>, EncodeError> {
        let projected;
        let result = if self.fields.is_empty() {
            result
        } else {
            projected = result.project(&self.fields);
            &projected
        };
        // Every serialized key is a non-default field, so an empty result is `{}`.
        if result.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::to_vec(result)?)
    }

    fn encode_text(&self, result: &CrawlResult) -> String {
        if self.fields.is_empty() {
            self.default_line(result)
        } else {
            self.selected_line(result)
        }
    }

    fn selected_line(&self, result: &CrawlResult) -> String {
        self.fields
            .iter()
            .filter_map(|&field| self.painted(result, field))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // [timestamp] [source:tag:attribute] [METHOD] url body
    fn default_line(&self, result: &CrawlResult) -> String {
        let mut parts = Vec::new();

        if self.verbose {
            if let Some(ts) = self.painted(result, Field::Timestamp) {
                parts.push(format!("[{ts}]"));
            }
        }

        let origin: Vec<String> = [Field::Source, Field::Tag, Field::Attribute]
            .into_iter()
            .filter_map(|field| self.painted(result, field))
            .collect();
        if !origin.is_empty() {
            parts.push(format!("[{}]", origin.join(":")));
        }

        if let Some(method) = self.painted(result, Field::Method) {
            parts.push(format!("[{method}]"));
        }
        if let Some(url) = self.painted(result, Field::Url) {
            parts.push(url);
        }
        if self.verbose {
            if let Some(body) = self.painted(result, Field::Body) {
                parts.push(body);
            }
        }

        parts.join(" ")
    }

    fn painted(&self, result: &CrawlResult, field: Field) -> Option<String> {
        let value = result.field_value(field);
        if value.is_empty() {
            return None;
        }
        let value = escape_value(&value);
        let painted = match field {
            Field::Source => self.colors.blue(&value),
            Field::Tag => self.colors.bright_yellow(&value),
            Field::Attribute => self.colors.green(&value),
            Field::Method => self.colors.magenta(&value),
            Field::Timestamp => self.colors.cyan(&value),
            Field::Url | Field::Body => value.into_owned(),
        };
        Some(painted)
    }
}

/// Escape control characters in a crawled value.
///
/// Line breaks become `\r`/`\n` so a value never spans lines; every other
/// control character except tab (ESC included) becomes `\xNN`, so only the
/// encoder's own color codes ever reach the terminal.
pub(crate) fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.chars().any(needs_escape) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            c if needs_escape(c) => {
                let _ = write!(escaped, "\\x{:02x}", u32::from(c));
            }
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn needs_escape(c: char) -> bool {
    c.is_control() && c != '\t'
}
