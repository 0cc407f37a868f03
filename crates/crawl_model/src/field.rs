use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field name: {name}")]
    Unknown { name: String },
}

/// One attribute of a [`CrawlResult`](crate::CrawlResult), addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Method,
    Body,
    Url,
    Source,
    Tag,
    Attribute,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Timestamp,
        Field::Method,
        Field::Body,
        Field::Url,
        Field::Source,
        Field::Tag,
        Field::Attribute,
    ];

    /// Canonical, case-sensitive name accepted by [`validate_field_names`].
    pub fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "Timestamp",
            Field::Method => "Method",
            Field::Body => "Body",
            Field::Url => "URL",
            Field::Source => "Source",
            Field::Tag => "Tag",
            Field::Attribute => "Attribute",
        }
    }

    /// Lower-case stem used for per-field store files.
    pub fn file_stem(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Method => "method",
            Field::Body => "body",
            Field::Url => "url",
            Field::Source => "source",
            Field::Tag => "tag",
            Field::Attribute => "attribute",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| FieldError::Unknown {
                name: s.to_string(),
            })
    }
}

/// Parse a comma and/or whitespace delimited list of field names.
///
/// Empty segments are ignored and repeated names keep their first position.
/// Fails on the first name that is not a known field.
pub fn validate_field_names(list: &str) -> Result<Vec<Field>, FieldError> {
    let mut fields = Vec::new();
    for name in list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
    {
        let field: Field = name.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}
