//! Crawl model: pure result, field and response types shared by the output pipeline.
mod field;
mod response;
mod result;

pub use field::{validate_field_names, Field, FieldError};
pub use response::RawResponse;
pub use result::CrawlResult;
