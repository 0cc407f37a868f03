use crawl_model::{CrawlResult, RawResponse};
use pretty_assertions::assert_eq;

#[test]
fn default_result_serializes_to_empty_object() {
    let json = serde_json::to_string(&CrawlResult::default()).unwrap();
    assert_eq!(json, "{}");
}

#[test]
fn unset_fields_are_omitted_and_url_is_endpoint() {
    let result = CrawlResult {
        method: "GET".into(),
        url: "http://x/a".into(),
        ..CrawlResult::default()
    };
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"{"method":"GET","endpoint":"http://x/a"}"#);
}

#[test]
fn partial_json_deserializes_with_defaults() {
    let result: CrawlResult =
        serde_json::from_str(r#"{"endpoint":"http://x/b","tag":"form"}"#).unwrap();
    assert_eq!(result.url, "http://x/b");
    assert_eq!(result.tag, "form");
    assert!(result.method.is_empty());
    assert!(result.timestamp.is_none());
}

#[test]
fn response_dump_has_head_then_body() {
    let mut response = RawResponse::new("http://x/a", 404);
    response.reason = "Not Found".into();
    response.headers = vec![("Content-Type".into(), "text/plain".into())];
    response.body = b"missing".to_vec();

    let dump = String::from_utf8(response.dump()).unwrap();
    assert_eq!(
        dump,
        "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nmissing"
    );
}

#[test]
fn status_text_without_reason() {
    let response = RawResponse::new("http://x/a", 599);
    assert_eq!(response.status_text(), "599");
    assert_eq!(response.status_line(), "HTTP/1.1 599");
}
