use crawl_output::{capture_response, IndexEntry, ResponseArchiver, INDEX_FILENAME};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn captures_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-crawl", "yes")
                .set_body_raw("<html>ok</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/doc", server.uri());
    let response = reqwest::get(&url).await.expect("request ok");
    let raw = capture_response(response).await.expect("capture ok");

    assert_eq!(raw.request_url, url);
    assert_eq!(raw.status, 200);
    assert_eq!(raw.reason, "OK");
    assert_eq!(raw.version, "HTTP/1.1");
    assert!(raw
        .headers
        .iter()
        .any(|(name, value)| name == "x-crawl" && value == "yes"));
    assert_eq!(raw.body, b"<html>ok</html>");

    let dump = String::from_utf8(raw.dump()).unwrap();
    assert!(dump.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(dump.ends_with("\r\n\r\n<html>ok</html>"));
}

#[tokio::test]
async fn captured_error_response_is_archivable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let url = format!("{}/gone", server.uri());
    let raw = capture_response(reqwest::get(&url).await.unwrap())
        .await
        .unwrap();

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    let archiver = ResponseArchiver::new(&dir).unwrap();
    let file = archiver.archive(&raw).unwrap();

    assert!(std::fs::read_to_string(file).unwrap().ends_with("nope"));
    let index = std::fs::read_to_string(dir.join(INDEX_FILENAME)).unwrap();
    let entry = IndexEntry::parse(index.lines().next().unwrap()).unwrap();
    assert_eq!(entry.url, url);
    assert_eq!(entry.status, "404 Not Found");
}
