use std::fs;
use std::path::Path;
use std::thread;

use crawl_output::{
    response_filename, ArchiveError, IndexEntry, RawResponse, ResponseArchiver, INDEX_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;

fn ok_response(url: &str, body: &str) -> RawResponse {
    let mut response = RawResponse::new(url, 200);
    response.reason = "OK".into();
    response.headers = vec![("Content-Type".into(), "text/html".into())];
    response.body = body.as_bytes().to_vec();
    response
}

fn index_lines(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(INDEX_FILENAME))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn archives_response_and_indexes_it() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    let archiver = ResponseArchiver::new(&dir).unwrap();

    let path = archiver.archive(&ok_response("http://x/a", "<a>")).unwrap();

    assert_eq!(path.parent().unwrap(), dir.as_path());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<a>"
    );

    let lines = index_lines(&dir);
    assert_eq!(lines.len(), 1);
    let entry = IndexEntry::parse(&lines[0]).unwrap();
    assert_eq!(entry.url, "http://x/a");
    assert_eq!(entry.status, "200 OK");
    assert_eq!(entry.filename, path.file_name().unwrap().to_string_lossy());
}

#[test]
fn filename_is_stable_across_runs() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");

    let first = ResponseArchiver::new(&dir)
        .unwrap()
        .archive(&ok_response("http://x/a", "one"))
        .unwrap();
    let second = ResponseArchiver::new(&dir)
        .unwrap()
        .archive(&ok_response("http://x/a", "two"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.file_name().unwrap().to_string_lossy(),
        response_filename(&Url::parse("http://x/a").unwrap())
    );
    assert!(first.file_name().unwrap().to_string_lossy().starts_with("x--"));
}

#[test]
fn different_urls_get_different_files() {
    let a = response_filename(&Url::parse("http://x/a").unwrap());
    let b = response_filename(&Url::parse("http://x/b").unwrap());
    assert_ne!(a, b);

    let with_port = response_filename(&Url::parse("http://localhost:8080/").unwrap());
    assert!(with_port.starts_with("localhost_8080--"));
}

#[test]
fn construction_wipes_previous_run() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("stale.txt"), "old").unwrap();
    fs::write(dir.join(INDEX_FILENAME), "stale.txt http://old/ (200 OK)\n").unwrap();

    let _archiver = ResponseArchiver::new(&dir).unwrap();

    assert!(!dir.join("stale.txt").exists());
    assert!(index_lines(&dir).is_empty());
}

#[test]
fn unsafe_directory_is_refused() {
    let err = ResponseArchiver::new("").unwrap_err();
    assert!(matches!(err, ArchiveError::UnsafeDirectory(_)));
}

#[test]
fn bad_url_fails_only_that_response() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    let archiver = ResponseArchiver::new(&dir).unwrap();

    let missing = archiver.archive(&ok_response("", "x")).unwrap_err();
    assert!(matches!(missing, ArchiveError::MissingUrl));
    let invalid = archiver.archive(&ok_response("not a url", "x")).unwrap_err();
    assert!(matches!(invalid, ArchiveError::InvalidUrl { .. }));

    archiver.archive(&ok_response("http://x/ok", "x")).unwrap();
    assert_eq!(index_lines(&dir).len(), 1);
}

#[test]
fn closed_index_reports_archive_error() {
    let temp = TempDir::new().unwrap();
    let archiver = ResponseArchiver::new(temp.path().join("responses")).unwrap();
    archiver.close().unwrap();

    let err = archiver.archive(&ok_response("http://x/a", "x")).unwrap_err();
    assert!(matches!(err, ArchiveError::Index(_)));

    let names: Vec<String> = fs::read_dir(archiver.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![INDEX_FILENAME.to_string()]);
}

#[test]
fn concurrent_archival_of_one_url_keeps_a_whole_response() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    let archiver = ResponseArchiver::new(&dir).unwrap();

    let long = ok_response("http://x/same", &"LONG".repeat(4096));
    let short = ok_response("http://x/same", "S");
    let dumps = [long.dump(), short.dump()];

    thread::scope(|scope| {
        for worker in 0..8 {
            let archiver = &archiver;
            let response = if worker % 2 == 0 { &long } else { &short };
            scope.spawn(move || {
                for _ in 0..25 {
                    archiver.archive(response).unwrap();
                }
            });
        }
    });

    let lines = index_lines(&dir);
    assert_eq!(lines.len(), 200);
    let entry = IndexEntry::parse(&lines[0]).unwrap();
    let stored = fs::read(dir.join(&entry.filename)).unwrap();
    assert!(
        dumps.contains(&stored),
        "archived file matches neither response ({} bytes)",
        stored.len()
    );
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
}

#[test]
fn concurrent_archival_keeps_index_lines_whole() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("responses");
    let archiver = ResponseArchiver::new(&dir).unwrap();

    thread::scope(|scope| {
        for worker in 0..16 {
            let archiver = &archiver;
            scope.spawn(move || {
                for n in 0..10 {
                    let url = format!("http://x/{worker}/{n}");
                    archiver.archive(&ok_response(&url, "body")).unwrap();
                }
            });
        }
    });

    let lines = index_lines(&dir);
    assert_eq!(lines.len(), 160);
    for line in &lines {
        let entry = IndexEntry::parse(line).expect("well-formed index line");
        assert!(dir.join(&entry.filename).is_file());
        assert_eq!(entry.status, "200 OK");
    }
}

#[test]
fn index_entry_round_trips_through_line() {
    let entry = IndexEntry {
        filename: "x--0011223344556677.txt".into(),
        url: "http://x/a?q=(1)".into(),
        status: "404 Not Found".into(),
    };
    assert_eq!(IndexEntry::parse(&entry.to_line()), Some(entry));
    assert_eq!(IndexEntry::parse("garbage"), None);
}
