/// A raw HTTP response together with the URL that was requested.
///
/// `dump` renders the archived form: status line, headers, a blank line,
/// then the body bytes untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub request_url: String,
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(request_url: impl Into<String>, status: u16) -> Self {
        Self {
            request_url: request_url.into(),
            version: "HTTP/1.1".to_string(),
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// `200 OK`, or just `200` when no reason phrase is known.
    pub fn status_text(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }

    pub fn status_line(&self) -> String {
        format!("{} {}", self.version, self.status_text())
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut head = self.status_line();
        head.push_str("\r\n");
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}
