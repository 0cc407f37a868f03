use crawl_model::RawResponse;

/// Read a reqwest response fully into an archivable [`RawResponse`].
///
/// The recorded URL is the final one after redirects.
pub async fn capture_response(response: reqwest::Response) -> Result<RawResponse, reqwest::Error> {
    let request_url = response.url().to_string();
    let version = format!("{:?}", response.version());
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.bytes().await?.to_vec();

    Ok(RawResponse {
        request_url,
        version,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
    })
}
