//! Fragment fetching: trait contract, plain HTTP/1.1 client, and fixtures.

use br_core::PageError;
use br_core::PageResult;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;
use tracing::debug;
use url::Url;

const FETCH_USER_AGENT: &str = "brioche-pages/0.1";
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Response to one fragment fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of fragment markup.
///
/// Errors cover transport failures only; a non-2xx status is a value, not an
/// error, so callers can distinguish "unreachable" from "not here".
pub trait FragmentFetcher {
    fn fetch(&mut self, url: &Url) -> PageResult<FetchResponse>;
}

/// Plain HTTP/1.1 GET client with no-cache request semantics.
///
/// Speaks `http` only; embedders that terminate TLS provide their own
/// `FragmentFetcher`. Responses are read to connection close, honoring
/// `Content-Length` when present, with gzip `Content-Encoding` decoded.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentFetcher for HttpFetcher {
    fn fetch(&mut self, url: &Url) -> PageResult<FetchResponse> {
        if url.scheme() != "http" {
            return Err(PageError::new(
                "fetch.scheme_unsupported",
                format!("cannot fetch `{url}`: only http is carried by HttpFetcher"),
            ));
        }

        let host = url.host_str().ok_or_else(|| {
            PageError::new("fetch.host_missing", format!("no host in `{url}`"))
        })?;
        let port = url.port_or_known_default().unwrap_or(80);

        let address = (host, port)
            .to_socket_addrs()
            .map_err(|error| {
                PageError::new(
                    "fetch.resolve_failed",
                    format!("resolving {host}:{port} failed: {error}"),
                )
            })?
            .next()
            .ok_or_else(|| {
                PageError::new(
                    "fetch.resolve_failed",
                    format!("{host}:{port} resolved to no addresses"),
                )
            })?;

        debug!(target: "br_fetch", %url, "fragment fetch attempt");

        let mut stream =
            TcpStream::connect_timeout(&address, self.connect_timeout).map_err(|error| {
                PageError::new(
                    "fetch.connect_failed",
                    format!("connect to {address} failed: {error}"),
                )
            })?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(|error| {
                PageError::new("fetch.socket_config", format!("read timeout: {error}"))
            })?;

        let request = build_get_request(url, host);
        stream.write_all(request.as_bytes()).map_err(|error| {
            PageError::new("fetch.write_failed", format!("request write failed: {error}"))
        })?;

        let mut raw = Vec::new();
        stream
            .take(MAX_RESPONSE_BYTES as u64)
            .read_to_end(&mut raw)
            .map_err(|error| {
                PageError::new("fetch.read_failed", format!("response read failed: {error}"))
            })?;

        parse_response(&raw)
    }
}

fn build_get_request(url: &Url, host: &str) -> String {
    let mut target = url.path().to_owned();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    format!(
        "GET {target} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: {FETCH_USER_AGENT}\r\n\
         Accept: text/html,*/*;q=0.8\r\n\
         Accept-Encoding: gzip\r\n\
         Cache-Control: no-cache\r\n\
         Pragma: no-cache\r\n\
         Connection: close\r\n\
         \r\n"
    )
}

fn parse_response(raw: &[u8]) -> PageResult<FetchResponse> {
    let head_end = find_subslice(raw, b"\r\n\r\n").ok_or_else(|| {
        PageError::new("fetch.malformed_response", "missing header terminator")
    })?;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or("");
    let status = parse_status_line(status_line)?;

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_owned()));
        }
    }

    let body_start = head_end.saturating_add(4);
    let mut body = raw.get(body_start..).unwrap_or(&[]).to_vec();

    if header_value(&headers, "transfer-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("chunked"))
    {
        body = decode_chunked(&body)?;
    } else if let Some(length) = header_value(&headers, "content-length")
        .and_then(|value| value.parse::<usize>().ok())
    {
        body.truncate(length);
    }

    if header_value(&headers, "content-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("gzip"))
    {
        let mut decoded = Vec::new();
        GzDecoder::new(body.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|error| {
                PageError::new("fetch.gzip_failed", format!("gzip decode failed: {error}"))
            })?;
        body = decoded;
    }

    Ok(FetchResponse {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn parse_status_line(line: &str) -> PageResult<u16> {
    let mut parts = line.split_ascii_whitespace();
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        return Err(PageError::new(
            "fetch.malformed_response",
            format!("bad status line `{line}`"),
        ));
    }

    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            PageError::new(
                "fetch.malformed_response",
                format!("unparseable status in `{line}`"),
            )
        })
}

fn decode_chunked(body: &[u8]) -> PageResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut idx = 0_usize;

    loop {
        let line_end = find_subslice(body.get(idx..).unwrap_or(&[]), b"\r\n")
            .map(|offset| idx + offset)
            .ok_or_else(|| {
                PageError::new("fetch.malformed_response", "truncated chunk size line")
            })?;
        let size_text = String::from_utf8_lossy(&body[idx..line_end]);
        let size_field = size_text.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_field, 16).map_err(|_| {
            PageError::new(
                "fetch.malformed_response",
                format!("bad chunk size `{size_field}`"),
            )
        })?;

        if size == 0 {
            return Ok(out);
        }

        let data_start = line_end.saturating_add(2);
        let data_end = data_start.saturating_add(size);
        let chunk = body.get(data_start..data_end).ok_or_else(|| {
            PageError::new("fetch.malformed_response", "truncated chunk data")
        })?;
        out.extend_from_slice(chunk);
        idx = data_end.saturating_add(2);
    }
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn find_subslice(bytes: &[u8], needle: &[u8]) -> Option<usize> {
    bytes
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Embedder/test fetcher serving canned responses by URL path.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    routes: HashMap<String, FetchResponse>,
    requested: Vec<String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, status: u16, body: &str) {
        self.routes
            .insert(path.to_owned(), FetchResponse::new(status, body));
    }

    /// Paths requested so far, in order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl FragmentFetcher for FixtureFetcher {
    fn fetch(&mut self, url: &Url) -> PageResult<FetchResponse> {
        self.requested.push(url.path().to_owned());
        match self.routes.get(url.path()) {
            Some(response) => Ok(response.clone()),
            None => Ok(FetchResponse::new(404, "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FetchResponse;
    use super::FixtureFetcher;
    use super::FragmentFetcher;
    use super::build_get_request;
    use super::decode_chunked;
    use super::parse_response;
    use url::Url;

    fn page_url(path: &str) -> Url {
        let mut url = Url::parse("http://bakery.test/").unwrap_or_else(|_| unreachable!());
        url.set_path(path);
        url
    }

    #[test]
    fn request_carries_no_cache_headers() {
        let url = page_url("/assets/includes/header.html");
        let request = build_get_request(&url, "bakery.test");
        assert!(request.starts_with("GET /assets/includes/header.html HTTP/1.1\r\n"));
        assert!(request.contains("Cache-Control: no-cache\r\n"));
        assert!(request.contains("Pragma: no-cache\r\n"));
        assert!(request.contains("Connection: close\r\n"));
    }

    #[test]
    fn parses_content_length_delimited_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhellotrailing-garbage";
        let response = parse_response(raw);
        assert_eq!(response, Ok(FetchResponse::new(200, "hello")));
    }

    #[test]
    fn non_success_status_is_a_value_not_an_error() {
        let raw = b"HTTP/1.1 404 Not Found\r\n\r\n";
        let response = parse_response(raw);
        assert!(response.as_ref().is_ok_and(|response| !response.ok()));
        assert_eq!(response.map(|response| response.status), Ok(404));
    }

    #[test]
    fn chunked_bodies_reassemble() {
        let body = b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        let decoded = decode_chunked(body);
        assert_eq!(decoded, Ok(b"hello world".to_vec()));
    }

    #[test]
    fn malformed_head_is_a_typed_error() {
        let raw = b"not-http at all";
        let response = parse_response(raw);
        assert_eq!(
            response.map_err(|error| error.code),
            Err("fetch.malformed_response")
        );
    }

    #[test]
    fn fixture_fetcher_records_attempt_order() {
        let mut fetcher = FixtureFetcher::new();
        fetcher.insert("/b.html", 200, "B");

        let miss = fetcher.fetch(&page_url("/a.html"));
        assert!(miss.is_ok_and(|response| response.status == 404));
        let hit = fetcher.fetch(&page_url("/b.html"));
        assert_eq!(hit.map(|response| response.body), Ok("B".to_owned()));
        assert_eq!(fetcher.requested(), ["/a.html", "/b.html"]);
    }
}
