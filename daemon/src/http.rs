//! Hand-rolled HTTP/1.1 subset: request decoding and response encoding
//!
//! Decoding is best-effort and never fails: malformed input degrades to
//! default fields instead of raising an error. The decoder performs one
//! bounded read, plus exactly one follow-up read when a body-bearing request
//! arrives with its headers and body split across transport writes. No
//! timeout is applied to that follow-up read.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error};

/// Ceiling for a single incoming request (2 KiB).
pub const MAX_REQUEST_SIZE: usize = 2048;

/// Ceiling for an outgoing response (2 MiB).
pub const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024;

/// Bytes reserved for the status line and headers within the response
/// ceiling.
const HEADER_RESERVE: usize = 256;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Request method token. Matching is exact; anything unrecognized is carried
/// as `Other` and later handled as a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            other => Method::Other(other.to_string()),
        }
    }

    /// Whether a request body is expected (and extracted) for this method.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// One decoded request; lives for the duration of a single connection.
#[derive(Debug, PartialEq, Eq)]
pub struct RawRequest {
    pub method: Method,
    pub path: String,
    pub body: String,
    /// Parsed but never validated.
    pub authorization: Option<String>,
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            method: Method::Get,
            path: String::new(),
            body: String::new(),
            authorization: None,
        }
    }
}

/// Decode a request from raw received bytes.
///
/// Zero bytes received is the degenerate default request (`GET`, empty path,
/// empty body), not an error.
pub async fn decode_request<S>(stream: &mut S) -> RawRequest
where
    S: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; MAX_REQUEST_SIZE];
    let received = match stream.read(&mut buffer).await {
        Ok(n) => n,
        Err(e) => {
            debug!("request read failed: {}", e);
            0
        }
    };
    if received == 0 {
        return RawRequest::default();
    }

    let mut request = RawRequest::default();
    let head = String::from_utf8_lossy(&buffer[..received]).into_owned();
    let mut tokens = head.split_whitespace();
    if let Some(token) = tokens.next() {
        request.method = Method::parse(token);
    }
    if let Some(path) = tokens.next() {
        request.path = path.to_string();
    }
    debug!(?request.method, path = %request.path, "request line decoded");

    request.authorization = extract_authorization(&head);
    if request.authorization.is_some() {
        debug!("authorization header present");
    }

    if !request.method.has_body() {
        return request;
    }

    let mut filled = received;
    let mut body_start = find_body(&buffer[..filled]);

    // Some clients send headers and body as separate writes; when the
    // header block ends the buffer, try exactly one more read.
    if body_start == Some(filled) && filled < buffer.len() {
        match stream.read(&mut buffer[filled..]).await {
            Ok(n) => {
                filled += n;
                body_start = find_body(&buffer[..filled]);
            }
            Err(e) => debug!("follow-up body read failed: {}", e),
        }
    }

    if let Some(start) = body_start {
        request.body = String::from_utf8_lossy(&buffer[start..filled]).into_owned();
    }

    request
}

fn find_body(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|i| i + HEADER_TERMINATOR.len())
}

fn extract_authorization(head: &str) -> Option<String> {
    head.lines()
        .find_map(|line| line.strip_prefix("Authorization:"))
        .map(|value| value.trim().to_string())
}

/// Encode a complete response: status line, content headers, blank line,
/// body. An empty content type defaults to `text/plain`. Messages exceeding
/// the output ceiling produce a bare 500 response with no body.
pub fn encode_response(message: &str, content_type: &str) -> Vec<u8> {
    let content_type = if content_type.is_empty() {
        "text/plain"
    } else {
        content_type
    };

    if message.len() > MAX_RESPONSE_SIZE - HEADER_RESERVE {
        error!(
            "response body of {} bytes exceeds the {} byte ceiling",
            message.len(),
            MAX_RESPONSE_SIZE
        );
        return b"HTTP/1.1 500 Internal Server Error\r\n\r\n".to_vec();
    }

    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
        content_type,
        message.len(),
        message
    )
    .into_bytes()
}
