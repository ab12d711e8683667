//! HTTP/1.1 JSON boundary.
//!
//! One tokio task per connection, one request per connection
//! (`Connection: close`). Requests are parsed with `httparse`; routing is a
//! plain function from [`HttpRequest`] to [`HttpResponse`] so it can be tested
//! without sockets.
//!
//! | Method | Path              |
//! |--------|-------------------|
//! | POST   | `/diagnose`       |
//! | POST   | `/feedback/{id}`  |
//! | POST   | `/reports`        |
//! | GET    | `/admin/history`  |
//! | GET    | `/admin/stats`    |
//! | GET    | `/health`         |

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::advisor::Advisor;
use crate::error::{AdvisorError, Result};
use crate::reports::{ProblemReport, ReportStore};
use crate::session::Session;
use crate::symptoms::SymptomVector;

/// Largest request (headers + body) the server will buffer.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

const MAX_HEADERS: usize = 32;

/// Shared state handed to every connection task.
pub struct AppState {
    pub advisor: Advisor,
    pub reports: Arc<dyn ReportStore>,
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: &str, target: &str, body: impl Into<Vec<u8>>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            query: query.to_string(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedbackBody {
    outcome: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportBody {
    description: String,
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    sessions: Vec<Session>,
    reports: Vec<ProblemReport>,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(&AdvisorError::Json(e)),
        }
    }

    pub fn error(err: &AdvisorError) -> Self {
        let message = err.to_string();
        let body = serde_json::to_string(&ErrorBody { error: &message })
            .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string());
        Self {
            status: err.status_code(),
            body,
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n",
            self.status,
            reason_phrase(self.status),
            self.body.len(),
        );
        if self.status == 204 {
            head.push_str("Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n");
            head.push_str("Access-Control-Allow-Headers: Content-Type\r\n");
        } else {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        _ => "Internal Server Error",
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// Percent-decoding for URL query parameters and path segments.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse query string into key-value pairs.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((url_decode(key), url_decode(val)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

pub fn route(state: &AppState, req: &HttpRequest) -> HttpResponse {
    debug!(method = %req.method, path = %req.path, "routing request");

    if req.method == "OPTIONS" {
        return HttpResponse::no_content();
    }

    let result = match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/health") => Ok(HttpResponse::json(200, &serde_json::json!({ "status": "ok" }))),
        ("POST", "/diagnose") => diagnose(state, req),
        ("POST", path) if path.starts_with("/feedback/") => {
            feedback(state, req, &path["/feedback/".len()..])
        }
        ("POST", "/reports") => report(state, req),
        ("GET", "/admin/history") => history(state),
        ("GET", "/admin/stats") => state.advisor.stats().map(|s| HttpResponse::json(200, &s)),
        (_, "/health" | "/diagnose" | "/reports" | "/admin/history" | "/admin/stats") => {
            return HttpResponse::json(405, &ErrorBody { error: "method not allowed" });
        }
        _ => return HttpResponse::json(404, &ErrorBody { error: "not found" }),
    };

    result.unwrap_or_else(|err| {
        if err.is_client_error() {
            warn!(path = %req.path, error = %err, "request rejected");
        } else {
            warn!(path = %req.path, error = %err, "request failed");
        }
        HttpResponse::error(&err)
    })
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AdvisorError::validation(format!("invalid body: {e}")))
}

fn diagnose(state: &AppState, req: &HttpRequest) -> Result<HttpResponse> {
    let symptoms: SymptomVector = parse_body(&req.body)?;
    let diagnosis = state.advisor.diagnose(&symptoms)?;
    Ok(HttpResponse::json(200, &diagnosis))
}

fn feedback(state: &AppState, req: &HttpRequest, raw_id: &str) -> Result<HttpResponse> {
    let session_id = url_decode(raw_id);
    if session_id.is_empty() || session_id.contains('/') {
        return Err(AdvisorError::validation("missing session id"));
    }
    let outcome = match parse_query(&req.query).remove("outcome") {
        Some(outcome) => outcome,
        None if !req.body.is_empty() => parse_body::<FeedbackBody>(&req.body)?.outcome,
        None => return Err(AdvisorError::validation("missing outcome")),
    };
    let receipt = state.advisor.submit_feedback(&session_id, &outcome)?;
    Ok(HttpResponse::json(200, &receipt))
}

fn report(state: &AppState, req: &HttpRequest) -> Result<HttpResponse> {
    let body: ReportBody = parse_body(&req.body)?;
    let report = state.reports.append(&body.description)?;
    Ok(HttpResponse::json(200, &report))
}

fn history(state: &AppState) -> Result<HttpResponse> {
    let body = HistoryBody {
        sessions: state.advisor.history()?,
        reports: state.reports.list()?,
    };
    Ok(HttpResponse::json(200, &body))
}

// ---------------------------------------------------------------------------
// Wire parsing
// ---------------------------------------------------------------------------

/// Result of parsing a (possibly incomplete) buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    /// Need more bytes.
    Partial,
    Complete(HttpRequest),
}

/// Parse request line, headers and a `Content-Length` body out of `buf`.
pub fn parse_request(buf: &[u8]) -> Result<Parsed> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let header_len = match req.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(Parsed::Partial),
        Err(e) => return Err(AdvisorError::validation(format!("malformed request: {e}"))),
    };

    let content_length = req
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .map(|h| {
            std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or_else(|| AdvisorError::validation("invalid Content-Length"))
        })
        .transpose()?
        .unwrap_or(0);

    let total = header_len
        .checked_add(content_length)
        .filter(|&total| total <= MAX_REQUEST_BYTES)
        .ok_or_else(|| AdvisorError::validation("request too large"))?;
    if buf.len() < total {
        return Ok(Parsed::Partial);
    }

    let method = req.method.unwrap_or("GET");
    let target = req.path.unwrap_or("/");
    Ok(Parsed::Complete(HttpRequest::new(
        method,
        target,
        &buf[header_len..total],
    )))
}

async fn read_request(stream: &mut TcpStream) -> Result<Option<HttpRequest>> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // Peer closed before sending a full request.
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(AdvisorError::validation("request too large"));
        }
        if let Parsed::Complete(req) = parse_request(&buf)? {
            return Ok(Some(req));
        }
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) -> Result<()> {
    let response = match read_request(&mut stream).await {
        Ok(Some(req)) => route(&state, &req),
        Ok(None) => return Ok(()),
        Err(err) => HttpResponse::error(&err),
    };
    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

/// Bind `addr` and serve forever.
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "diagnostic advisor listening");
    serve_listener(listener, state).await
}

/// Serve on an already-bound listener.
pub async fn serve_listener(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                warn!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}
