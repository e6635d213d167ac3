//! Reading publisher
//!
//! Serves the latest reading as JSON over a minimal HTTP/1.x exchange. The
//! transport (accepting connections, reading the request head, writing the
//! response) belongs to the host; this module only maps a request head to a
//! complete [`Response`]. It never mutates the shared state.

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;
use core::str;

use log::{debug, error};
use serde::Serialize;

use crate::sensors::Reading;
use crate::state::SharedState;

/// End of an HTTP request head
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    ServiceUnavailable,
    InternalError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::ServiceUnavailable => 503,
            Self::InternalError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::InternalError => "Internal Server Error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// A JSON response ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Response {
    fn json(status: Status, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Response carrying `{"error": <reason>}`.
    pub fn error(status: Status) -> Self {
        let body = serde_json::to_vec(&ErrorBody {
            error: status.reason(),
        })
        .unwrap_or_default();
        Self::json(status, body)
    }

    /// Status line, headers and body as sent on the wire.
    pub fn encode(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            self.body.len()
        );

        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Whether `buf` holds a complete request head.
pub fn request_head_complete(buf: &[u8]) -> bool {
    buf.windows(HEAD_TERMINATOR.len())
        .any(|window| window == HEAD_TERMINATOR)
}

/// Read-only view of the shared state for request handlers.
#[derive(Clone, Copy)]
pub struct ReadingPublisher<'a> {
    state: &'a SharedState,
}

impl<'a> ReadingPublisher<'a> {
    pub const fn new(state: &'a SharedState) -> Self {
        Self { state }
    }

    /// Latest reading as JSON, `None` before the first successful poll.
    pub fn latest_json(&self) -> Option<Vec<u8>> {
        self.state.latest().and_then(|reading| encode_reading(&reading))
    }

    /// Answer a raw request head.
    pub fn handle(&self, request: &[u8]) -> Response {
        let Some((method, path)) = parse_request_line(request) else {
            debug!("Rejecting malformed request");
            return Response::error(Status::BadRequest);
        };

        if method != "GET" {
            return Response::error(Status::MethodNotAllowed);
        }

        let path = path.split_once('?').map_or(path, |(path, _)| path);
        if path != "/" {
            return Response::error(Status::NotFound);
        }

        match self.state.latest() {
            None => Response::error(Status::ServiceUnavailable),
            Some(reading) => match encode_reading(&reading) {
                Some(body) => Response::json(Status::Ok, body),
                None => Response::error(Status::InternalError),
            },
        }
    }
}

fn encode_reading(reading: &Reading) -> Option<Vec<u8>> {
    serde_json::to_vec(reading)
        .map_err(|e| error!("Reading serialization failed: {}", e))
        .ok()
}

/// Split `METHOD SP target SP HTTP/x.y` into method and target.
fn parse_request_line(request: &[u8]) -> Option<(&str, &str)> {
    let end = request.windows(2).position(|pair| pair == b"\r\n")?;
    let line = str::from_utf8(&request[..end]).ok()?;

    let mut parts = line.split(' ');
    let method = parts.next().filter(|method| !method.is_empty())?;
    let target = parts.next().filter(|target| target.starts_with('/'))?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/1.") || parts.next().is_some() {
        return None;
    }
    Some((method, target))
}
