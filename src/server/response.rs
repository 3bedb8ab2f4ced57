use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::error;

use crate::server::transport::{ResponseParts, ResponseWriter};

/// Buffered response with exactly-once delivery.
///
/// Wraps the transport's [`ResponseWriter`] by ownership transfer and starts
/// as `200 OK`. All mutation goes through the parts lock; the `sent` and
/// `ended` latches each flip false→true at most once, so however many times
/// handlers call [`send`](Response::send) or [`end`](Response::end), the wire
/// sees one of each. A response is moved into one worker and is not `Clone`;
/// the locks exist so a handler that fans work out anyway cannot corrupt it.
pub struct Response {
    parts: Mutex<ResponseParts>,
    writer: Mutex<Box<dyn ResponseWriter>>,
    sent: AtomicBool,
    ended: AtomicBool,
}

impl Response {
    /// Wrap the transport's writer, taking ownership of it.
    pub fn new(writer: Box<dyn ResponseWriter>) -> Self {
        Self {
            parts: Mutex::new(ResponseParts::default()),
            writer: Mutex::new(writer),
            sent: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        }
    }

    /// Set the status line.
    pub fn set_status(&self, status: u16, reason: &str) {
        let mut parts = self.parts.lock().unwrap();
        parts.status = status;
        parts.reason = reason.to_string();
    }

    /// Current status code.
    pub fn status(&self) -> u16 {
        self.parts.lock().unwrap().status
    }

    /// Current reason phrase.
    pub fn reason(&self) -> String {
        self.parts.lock().unwrap().reason.clone()
    }

    /// Replace the body. Takes effect on the wire only if called before
    /// [`send`](Response::send) wins its latch.
    pub fn set_body(&self, body: impl Into<Vec<u8>>) {
        self.parts.lock().unwrap().body = body.into();
    }

    /// Append a `Content-Type` header.
    pub fn set_content_type(&self, content_type: &str) {
        self.add_header("Content-Type", content_type);
    }

    /// Append a header. Headers form an ordered multi-map; repeated names are
    /// all transmitted.
    pub fn add_header(&self, name: &str, value: &str) {
        self.parts
            .lock()
            .unwrap()
            .headers
            .push((name.to_string(), value.to_string()));
    }

    /// Append a trailer.
    pub fn add_trailer(&self, name: &str, value: &str) {
        self.parts
            .lock()
            .unwrap()
            .trailers
            .push((name.to_string(), value.to_string()));
    }

    /// Append a `Set-Cookie: name=value[; attributes]` header. Cookies are
    /// never deduplicated.
    pub fn add_cookie(&self, name: &str, value: &str, attributes: &str) {
        let mut cookie = format!("{name}={value}");
        if !attributes.is_empty() {
            cookie.push_str("; ");
            cookie.push_str(attributes);
        }
        self.add_header("Set-Cookie", &cookie);
    }

    /// Whether the response has been transmitted.
    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::SeqCst)
    }

    /// Whether the exchange has been terminated.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Transmit the buffered response, exactly once.
    ///
    /// The first call wins the latch, fills in `Connection: close` and
    /// `Content-Length` when the handler set neither, and invokes the
    /// transport's send primitive. Transport failures are logged and followed
    /// by [`end`](Response::end). Every later call returns immediately.
    pub fn send(&self) {
        if self.sent.swap(true, Ordering::SeqCst) {
            return;
        }

        let snapshot = {
            let mut parts = self.parts.lock().unwrap();
            if !has_header(&parts.headers, "Connection") {
                parts
                    .headers
                    .push(("Connection".to_string(), "close".to_string()));
            }
            if !has_header(&parts.headers, "Content-Length") {
                let length = parts.body.len().to_string();
                parts.headers.push(("Content-Length".to_string(), length));
            }
            parts.clone()
        };

        let result = self.writer.lock().unwrap().send(&snapshot);
        if let Err(e) = result {
            error!(error = %e, "error sending response");
            self.end();
        }
    }

    /// Terminate the exchange, exactly once. Transport failures are swallowed
    /// and logged.
    pub fn end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.writer.lock().unwrap().end() {
            error!(error = %e, "error ending response");
        }
    }

    /// Send `body` as `application/json`.
    pub fn send_json(&self, body: impl Into<String>) {
        self.send_typed("application/json", body.into());
    }

    /// Send `body` as `text/html`.
    pub fn send_html(&self, body: impl Into<String>) {
        self.send_typed("text/html", body.into());
    }

    /// Send `body` as `text/plain`.
    pub fn send_text(&self, body: impl Into<String>) {
        self.send_typed("text/plain", body.into());
    }

    fn send_typed(&self, content_type: &str, body: String) {
        {
            let mut parts = self.parts.lock().unwrap();
            let bytes = body.into_bytes();
            parts
                .headers
                .push(("Content-Type".to_string(), content_type.to_string()));
            parts
                .headers
                .push(("Content-Length".to_string(), bytes.len().to_string()));
            parts.body = bytes;
        }
        self.send();
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}
