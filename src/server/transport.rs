//! Contract between the engine and the transport that feeds it.
//!
//! The engine never touches sockets or parses HTTP. A transport — an epoll
//! loop, a test harness, anything — materializes requests, hands them over
//! through [`RequestSink`], and supplies the `send`/`end` primitives through
//! [`ResponseWriter`]. Everything the engine does afterwards is expressed in
//! terms of these traits.

use std::io;
use std::sync::Arc;

/// A fully parsed HTTP/1.x message handed over by the transport.
///
/// Ownership moves into the engine; the transport keeps nothing. Headers are
/// an ordered multi-map; names are matched case-insensitively by the request
/// wrapper, so the transport may deliver them in any casing.
#[derive(Debug, Default)]
pub struct RawRequest {
    pub method: String,
    pub uri: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Buffered response state, flushed through [`ResponseWriter::send`] exactly
/// once.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub status: u16,
    pub reason: String,
    /// Ordered header multi-map; repeated names are transmitted repeatedly.
    pub headers: Vec<(String, String)>,
    pub trailers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            trailers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// The transport's write side for one in-flight response.
pub trait ResponseWriter: Send {
    /// Transmit the status line, headers, and body.
    fn send(&mut self, parts: &ResponseParts) -> io::Result<()>;

    /// Terminate the exchange. Whether that closes the connection or recycles
    /// it for keep-alive is the transport's business.
    fn end(&mut self) -> io::Result<()>;
}

/// Handle to the underlying connection, usable from the headers hook.
pub trait Connection: Send + Sync {
    /// Close the connection before the body arrives (e.g. to refuse an
    /// oversized upload).
    fn close(&self) -> io::Result<()>;
}

/// Snapshot passed to the headers-received hook.
///
/// `partial_body` is whatever the transport happens to have buffered when the
/// headers finish parsing; it may be empty or incomplete and the engine never
/// assumes otherwise.
pub struct HeadersEvent<'a> {
    pub connection: &'a dyn Connection,
    pub headers: &'a [(String, String)],
    pub method: &'a str,
    pub uri: &'a str,
    pub version: &'a str,
    pub partial_body: &'a [u8],
}

/// Callbacks the engine implements and the transport drives.
pub trait RequestSink: Send + Sync {
    /// A complete request arrived. Runs on the transport thread and must stay
    /// O(1): validate, enqueue, return.
    fn on_request_received(&self, request: RawRequest, writer: Box<dyn ResponseWriter>);

    /// Headers (only) have been parsed for an in-flight request.
    fn on_headers_received(&self, event: HeadersEvent<'_>);

    /// The listener is up and accepting connections.
    fn on_listen_success(&self);

    /// A transport-level failure outside any single exchange.
    fn on_exception_occurred(&self, error: &dyn std::error::Error);
}

/// A pluggable socket/HTTP layer.
pub trait Transport {
    /// Begin delivering callbacks to `sink`. Must not block the caller.
    fn start(&mut self, sink: Arc<dyn RequestSink>) -> io::Result<()>;

    /// Stop accepting new requests.
    fn stop(&mut self) -> io::Result<()>;
}
