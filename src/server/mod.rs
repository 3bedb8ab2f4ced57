//! # Server Module
//!
//! The request lifecycle: transport contract, request/response wrappers, the
//! dispatch pipeline, and the server front that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! Transport → AppService (RequestSink) → Worker Pool → Routers → Handlers
//!                                                   ↘ Static Files
//! ```
//!
//! Each incoming request flows through:
//! 1. **Transport** — parses HTTP and delivers an owned [`RawRequest`] plus a
//!    [`ResponseWriter`] on its own thread
//! 2. **AppService** — validates the method (405 at the boundary), wraps both
//!    sides, and enqueues the work
//! 3. **Worker pool** — a worker picks the task up in FIFO order
//! 4. **Pipeline** — static classification, then router iteration in
//!    registration order, then the unmatched-route fallback
//! 5. **Finalization** — exactly one `send` and one `end`, enforced by the
//!    response's idempotency latches
//!
//! ## Error handling
//!
//! Handlers fail with [`HttpError`](crate::error::HttpError); the router
//! propagates, and the pipeline hands the error to the unhandled-error hook,
//! which owns rendering. Panics inside handlers are caught, logged, and
//! treated as generic 500s. A response is always attempted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchyard::router::{handler, Flow};
//! use switchyard::server::Server;
//!
//! let mut server = Server::new(transport, "0.0.0.0", 8080);
//! server.use_static("public");
//! server.get("/pets/:id", vec![handler(|req, res| {
//!     let id = req.path_param("id").unwrap_or_default();
//!     res.send_json(format!("{{\"pet\":\"{id}\"}}"));
//!     Ok(Flow::Exit)
//! })])?;
//! server.listen(None, None)?;
//! ```

/// Server front: registration surface and transport control
pub mod core;
/// Request wrapper over the transport's parsed message
pub mod request;
/// Response wrapper with exactly-once delivery
pub mod response;
/// The dispatch pipeline behind the transport callbacks
pub mod service;
/// Contract between the engine and the transport
pub mod transport;

pub use core::Server;
pub use request::Request;
pub use response::Response;
pub use service::{AppService, ErrorHook, HeadersHook, ListenHook, TransportErrorHook};
pub use transport::{
    Connection, HeadersEvent, RawRequest, RequestSink, ResponseParts, ResponseWriter, Transport,
};
