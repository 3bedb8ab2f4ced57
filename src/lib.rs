//! # switchyard
//!
//! An embeddable HTTP request-routing and dispatch engine. A lower-level
//! transport delivers already-parsed requests; switchyard decides whether each
//! one is a static asset or a dynamic route, runs the registered middleware
//! and handler chains with three-valued flow control, and finalizes every
//! response exactly once across a pool of worker threads.
//!
//! The crate deliberately owns no sockets and parses no HTTP: the transport
//! seam ([`server::transport`]) is the whole outside world. That keeps the
//! engine embeddable in servers, proxies, and test harnesses alike.
//!
//! ## Pipeline
//!
//! ```text
//! transport thread          worker thread
//! ─────────────────         ─────────────────────────────────────────
//! on_request_received  →    request_handler
//!   validate method           ├─ static? → serve_static
//!   wrap request/response     ├─ routers (middleware → first match)
//!   enqueue                   ├─ unmatched → default 404 handler
//!                             └─ send() + end()   (exactly once)
//! ```

pub mod error;
pub mod router;
pub mod server;
pub mod uri;
pub mod worker_pool;

pub use error::{HttpError, RegistrationError};
pub use router::{handler, Flow, Handler, HandlerResult, Route, Router};
pub use server::{
    AppService, Connection, HeadersEvent, RawRequest, Request, RequestSink, Response,
    ResponseParts, ResponseWriter, Server, Transport,
};
pub use uri::PathParams;
pub use worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolMetrics};
