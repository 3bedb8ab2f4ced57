//! # Router Module
//!
//! Path matching and route dispatch: the middleware chain and the ordered
//! route table that decide which handlers run for a request.
//!
//! ## Overview
//!
//! A [`Router`] holds an ordered middleware chain and an ordered list of
//! [`Route`]s. Handling a request runs:
//!
//! 1. **Middleware** — every middleware in registration order. Returning
//!    [`Flow::Exit`] or [`Flow::Error`] stops the router immediately; the
//!    request counts as handled.
//! 2. **Route dispatch** — routes are tried in registration order; the first
//!    route whose method and path expression match drives its handler chain.
//!    First-match wins, so more specific patterns belong first.
//!
//! Path expressions support literal segments, `:name` parameter segments
//! (captured onto the request, URL-decoded), and a trailing `*` wildcard that
//! swallows the remainder of the path.
//!
//! ## Flow control
//!
//! Middleware and handlers share one signature and return a [`Flow`]:
//! `Continue` to advance, `Exit` to stop successfully, `Error` to stop with a
//! failure. HTTP-mappable failures are returned as `Err(HttpError)` instead;
//! the router logs and propagates them without rendering anything — response
//! rendering for errors belongs to the server's unhandled-error hook.
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchyard::router::{handler, Flow, Route, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.use_middleware(handler(|_req, _res| Ok(Flow::Continue)));
//! router.add_route(Route::new(
//!     Method::GET,
//!     "/pets/:id",
//!     vec![handler(|req, res| {
//!         let id = req.path_param("id").unwrap_or_default();
//!         res.send_text(format!("pet {id}"));
//!         Ok(Flow::Exit)
//!     })],
//! )?)?;
//! ```

mod core;
mod route;

pub use core::Router;
pub use route::{handler, Flow, Handler, HandlerResult, Route};
