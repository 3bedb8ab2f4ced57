use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::{HttpError, RegistrationError};
use crate::server::{Request, Response};
use crate::uri;

/// Three-valued flow control returned by middleware and route handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next handler in the chain.
    Continue,
    /// Stop the chain; the response is considered produced.
    Exit,
    /// Stop the chain and report a handler-level failure.
    Error,
}

/// Result of one middleware or handler invocation.
///
/// `Err` carries an [`HttpError`] for failures that map onto an HTTP status;
/// the router propagates it and the server's unhandled-error hook renders it.
pub type HandlerResult = Result<Flow, HttpError>;

/// A middleware or route handler. Handlers in one chain share the same
/// request/response pair; the response's internal latches keep accidental
/// double-sends harmless.
pub type Handler = Arc<dyn Fn(&Request, &Response) -> HandlerResult + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Request, &Response) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One `(method, path expression, handler chain)` entry in a router.
///
/// The expression may contain literal segments, `:name` parameter segments,
/// and a trailing `*` wildcard; see [`uri::match_path`].
pub struct Route {
    method: Method,
    expression: String,
    handlers: Vec<Handler>,
}

impl Route {
    /// Build a route. The handler chain must not be empty.
    pub fn new(
        method: Method,
        expression: impl Into<String>,
        handlers: Vec<Handler>,
    ) -> Result<Self, RegistrationError> {
        if handlers.is_empty() {
            return Err(RegistrationError::EmptyHandlerChain);
        }
        Ok(Self {
            method,
            expression: expression.into(),
            handlers,
        })
    }

    /// The path expression this route was registered with.
    pub fn path(&self) -> &str {
        &self.expression
    }

    /// The HTTP method this route responds to.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Whether this route matches the request.
    ///
    /// Captured path parameters are stored on the request as soon as the
    /// pattern matches, before the method comparison; a later route that also
    /// matches will overwrite them.
    pub fn matches(&self, request: &Request) -> bool {
        let Some(params) = uri::match_path(&self.expression, request.path()) else {
            return false;
        };
        request.set_path_params(params);
        request.method().eq_ignore_ascii_case(self.method.as_str())
    }

    /// Drive the handler chain for a matched request.
    ///
    /// `Continue` advances, `Exit`/`Error` stop the chain with that flow, and
    /// a chain that runs off the end reports `Exit`.
    pub fn handle(&self, request: &Request, response: &Response) -> HandlerResult {
        for handler in &self.handlers {
            match handler(request, response)? {
                Flow::Continue => continue,
                Flow::Exit => return Ok(Flow::Exit),
                Flow::Error => return Ok(Flow::Error),
            }
        }
        Ok(Flow::Exit)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("expression", &self.expression)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
