use tracing::{debug, error};

use crate::error::{HttpError, RegistrationError};
use crate::router::route::{Flow, Handler, Route};
use crate::server::{Request, Response};

/// An ordered middleware chain plus an ordered route table.
///
/// Middleware runs first, in registration order; a middleware returning
/// `Exit` or `Error` short-circuits the whole router. If every middleware
/// returns `Continue`, routes are tried in registration order and the first
/// match wins.
///
/// Routers are configured before the server starts listening and are
/// read-only afterwards; nothing here defends against concurrent mutation.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    middlewares: Vec<Handler>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the chain.
    pub fn use_middleware(&mut self, middleware: Handler) {
        self.middlewares.push(middleware);
    }

    /// Register a route. Routes match in registration order, so overlapping
    /// patterns should be added most-specific first.
    pub fn add_route(&mut self, route: Route) -> Result<(), RegistrationError> {
        if route.path().is_empty() {
            return Err(RegistrationError::EmptyRoutePath);
        }
        debug!(method = %route.method(), path = route.path(), "route registered");
        self.routes.push(route);
        Ok(())
    }

    /// Number of registered routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Run the middleware chain, then first-match route dispatch.
    ///
    /// Returns `Ok(true)` when the request was handled (by a middleware
    /// short-circuit or by a matching route, whatever flow its chain
    /// reported), `Ok(false)` when no route matched. Errors are logged here
    /// and propagated; the router never renders a response itself.
    pub fn handle(&self, request: &Request, response: &Response) -> Result<bool, HttpError> {
        match self.run(request, response) {
            Ok(handled) => Ok(handled),
            Err(err) => {
                error!(
                    status = err.status(),
                    reason = err.reason(),
                    error = %err,
                    "error in router"
                );
                Err(err)
            }
        }
    }

    fn run(&self, request: &Request, response: &Response) -> Result<bool, HttpError> {
        for middleware in &self.middlewares {
            match middleware(request, response)? {
                Flow::Continue => {}
                Flow::Exit | Flow::Error => return Ok(true),
            }
        }

        for route in &self.routes {
            if route.matches(request) {
                debug!(
                    method = request.method(),
                    path = request.path(),
                    pattern = route.path(),
                    "route matched"
                );
                route.handle(request, response)?;
                return Ok(true);
            }
        }

        Ok(false)
    }
}
