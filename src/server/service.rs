use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};

use tracing::{debug, error, info, warn};

use crate::error::HttpError;
use crate::router::{handler, Flow, Handler, Router};
use crate::server::request::Request;
use crate::server::response::Response;
use crate::server::transport::{HeadersEvent, RawRequest, RequestSink, ResponseWriter};
use crate::uri;
use crate::worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolMetrics};

/// Hook invoked once the transport reports a successful listen.
pub type ListenHook = Box<dyn Fn() + Send + Sync>;

/// Hook for transport-level failures outside any single exchange.
pub type TransportErrorHook = Box<dyn Fn(&dyn std::error::Error) + Send + Sync>;

/// Pass-through hook for the transport's headers-received event.
pub type HeadersHook = Box<dyn Fn(&HeadersEvent<'_>) + Send + Sync>;

/// Hook that renders a response for an unhandled [`HttpError`]. The pipeline
/// still performs its own `send`/`end` afterwards, so the hook may end the
/// response itself or leave that to the latches.
pub type ErrorHook = Box<dyn Fn(&Request, &Response, &HttpError) + Send + Sync>;

/// Everything [`AppService`] is built from, assembled by the server front
/// before the pipeline is frozen.
pub(crate) struct ServiceConfig {
    pub routers: Vec<Router>,
    pub static_dirs: Vec<PathBuf>,
    pub default_handler: Handler,
    pub error_hook: ErrorHook,
    pub headers_hook: Option<HeadersHook>,
    pub listen_hook: ListenHook,
    pub transport_error_hook: TransportErrorHook,
    pub pool_config: WorkerPoolConfig,
}

/// The frozen dispatch pipeline: routers, static roots, hooks, worker pool.
///
/// Built by `Server::listen` and immutable afterwards. Implements
/// [`RequestSink`], so the transport drives it directly: requests are
/// validated on the transport thread, dispatched onto the worker pool, and
/// finalized with exactly one `send` and one `end` each.
pub struct AppService {
    routers: Vec<Router>,
    static_dirs: Vec<PathBuf>,
    default_handler: Handler,
    error_hook: ErrorHook,
    headers_hook: Option<HeadersHook>,
    listen_hook: ListenHook,
    transport_error_hook: TransportErrorHook,
    pool: WorkerPool,
    weak_self: Weak<AppService>,
}

impl AppService {
    pub(crate) fn new_shared(config: ServiceConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            routers: config.routers,
            static_dirs: config.static_dirs,
            default_handler: config.default_handler,
            error_hook: config.error_hook,
            headers_hook: config.headers_hook,
            listen_hook: config.listen_hook,
            transport_error_hook: config.transport_error_hook,
            pool: WorkerPool::new(config.pool_config),
            weak_self: weak.clone(),
        })
    }

    /// Metrics of the worker pool driving this pipeline.
    pub fn worker_metrics(&self) -> Arc<WorkerPoolMetrics> {
        self.pool.metrics()
    }

    pub(crate) fn shutdown_pool(&self) {
        self.pool.shutdown();
    }

    /// Worker-side entry point: run the pipeline, route any failure to the
    /// unhandled-error hook, then finalize. `send`/`end` run unconditionally;
    /// the response latches make repeats harmless.
    fn request_handler(&self, request: Arc<Request>, response: Arc<Response>) {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(&request, &response)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    method = request.method(),
                    uri = request.uri(),
                    status = err.status(),
                    error = %err,
                    "error in request handler"
                );
                (self.error_hook)(&request, &response, &err);
            }
            Err(payload) => {
                error!(
                    method = request.method(),
                    uri = request.uri(),
                    panic = panic_message(payload.as_ref()),
                    "request handler panicked"
                );
                let err = HttpError::full(
                    "request handler panicked",
                    "PANIC",
                    "request_handler",
                    500,
                    "Internal Server Error",
                );
                (self.error_hook)(&request, &response, &err);
            }
        }

        response.send();
        response.end();
    }

    fn run_pipeline(&self, request: &Request, response: &Response) -> Result<(), HttpError> {
        let mut handled = false;

        if uri::is_static_uri(request.uri()) {
            self.serve_static(request, response)?;
            handled = true;
        } else {
            for router in &self.routers {
                if router.handle(request, response)? {
                    handled = true;
                    break;
                }
            }
        }

        if !handled {
            (self.default_handler)(request, response)?;
        }
        Ok(())
    }

    /// Serve a static asset from the registered roots, tried in registration
    /// order. The URL path is sanitized textually, then resolved component by
    /// component so it can never escape a root.
    fn serve_static(&self, request: &Request, response: &Response) -> Result<(), HttpError> {
        let path = uri::get_path(request.uri());
        let sanitized = uri::sanitize_path(path);

        for root in &self.static_dirs {
            let Some(file_path) = resolve_under_root(root, &sanitized) else {
                continue;
            };
            if !file_path.is_file() {
                continue;
            }
            let bytes = fs::read(&file_path).map_err(|e| {
                HttpError::full(
                    format!("error reading {}: {e}", file_path.display()),
                    "IO_ERROR",
                    "serve_static",
                    500,
                    "Internal Server Error",
                )
            })?;
            debug!(
                path = %file_path.display(),
                bytes = bytes.len(),
                "serving static file"
            );
            response.set_content_type(uri::mime_type_from_extension(uri::file_extension(
                &sanitized,
            )));
            response.set_body(bytes);
            response.set_status(200, "OK");
            response.send();
            return Ok(());
        }

        debug!(path = %sanitized, "static file not found");
        response.set_status(404, "Not Found");
        response.send_text("404 Not Found");
        Ok(())
    }
}

impl RequestSink for AppService {
    fn on_request_received(&self, raw: RawRequest, writer: Box<dyn ResponseWriter>) {
        let request = Arc::new(Request::new(raw));
        let response = Arc::new(Response::new(writer));

        if !uri::is_known_method(request.method()) {
            warn!(method = request.method(), uri = request.uri(), "unknown HTTP method");
            response.set_status(405, "Method Not Allowed");
            response.send_text("405 Method Not Allowed");
            response.end();
            return;
        }

        let Some(service) = self.weak_self.upgrade() else {
            return;
        };
        let req = Arc::clone(&request);
        let res = Arc::clone(&response);
        if let Err(e) = self
            .pool
            .enqueue(Box::new(move || service.request_handler(req, res)))
        {
            let err = HttpError::full(
                format!("error dispatching request: {e}"),
                "DISPATCH_ERROR",
                "on_request_received",
                500,
                "Internal Server Error",
            );
            error!(method = request.method(), uri = request.uri(), error = %err, "dispatch failed");
            (self.error_hook)(&request, &response, &err);
            response.send();
            response.end();
        }
    }

    fn on_headers_received(&self, event: HeadersEvent<'_>) {
        if let Some(hook) = &self.headers_hook {
            hook(&event);
        }
    }

    fn on_listen_success(&self) {
        (self.listen_hook)();
    }

    fn on_exception_occurred(&self, error: &dyn std::error::Error) {
        (self.transport_error_hook)(error);
    }
}

/// Resolve a sanitized URL path under a static root, refusing any component
/// that would escape it.
fn resolve_under_root(root: &Path, url_path: &str) -> Option<PathBuf> {
    let clean = url_path.trim_start_matches('/');
    let mut resolved = root.to_path_buf();
    for component in Path::new(clean).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "opaque panic payload"
    }
}

pub(crate) fn default_unmatched_handler() -> Handler {
    handler(|_req, res| {
        res.set_status(404, "Not Found");
        res.send_text("404 Not Found");
        Ok(Flow::Exit)
    })
}

pub(crate) fn default_error_hook() -> ErrorHook {
    Box::new(|_req, res, err| {
        res.set_status(err.status(), err.reason());
        res.send_text("Internal Server Error");
        error!(status = err.status(), error = %err, "unhandled web error");
        res.end();
    })
}

pub(crate) fn default_listen_hook(host: &str, port: u16) -> ListenHook {
    let host = host.to_string();
    Box::new(move || info!(host = %host, port, "server listening"))
}

pub(crate) fn default_transport_error_hook() -> TransportErrorHook {
    Box::new(|error| error!(error = %error, "transport exception"))
}
