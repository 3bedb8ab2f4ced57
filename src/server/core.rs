use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use http::Method;
use tracing::warn;

use crate::error::RegistrationError;
use crate::router::{Handler, Route, Router};
use crate::server::service::{
    default_error_hook, default_listen_hook, default_transport_error_hook,
    default_unmatched_handler, AppService, ErrorHook, HeadersHook, ListenHook, ServiceConfig,
    TransportErrorHook,
};
use crate::server::transport::Transport;
use crate::worker_pool::{WorkerPoolConfig, WorkerPoolMetrics};

/// The engine's front door: registration surface before [`listen`], transport
/// control afterwards.
///
/// Routers, static roots, and hooks are collected here, frozen into an
/// [`AppService`] when `listen` runs, and read-only from then on. Host and
/// port are descriptive for the transport; the engine itself never touches
/// sockets.
///
/// [`listen`]: Server::listen
pub struct Server<T: Transport> {
    transport: T,
    host: String,
    port: u16,
    config: Option<PendingConfig>,
    service: Option<Arc<AppService>>,
}

struct PendingConfig {
    routers: Vec<Router>,
    primary_router: Option<usize>,
    static_dirs: Vec<PathBuf>,
    default_handler: Handler,
    error_hook: Option<ErrorHook>,
    headers_hook: Option<HeadersHook>,
    listen_hook: Option<ListenHook>,
    transport_error_hook: Option<TransportErrorHook>,
    pool_config: Option<WorkerPoolConfig>,
}

impl<T: Transport> Server<T> {
    /// Create a server bound (by its transport) to `host:port`.
    pub fn new(transport: T, host: impl Into<String>, port: u16) -> Self {
        Self {
            transport,
            host: host.into(),
            port,
            config: Some(PendingConfig {
                routers: Vec::new(),
                primary_router: None,
                static_dirs: Vec::new(),
                default_handler: default_unmatched_handler(),
                error_hook: None,
                headers_hook: None,
                listen_hook: None,
                transport_error_hook: None,
                pool_config: None,
            }),
            service: None,
        }
    }

    /// Register a router. Routers are consulted in registration order; the
    /// first one that handles a request wins.
    pub fn use_router(&mut self, router: Router) {
        if let Some(config) = self.config.as_mut() {
            config.routers.push(router);
        } else {
            warn!("use_router after listen is ignored");
        }
    }

    /// Register a static-asset root directory. Roots are tried in
    /// registration order.
    pub fn use_static(&mut self, dir: impl Into<PathBuf>) {
        if let Some(config) = self.config.as_mut() {
            config.static_dirs.push(dir.into());
        } else {
            warn!("use_static after listen is ignored");
        }
    }

    /// Replace the unmatched-route handler (the default answers
    /// `404 Not Found`).
    pub fn use_default(&mut self, handler: Handler) {
        if let Some(config) = self.config.as_mut() {
            config.default_handler = handler;
        } else {
            warn!("use_default after listen is ignored");
        }
    }

    /// Install a headers-received hook, invoked by the transport before the
    /// body has arrived.
    pub fn use_headers_received(&mut self, hook: HeadersHook) {
        if let Some(config) = self.config.as_mut() {
            config.headers_hook = Some(hook);
        } else {
            warn!("use_headers_received after listen is ignored");
        }
    }

    /// Replace the unhandled-error hook (the default renders the error's
    /// status with a short generic body).
    pub fn use_error(&mut self, hook: ErrorHook) {
        if let Some(config) = self.config.as_mut() {
            config.error_hook = Some(hook);
        } else {
            warn!("use_error after listen is ignored");
        }
    }

    /// Override the worker-pool configuration (the default is
    /// [`WorkerPoolConfig::from_env`]).
    pub fn with_pool_config(&mut self, pool_config: WorkerPoolConfig) {
        if let Some(config) = self.config.as_mut() {
            config.pool_config = Some(pool_config);
        } else {
            warn!("with_pool_config after listen is ignored");
        }
    }

    /// Register a `GET` route on the primary router.
    pub fn get(&mut self, path: &str, handlers: Vec<Handler>) -> Result<(), RegistrationError> {
        self.route(Method::GET, path, handlers)
    }

    /// Register a `POST` route on the primary router.
    pub fn post(&mut self, path: &str, handlers: Vec<Handler>) -> Result<(), RegistrationError> {
        self.route(Method::POST, path, handlers)
    }

    /// Register a `PUT` route on the primary router.
    pub fn put(&mut self, path: &str, handlers: Vec<Handler>) -> Result<(), RegistrationError> {
        self.route(Method::PUT, path, handlers)
    }

    /// Register a `DELETE` route on the primary router.
    pub fn delete(&mut self, path: &str, handlers: Vec<Handler>) -> Result<(), RegistrationError> {
        self.route(Method::DELETE, path, handlers)
    }

    /// Register a route on the primary router, creating that router at the
    /// current registration position on first use.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<Handler>,
    ) -> Result<(), RegistrationError> {
        let route = Route::new(method, path, handlers)?;
        let Some(config) = self.config.as_mut() else {
            warn!("route registration after listen is ignored");
            return Ok(());
        };
        let idx = match config.primary_router {
            Some(idx) => idx,
            None => {
                config.routers.push(Router::new());
                let idx = config.routers.len() - 1;
                config.primary_router = Some(idx);
                idx
            }
        };
        config.routers[idx].add_route(route)
    }

    /// Freeze the configuration and start the transport.
    ///
    /// `on_listen` and `on_error` override the default hooks (a log banner and
    /// an error-log entry, respectively). Fails if the server is already
    /// listening.
    pub fn listen(
        &mut self,
        on_listen: Option<ListenHook>,
        on_error: Option<TransportErrorHook>,
    ) -> io::Result<()> {
        let Some(mut config) = self.config.take() else {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "server is already listening",
            ));
        };
        if let Some(hook) = on_listen {
            config.listen_hook = Some(hook);
        }
        if let Some(hook) = on_error {
            config.transport_error_hook = Some(hook);
        }

        let service = AppService::new_shared(ServiceConfig {
            routers: config.routers,
            static_dirs: config.static_dirs,
            default_handler: config.default_handler,
            error_hook: config.error_hook.unwrap_or_else(default_error_hook),
            headers_hook: config.headers_hook,
            listen_hook: config
                .listen_hook
                .unwrap_or_else(|| default_listen_hook(&self.host, self.port)),
            transport_error_hook: config
                .transport_error_hook
                .unwrap_or_else(default_transport_error_hook),
            pool_config: config.pool_config.unwrap_or_else(WorkerPoolConfig::from_env),
        });
        self.service = Some(Arc::clone(&service));
        self.transport.start(service)
    }

    /// Stop the transport and shut the worker pool down, draining queued
    /// requests first.
    pub fn stop(&mut self) -> io::Result<()> {
        self.transport.stop()?;
        if let Some(service) = self.service.take() {
            service.shutdown_pool();
        }
        Ok(())
    }

    /// The frozen pipeline, once listening. Useful for embedding and tests.
    pub fn service(&self) -> Option<&Arc<AppService>> {
        self.service.as_ref()
    }

    /// Worker-pool metrics, once listening.
    pub fn worker_metrics(&self) -> Option<Arc<WorkerPoolMetrics>> {
        self.service.as_ref().map(|s| s.worker_metrics())
    }

    /// The host this server was configured with.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port this server was configured with.
    pub fn port(&self) -> u16 {
        self.port
    }
}
