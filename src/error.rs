use std::fmt;

/// HTTP-aware error value carried through the routing pipeline.
///
/// Handlers return this for failures that map onto an HTTP status; the server
/// synthesizes one when it catches anything else. It is data, not a control
/// primitive: the router logs it and propagates it upward, and the server's
/// unhandled-error hook is what finally turns it into a response.
#[derive(Debug, Clone)]
pub struct HttpError {
    message: String,
    kind: String,
    origin: String,
    status: u16,
    reason: String,
}

impl HttpError {
    /// Diagnostic type tag applied when none is given.
    pub const DEFAULT_KIND: &'static str = "WEB_EXCEPTION";
    /// Origin tag applied when none is given.
    pub const DEFAULT_ORIGIN: &'static str = "web_function";

    /// A `500 Internal Server Error` with default diagnostic tags.
    pub fn new(message: impl Into<String>) -> Self {
        Self::full(
            message,
            Self::DEFAULT_KIND,
            Self::DEFAULT_ORIGIN,
            500,
            "Internal Server Error",
        )
    }

    /// Custom status line, default diagnostic tags.
    pub fn with_status(message: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::full(
            message,
            Self::DEFAULT_KIND,
            Self::DEFAULT_ORIGIN,
            status,
            reason,
        )
    }

    /// Custom diagnostic tags, default `500 Internal Server Error` status line.
    pub fn with_origin(
        message: impl Into<String>,
        kind: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::full(message, kind, origin, 500, "Internal Server Error")
    }

    /// Fully specified error value.
    pub fn full(
        message: impl Into<String>,
        kind: impl Into<String>,
        origin: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            origin: origin.into(),
            status,
            reason: reason.into(),
        }
    }

    /// HTTP status code to render (default 500).
    pub fn status(&self) -> u16 {
        self.status
    }

    /// HTTP reason phrase to render.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Underlying diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Free-form diagnostic type tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Free-form origin tag (the component that produced the error).
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Web Exception [{} - {}]: {} (type: {}, origin: {})",
            self.status, self.reason, self.message, self.kind, self.origin
        )
    }
}

impl std::error::Error for HttpError {}

/// Invariant violations surfaced while wiring up routes, before any traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// A route was constructed with no handlers in its chain.
    EmptyHandlerChain,
    /// A route with an empty path expression was added to a router.
    EmptyRoutePath,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHandlerChain => write!(f, "at least one handler must be provided"),
            Self::EmptyRoutePath => write!(f, "route path cannot be empty"),
        }
    }
}

impl std::error::Error for RegistrationError {}
