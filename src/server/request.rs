use std::collections::HashMap;
use std::sync::Mutex;

use crate::server::transport::RawRequest;
use crate::uri::{self, PathParams};

/// Read-only view over the transport's request, plus the two per-request
/// mutable slots the pipeline needs: captured path parameters and a free-form
/// scratch map for middleware.
///
/// A request is moved into exactly one worker and is not `Clone`. The scratch
/// map is single-writer by convention (the owning worker); its lock exists
/// because handlers share the wrapper by reference, not because concurrent
/// writers are supported.
pub struct Request {
    inner: RawRequest,
    path_params: Mutex<PathParams>,
    scratch: Mutex<HashMap<String, String>>,
}

impl Request {
    /// Wrap a transport request, taking ownership of it.
    pub fn new(inner: RawRequest) -> Self {
        Self {
            inner,
            path_params: Mutex::new(PathParams::new()),
            scratch: Mutex::new(HashMap::new()),
        }
    }

    /// HTTP method, exactly as the transport delivered it.
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Full URI including any query string.
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// Path component of the URI, query stripped.
    pub fn path(&self) -> &str {
        uri::get_path(&self.inner.uri)
    }

    /// Protocol version, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Raw request body.
    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    /// Request body as text (lossy for non-UTF-8 bytes).
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.body).into_owned()
    }

    /// All values for `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Vec<&str> {
        self.inner
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Every header, in transport order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.inner.headers
    }

    /// Query parameters as `(name, value)` pairs, not URL-decoded.
    pub fn query_parameters(&self) -> Vec<(String, String)> {
        uri::get_query_parameters(&self.inner.uri)
    }

    pub fn content_type(&self) -> Vec<&str> {
        self.header("Content-Type")
    }

    pub fn cookies(&self) -> Vec<&str> {
        self.header("Cookie")
    }

    pub fn authorization(&self) -> Vec<&str> {
        self.header("Authorization")
    }

    pub fn connection(&self) -> Vec<&str> {
        self.header("Connection")
    }

    /// Whether any `Connection` value equals `keep-alive`, case-insensitively.
    pub fn keep_alive(&self) -> bool {
        self.connection()
            .iter()
            .any(|v| v.trim().eq_ignore_ascii_case("keep-alive"))
    }

    /// Captured path parameters from the route that matched.
    pub fn path_params(&self) -> PathParams {
        self.path_params.lock().unwrap().clone()
    }

    /// Last capture with the given name (duplicate names keep the deepest
    /// segment).
    pub fn path_param(&self, name: &str) -> Option<String> {
        self.path_params
            .lock()
            .unwrap()
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Store captures. Called by the route that matched, under the params
    /// lock.
    pub fn set_path_params(&self, params: PathParams) {
        *self.path_params.lock().unwrap() = params;
    }

    /// Set a scratch entry for later handlers in the chain.
    pub fn set_param(&self, key: impl Into<String>, value: impl Into<String>) {
        self.scratch.lock().unwrap().insert(key.into(), value.into());
    }

    /// Read a scratch entry.
    pub fn get_param(&self, key: &str) -> Option<String> {
        self.scratch.lock().unwrap().get(key).cloned()
    }

    /// Snapshot of the whole scratch map.
    pub fn get_params(&self) -> HashMap<String, String> {
        self.scratch.lock().unwrap().clone()
    }

    /// Remove a scratch entry, returning its value.
    pub fn remove_param(&self, key: &str) -> Option<String> {
        self.scratch.lock().unwrap().remove(key)
    }

    /// Clear the scratch map.
    pub fn clear_params(&self) {
        self.scratch.lock().unwrap().clear();
    }
}
