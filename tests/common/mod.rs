#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use switchyard::server::transport::{
    RawRequest, RequestSink, ResponseParts, ResponseWriter, Transport,
};

/// Everything a [`RecordingWriter`] observed for one response.
#[derive(Default)]
pub struct WriterState {
    pub sent: Vec<ResponseParts>,
    pub send_calls: usize,
    pub end_calls: usize,
    pub fail_send: bool,
}

impl WriterState {
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.sent[0].body).into_owned()
    }

    pub fn header<'a>(&'a self, name: &str) -> Vec<&'a str> {
        self.sent[0]
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Transport-side writer that records sends and ends instead of touching a
/// socket.
pub struct RecordingWriter {
    state: Arc<Mutex<WriterState>>,
}

impl RecordingWriter {
    pub fn new() -> (Self, Arc<Mutex<WriterState>>) {
        let state = Arc::new(Mutex::new(WriterState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }

    /// A writer whose send primitive always fails with `BrokenPipe`.
    pub fn failing() -> (Self, Arc<Mutex<WriterState>>) {
        let (writer, state) = Self::new();
        state.lock().unwrap().fail_send = true;
        (writer, state)
    }
}

impl ResponseWriter for RecordingWriter {
    fn send(&mut self, parts: &ResponseParts) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.send_calls += 1;
        if state.fail_send {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
        }
        state.sent.push(parts.clone());
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().end_calls += 1;
        Ok(())
    }
}

pub fn raw_request(method: &str, uri: &str) -> RawRequest {
    raw_request_with(method, uri, &[], b"")
}

pub fn raw_request_with(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> RawRequest {
    RawRequest {
        method: method.to_string(),
        uri: uri.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.to_vec(),
    }
}

/// Install the test tracing subscriber once per process, honoring `RUST_LOG`.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// In-process transport: hands the sink back to the test instead of opening a
/// listener.
#[derive(Clone, Default)]
pub struct MockTransport {
    sink: Arc<Mutex<Option<Arc<dyn RequestSink>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink installed by `start`. Panics if the server is not listening.
    pub fn sink(&self) -> Arc<dyn RequestSink> {
        self.sink
            .lock()
            .unwrap()
            .clone()
            .expect("transport not started")
    }
}

impl Transport for MockTransport {
    fn start(&mut self, sink: Arc<dyn RequestSink>) -> io::Result<()> {
        sink.on_listen_success();
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.sink.lock().unwrap().take();
        Ok(())
    }
}
