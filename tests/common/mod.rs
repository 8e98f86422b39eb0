//! Mock generation backend for integration tests.
//!
//! A `tiny_http` server on an ephemeral port, answering every request through
//! a test-supplied handler and recording what it received.
#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value;
use tiny_http::{Header, Response, Server, StatusCode};

use deckgen::activity::ActivityLog;
use deckgen::config::DeckgenConfig;
use deckgen::identity::IdentityStore;
use deckgen::{HttpBackend, Session};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub enum Reply {
    Json(u16, Value),
    Bytes(u16, &'static str, Vec<u8>),
    /// Wait before answering.
    Slow(Duration, Box<Reply>),
}

pub fn ok(body: Value) -> Reply {
    Reply::Json(200, body)
}

type Handler = dyn Fn(&Recorded) -> Reply + Send + Sync;

pub struct MockServer {
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    pub base_url: String,
}

impl MockServer {
    pub fn start(handler: impl Fn(&Recorded) -> Reply + Send + Sync + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock server listens on TCP");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let thread = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let url = request.url().to_string();
                    let (path, query) = match url.split_once('?') {
                        Some((p, q)) => (p.to_string(), q.to_string()),
                        None => (url.clone(), String::new()),
                    };
                    let content_type = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Content-Type"))
                        .map(|h| h.value.as_str().to_string());
                    let mut body = Vec::new();
                    let _ = request.as_reader().read_to_end(&mut body);

                    let recorded = Recorded {
                        method: request.method().to_string(),
                        path,
                        query,
                        content_type,
                        body,
                    };
                    requests.lock().unwrap().push(recorded.clone());

                    let mut reply = handler(&recorded);
                    while let Reply::Slow(delay, inner) = reply {
                        thread::sleep(delay);
                        reply = *inner;
                    }
                    let response = match reply {
                        Reply::Json(code, value) => {
                            respond_with(code, "application/json", value.to_string().into_bytes())
                        }
                        Reply::Bytes(code, ct, data) => respond_with(code, ct, data),
                        Reply::Slow(..) => unreachable!(),
                    };
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            thread: Some(thread),
            requests,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// A config pointing at this server with short timeouts and polling.
    pub fn config(&self) -> DeckgenConfig {
        let mut config = DeckgenConfig::default();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_ms = 2_000;
        config.batch.poll_interval_ms = 10;
        config.batch.max_polls = 20;
        config
    }

    /// A session against this server with identity and log files under `dir`.
    pub fn session(&self, dir: &std::path::Path) -> Session<HttpBackend> {
        self.session_with(self.config(), dir)
    }

    pub fn session_with(&self, config: DeckgenConfig, dir: &std::path::Path) -> Session<HttpBackend> {
        let log = ActivityLog::new(dir.join("activity.jsonl"));
        let backend = HttpBackend::from_config(&config.api, log.clone());
        Session::new(backend, config)
            .with_identity(IdentityStore::new(dir.join("user-id")))
            .with_activity_log(log)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn respond_with(code: u16, content_type: &str, data: Vec<u8>) -> Response<std::io::Cursor<Vec<u8>>> {
    let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .expect("valid content-type header");
    Response::from_data(data)
        .with_status_code(StatusCode(code))
        .with_header(header)
}
