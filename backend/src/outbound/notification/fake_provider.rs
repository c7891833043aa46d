//! Local HTTP server standing in for notification providers in tests.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, dev::ServerHandle, http::StatusCode, web};
use serde_json::Value;

/// One request seen by the fake provider.
#[derive(Debug, Clone)]
pub(super) struct Captured {
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: Value,
}

type Replies = HashMap<String, (StatusCode, Value)>;

#[derive(Clone)]
struct ProviderState {
    replies: Arc<Replies>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn capture(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<ProviderState>,
) -> HttpResponse {
    let captured = Captured {
        path: req.path().to_owned(),
        query: req.query_string().to_owned(),
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state
        .captured
        .lock()
        .expect("captured mutex")
        .push(captured);
    match state.replies.get(req.path()) {
        Some((status, reply)) => HttpResponse::build(*status).json(reply),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Running fake provider.
pub(super) struct FakeProvider {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
    handle: ServerHandle,
}

impl FakeProvider {
    /// Serve `replies`, keyed by request path, on an ephemeral port.
    pub fn start(replies: impl IntoIterator<Item = (&'static str, StatusCode, Value)>) -> Self {
        let replies: Replies = replies
            .into_iter()
            .map(|(path, status, body)| (path.to_owned(), (status, body)))
            .collect();
        let state = ProviderState {
            replies: Arc::new(replies),
            captured: Arc::new(Mutex::new(Vec::new())),
        };
        let captured = state.captured.clone();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake provider");
        let addr = listener.local_addr().expect("fake provider addr");
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .default_service(web::to(capture))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen")
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            base_url: format!("http://{addr}"),
            captured,
            handle,
        }
    }

    /// Requests received so far.
    pub fn captured(&self) -> Vec<Captured> {
        self.captured.lock().expect("captured mutex").clone()
    }

    /// Stop serving.
    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
