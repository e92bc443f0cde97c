//! Shared test utilities for statekeeper
//!
//! Provides an in-process WebDAV stub: PROPFIND/MKCOL on the collection,
//! PUT/GET/DELETE on entries, all backed by a shared in-memory map so tests
//! can seed and inspect the remote directory directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use statekeeper::RemoteConfig;

pub type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

pub struct WebdavStub {
    pub url: String,
    pub files: Files,
}

impl WebdavStub {
    /// Entry names currently held by the stub, unordered.
    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn insert(&self, name: &str, contents: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), contents);
    }
}

pub async fn spawn_webdav_stub() -> WebdavStub {
    let files: Files = Arc::default();
    let app = Router::new()
        .route("/storage/", any(collection))
        .route("/storage/{name}", any(entry))
        .with_state(files.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    WebdavStub { url, files }
}

pub fn remote_config(stub: &WebdavStub) -> RemoteConfig {
    RemoteConfig {
        url: stub.url.clone(),
        user: "agent".to_string(),
        password: "secret".to_string(),
        dir: "storage".to_string(),
    }
}

async fn collection(State(files): State<Files>, method: Method) -> Response {
    match method.as_str() {
        "PROPFIND" => {
            let files = files.lock().unwrap();
            let mut body = String::from(
                "<?xml version=\"1.0\"?>\n<d:multistatus xmlns:d=\"DAV:\">\n\
                 <d:response><d:href>/storage/</d:href></d:response>\n",
            );
            for name in files.keys() {
                body.push_str(&format!(
                    "<d:response><d:href>/storage/{name}</d:href></d:response>\n"
                ));
            }
            body.push_str("</d:multistatus>");
            (StatusCode::MULTI_STATUS, body).into_response()
        }
        "MKCOL" => StatusCode::CREATED.into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn entry(
    Path(name): Path<String>,
    State(files): State<Files>,
    method: Method,
    body: Bytes,
) -> Response {
    match method.as_str() {
        "PUT" => {
            files.lock().unwrap().insert(name, body.to_vec());
            StatusCode::CREATED.into_response()
        }
        "GET" => match files.lock().unwrap().get(&name) {
            Some(contents) => (StatusCode::OK, contents.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "DELETE" => {
            if files.lock().unwrap().remove(&name).is_some() {
                StatusCode::NO_CONTENT.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
