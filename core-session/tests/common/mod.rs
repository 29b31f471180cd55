#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::SecureStore;
use core_runtime::config::{ClientConfig, ClientConfigBuilder};
use core_runtime::events::EventBus;
use core_session::{SessionContext, SessionCredential};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://api.test:8080/api";

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Clone)]
enum Reply {
    Status(u16, String),
    Unreachable,
}

/// Backend fake answering by endpoint path (without the `/api` prefix).
/// Unscripted paths answer `200 {}`.
#[derive(Default)]
pub struct ScriptedHttp {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn reply(&self, path: &str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Status(status, body.to_string()));
    }

    pub fn unreachable(&self, path: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Unreachable);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request sent")
    }

    pub fn calls(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| endpoint(r) == path)
            .count()
    }
}

fn endpoint(request: &HttpRequest) -> String {
    let path = request.path();
    path.strip_prefix("/api").unwrap_or(&path).to_string()
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let path = endpoint(&request);
        self.requests.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().get(&path).cloned();
        match reply {
            Some(Reply::Status(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::Unreachable) => Err(BridgeError::ConnectionFailed(format!(
                "connection refused: {}",
                path
            ))),
            None => Ok(HttpResponse::new(200, "{}")),
        }
    }
}

pub struct Harness {
    pub ctx: SessionContext,
    pub http: Arc<ScriptedHttp>,
    pub store: Arc<MemoryStore>,
    pub events: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    pub fn with_config<F>(configure: F) -> Self
    where
        F: FnOnce(ClientConfigBuilder) -> ClientConfigBuilder,
    {
        let http = Arc::new(ScriptedHttp::default());
        let store = Arc::new(MemoryStore::default());
        let events = EventBus::default();

        let builder = ClientConfig::builder()
            .base_url(BASE_URL)
            .http_client(http.clone())
            .secure_store(store.clone());
        let config = configure(builder).build().expect("valid test config");

        Self {
            ctx: SessionContext::new(&config, events.clone()),
            http,
            store,
            events,
        }
    }

    pub async fn sign_in(&self, token: &str) {
        self.ctx
            .credentials()
            .store(&SessionCredential::new(token, Some(format!("{}-refresh", token))))
            .await
            .unwrap();
    }

    pub fn toast_messages(&self) -> Vec<String> {
        self.ctx
            .toasts()
            .active()
            .into_iter()
            .map(|t| t.message)
            .collect()
    }
}
