//! Intercepted HTTP client
//!
//! [`ApiClient`] is the only way the core talks to the backend: every call
//! runs through the [`RequestInterceptor`] and [`ResponseInterceptor`].

use crate::error::{Result, SessionError};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
    timeout: Duration,
    request_interceptor: Arc<RequestInterceptor>,
    response_interceptor: Arc<ResponseInterceptor>,
}

impl ApiClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: Url,
        timeout: Duration,
        request_interceptor: Arc<RequestInterceptor>,
        response_interceptor: Arc<ResponseInterceptor>,
    ) -> Self {
        Self {
            http,
            base_url,
            timeout,
            request_interceptor,
            response_interceptor,
        }
    }

    /// Absolute URL for an endpoint path.
    ///
    /// The path is appended to the base URL's own path, so a base of
    /// `http://host/api` and `/health` give `http://host/api/health`.
    pub fn endpoint_url(&self, path: &str) -> Result<String> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));

        Url::parse(&joined)
            .map(String::from)
            .map_err(|e| SessionError::RequestBuild(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Send a prepared request through both interceptors.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path()))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut request = self.request_interceptor.intercept(request).await;
        if request.timeout.is_none() {
            request = request.timeout(self.timeout);
        }

        let path = request.path();
        let outcome = self.http.execute(request).await;

        self.response_interceptor.intercept(&path, outcome).await
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Get, path, None::<&()>)?;
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Delete, path, None::<&()>)?;
        self.send(request).await
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Post, path, Some(body))?;
        self.send(request).await
    }

    pub async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse> {
        let request = self.build(HttpMethod::Put, path, Some(body))?;
        self.send(request).await
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        response
            .json()
            .map_err(|e| SessionError::Decode(e.to_string()))
    }

    fn build<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest> {
        let url = self
            .endpoint_url(path)
            .map_err(|e| self.request_interceptor.on_request_error(e))?;
        let request = HttpRequest::new(method, url);

        match body {
            Some(body) => request.json(body).map_err(|e| {
                self.request_interceptor
                    .on_request_error(SessionError::RequestBuild(e.to_string()))
            }),
            None => Ok(request),
        }
    }
}
