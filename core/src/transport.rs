//! Execution of `HttpRequest` values.
//!
//! `Transport` is the single I/O seam of the crate. `ReqwestTransport` is the
//! production implementation: one pooled `reqwest::Client` with the request
//! timeout applied to every call.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a request and returns whatever the server answered.
///
/// Non-2xx statuses are data, not errors; only failures to obtain a response
/// at all (connection, DNS, timeout) are reported as `Err`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> impl Future<Output = ApiResult<HttpResponse>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("swipelist-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            inner,
            timeout: config.timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Connection(Box::new(err))
        }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.path, "sending request");

        let mut builder = self.inner.request(to_method(request.method), &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        debug!(status, "received response");
        Ok(HttpResponse { status, body })
    }
}
