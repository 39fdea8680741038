//! Stateless request builder and response parser for the SwipeList API.
//!
//! # Design
//! `Endpoints` holds only the base URL. Each exchange is split into a
//! `build_*` method that produces an `HttpRequest` and a parse function that
//! consumes an `HttpResponse`, so everything here is deterministic and can be
//! checked without a server. Session handling lives in `SwipeListClient`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{LoginRequest, RefreshRequest, SessionInfo, ShoppingList};

pub const ENDPOINT_LOGIN: &str = "/auth/login";
pub const ENDPOINT_REFRESH: &str = "/auth/refresh";
pub const ENDPOINT_LISTS: &str = "/lists";

/// Path of a single list resource.
pub fn list_path(list_id: &str) -> String {
    format!("{ENDPOINT_LISTS}/{list_id}")
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, email: &str, password: &str) -> ApiResult<HttpRequest> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.build(HttpMethod::Post, ENDPOINT_LOGIN, Some(&body))
    }

    pub fn build_refresh(&self, refresh_token: &str) -> ApiResult<HttpRequest> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.build(HttpMethod::Post, ENDPOINT_REFRESH, Some(&body))
    }

    /// Build a JSON request for any endpoint path.
    pub fn build<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<HttpRequest> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }
}

/// Attach a bearer token to an already built request.
pub fn with_bearer(mut request: HttpRequest, token: Option<&str>) -> HttpRequest {
    if let Some(token) = token {
        request
            .headers
            .push(("authorization".to_string(), format!("Bearer {token}")));
    }
    request
}

/// Map status codes of 400 and above to `ApiError::HttpError`.
pub fn check_status(response: &HttpResponse) -> ApiResult<()> {
    if response.status >= 400 {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        });
    }
    Ok(())
}

/// Decode a response body. 204 decodes to an empty object.
pub fn parse_json(response: HttpResponse) -> ApiResult<Value> {
    check_status(&response)?;
    if response.status == 204 {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decode the body of a login or refresh response.
pub fn parse_session(response: HttpResponse) -> ApiResult<SessionInfo> {
    if !response.is_success() {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    let raw = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok(SessionInfo { raw })
}

/// Accept a bare array or an object wrapping the array in `lists` or `data`.
pub fn normalize_lists(value: Value) -> Vec<ShoppingList> {
    let values = match value {
        Value::Array(values) => values,
        Value::Object(mut object) => match object.remove("lists").or_else(|| object.remove("data")) {
            Some(Value::Array(values)) => values,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter(Value::is_object)
        .map(ShoppingList::from)
        .collect()
}

/// Decode a single list resource. Anything but an object is rejected.
pub fn parse_list(value: Value) -> ApiResult<ShoppingList> {
    if !value.is_object() {
        return Err(ApiError::DeserializationError(format!(
            "expected a list object, got {value}"
        )));
    }
    Ok(ShoppingList::from(value))
}
