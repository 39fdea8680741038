use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@swipelist.test";
pub const DEMO_PASSWORD: &str = "secret";
pub const DEMO_USER_ID: u64 = 1;

/// A list as stored by the server. Items are opaque JSON objects.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredList {
    pub id: u64,
    pub name: String,
    pub items: Vec<Value>,
    #[serde(rename = "sharedWith")]
    pub shared_with: Vec<u64>,
}

impl StoredList {
    /// Wire form. Items go out JSON-encoded as a string, like the real service.
    fn to_wire(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "items": Value::Array(self.items.clone()).to_string(),
            "sharedWith": self.shared_with,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct CreateList {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ReplaceItems {
    pub items: Vec<Value>,
}

#[derive(Default)]
struct Inner {
    lists: BTreeMap<u64, StoredList>,
    next_id: u64,
    access_tokens: HashSet<String>,
    refresh_tokens: HashSet<String>,
    delay: Option<Duration>,
    refresh_calls: usize,
}

impl Inner {
    fn issue_tokens(&mut self) -> (String, String) {
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        self.access_tokens.insert(access.clone());
        self.refresh_tokens.insert(refresh.clone());
        (access, refresh)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;
        if self.access_tokens.contains(token) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Shared server state plus hooks tests use to steer it.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<RwLock<Inner>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a list owned by the demo user and return its id.
    pub async fn seed_list(&self, name: &str, items: Vec<Value>) -> u64 {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.lists.insert(
            id,
            StoredList {
                id,
                name: name.to_string(),
                items,
                shared_with: Vec::new(),
            },
        );
        id
    }

    pub async fn list(&self, id: u64) -> Option<StoredList> {
        self.inner.read().await.lists.get(&id).cloned()
    }

    /// Issue a valid token pair without going through the login route.
    pub async fn issue_tokens(&self) -> (String, String) {
        self.inner.write().await.issue_tokens()
    }

    /// Invalidate every access token; refresh tokens stay valid.
    pub async fn expire_access_tokens(&self) {
        self.inner.write().await.access_tokens.clear();
    }

    /// Invalidate every refresh token.
    pub async fn revoke_refresh_tokens(&self) {
        self.inner.write().await.refresh_tokens.clear();
    }

    /// Delay every `GET /lists` response.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.inner.write().await.delay = delay;
    }

    pub async fn refresh_calls(&self) -> usize {
        self.inner.read().await.refresh_calls
    }
}

pub fn app() -> Router {
    app_with_state(MockState::new())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/lists", get(list_lists).post(create_list))
        .route("/lists/{id}", get(get_list).put(replace_items))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Serve `state` on an ephemeral local port in the background.
pub async fn spawn(state: MockState) -> Result<SocketAddr, std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(run(listener, state));
    Ok(addr)
}

async fn login(
    State(state): State<MockState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Value>, StatusCode> {
    if input.email != DEMO_EMAIL || input.password != DEMO_PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let (access, refresh) = state.inner.write().await.issue_tokens();
    Ok(Json(json!({
        "token": access,
        "refreshToken": refresh,
        "user": {"id": DEMO_USER_ID, "email": DEMO_EMAIL},
    })))
}

async fn refresh(
    State(state): State<MockState>,
    Json(input): Json<RefreshRequest>,
) -> Result<Json<Value>, StatusCode> {
    let mut inner = state.inner.write().await;
    inner.refresh_calls += 1;
    if !inner.refresh_tokens.remove(&input.refresh_token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let (access, refresh) = inner.issue_tokens();
    Ok(Json(json!({"accessToken": access, "refreshToken": refresh})))
}

async fn list_lists(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let delay = {
        let inner = state.inner.read().await;
        inner.authorize(&headers)?;
        inner.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let inner = state.inner.read().await;
    let lists: Vec<Value> = inner.lists.values().map(StoredList::to_wire).collect();
    Ok(Json(json!({ "lists": lists })))
}

async fn get_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let inner = state.inner.read().await;
    inner.authorize(&headers)?;
    inner
        .lists
        .get(&id)
        .map(|list| Json(list.to_wire()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_items(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<ReplaceItems>,
) -> Result<Json<Value>, StatusCode> {
    let mut inner = state.inner.write().await;
    inner.authorize(&headers)?;
    let list = inner.lists.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    list.items = input.items;
    Ok(Json(list.to_wire()))
}

async fn create_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(input): Json<CreateList>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let mut inner = state.inner.write().await;
    inner.authorize(&headers)?;
    inner.next_id += 1;
    let list = StoredList {
        id: inner.next_id,
        name: input.name,
        items: Vec::new(),
        shared_with: Vec::new(),
    };
    let wire = list.to_wire();
    inner.lists.insert(list.id, list);
    Ok((StatusCode::CREATED, Json(wire)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_encodes_items_as_string() {
        let list = StoredList {
            id: 3,
            name: "Groceries".to_string(),
            items: vec![json!({"id": "a", "name": "Milk"})],
            shared_with: vec![2],
        };
        let wire = list.to_wire();
        assert_eq!(wire["id"], 3);
        assert_eq!(wire["sharedWith"], json!([2]));
        let items: Value = serde_json::from_str(wire["items"].as_str().unwrap()).unwrap();
        assert_eq!(items, json!([{"id": "a", "name": "Milk"}]));
    }

    #[test]
    fn authorize_requires_known_bearer() {
        let mut inner = Inner::default();
        let (access, _) = inner.issue_tokens();

        let mut headers = HeaderMap::new();
        assert_eq!(inner.authorize(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert_eq!(inner.authorize(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, format!("Bearer {access}").parse().unwrap());
        assert_eq!(inner.authorize(&headers), Ok(()));
    }

    #[test]
    fn replace_items_rejects_missing_items() {
        let result: Result<ReplaceItems, _> = serde_json::from_str(r#"{"name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn refresh_request_uses_camel_case() {
        let input: RefreshRequest = serde_json::from_str(r#"{"refreshToken":"r"}"#).unwrap();
        assert_eq!(input.refresh_token, "r");
    }
}
