//! Authenticated client for the SwipeList API.
//!
//! # Design
//! `SwipeListClient` owns the session (access and refresh token) and a
//! `Transport`. Every call goes through `request`, which attaches the bearer
//! token, and on a 401 refreshes the session once and replays the identical
//! request. Item mutations are read-modify-write: the service only accepts
//! the complete items array of a list, so each one fetches the list, edits
//! the array locally (see `items`) and PUTs it back.
//!
//! The token fields sit behind a lock that is never held across an await.
//! Two callers hitting a 401 at the same time may both refresh; the later
//! refresh wins. No further coordination is attempted.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::endpoints::{
    list_path, normalize_lists, parse_json, parse_list, parse_session, with_bearer, Endpoints,
    ENDPOINT_LISTS,
};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpResponse};
use crate::items::{append_item, apply_update, remove_item, ItemUpdate};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{CreateList, Item, ReplaceItems, SessionInfo, ShoppingList};

#[derive(Debug, Default, Clone)]
struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

pub struct SwipeListClient<T = ReqwestTransport> {
    endpoints: Endpoints,
    transport: T,
    session: RwLock<Session>,
}

impl SwipeListClient<ReqwestTransport> {
    /// Client over a pooled `reqwest` transport.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(&config.base_url, transport))
    }
}

impl<T: Transport> SwipeListClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            endpoints: Endpoints::new(base_url),
            transport,
            session: RwLock::new(Session::default()),
        }
    }

    /// Resume a session from previously stored tokens.
    #[must_use]
    pub fn with_tokens(self, access_token: Option<String>, refresh_token: Option<String>) -> Self {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Session {
            access_token,
            refresh_token,
        };
        self
    }

    pub fn base_url(&self) -> &str {
        self.endpoints.base_url()
    }

    /// Current access token; changes after a refresh.
    pub fn token(&self) -> Option<String> {
        self.session().access_token
    }

    /// Current refresh token; the service may rotate it on refresh.
    pub fn refresh_token(&self) -> Option<String> {
        self.session().refresh_token
    }

    fn session(&self) -> Session {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn store_session(&self, info: &SessionInfo, keep_refresh_token: bool) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        session.access_token = info.access_token().map(str::to_string);
        match info.refresh_token() {
            Some(token) => session.refresh_token = Some(token.to_string()),
            None if !keep_refresh_token => session.refresh_token = None,
            None => {}
        }
    }

    /// Exchange credentials for a session. The raw response body, including
    /// any user identity fields, is returned to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<SessionInfo> {
        let request = self.endpoints.build_login(email, password)?;
        let response = self.transport.execute(request).await?;
        if response.status == 401 {
            warn!("login rejected");
            return Err(ApiError::Auth("invalid email or password".into()));
        }
        let info = parse_session(response)?;
        self.store_session(&info, false);
        debug!(user_id = ?info.user_id(), "authenticated");
        Ok(info)
    }

    /// Trade the refresh token for a new access token.
    ///
    /// Never fails: any problem, including the absence of a refresh token,
    /// reads as `false` and leaves the session as it was.
    pub async fn refresh_session(&self) -> bool {
        let Some(refresh_token) = self.refresh_token() else {
            debug!("no refresh token held");
            return false;
        };
        let request = match self.endpoints.build_refresh(&refresh_token) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "could not build refresh request");
                return false;
            }
        };
        let info = match self.transport.execute(request).await.and_then(parse_session) {
            Ok(info) => info,
            Err(err) => {
                debug!(error = %err, "session refresh failed");
                return false;
            }
        };
        if info.access_token().is_none() {
            debug!("refresh response carried no access token");
            return false;
        }
        self.store_session(&info, true);
        debug!("session refreshed");
        true
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<HttpResponse> {
        let request = self.endpoints.build(method, path, body)?;
        let token = self.token();
        self.transport.execute(with_bearer(request, token.as_deref())).await
    }

    /// Perform an authenticated call and decode the JSON response.
    ///
    /// A 401 triggers one session refresh followed by one replay of the same
    /// request. If the refresh fails the call fails with `ApiError::Auth`; a
    /// second 401 on the replay is reported as a plain `HttpError`.
    #[instrument(skip(self, body))]
    pub async fn request<B: Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Value> {
        let response = self.send(method, path, body).await?;
        if response.status != 401 {
            return parse_json(response);
        }

        debug!("access token rejected, refreshing session");
        if !self.refresh_session().await {
            warn!("session expired and could not be refreshed");
            return Err(ApiError::Auth("session expired".into()));
        }
        parse_json(self.send(method, path, body).await?)
    }

    async fn get(&self, path: &str) -> ApiResult<Value> {
        self.request::<Value>(HttpMethod::Get, path, None).await
    }

    pub async fn get_lists(&self) -> ApiResult<Vec<ShoppingList>> {
        let lists = normalize_lists(self.get(ENDPOINT_LISTS).await?);
        debug!(count = lists.len(), "fetched lists");
        Ok(lists)
    }

    pub async fn get_list(&self, list_id: &str) -> ApiResult<ShoppingList> {
        parse_list(self.get(&list_path(list_id)).await?)
    }

    /// The service has no items endpoint; items come embedded in the list.
    pub async fn get_list_items(&self, list_id: &str) -> ApiResult<Vec<Item>> {
        Ok(self.get_list(list_id).await?.parsed_items())
    }

    async fn put_items(&self, list_id: &str, items: Vec<Item>) -> ApiResult<ShoppingList> {
        let body = ReplaceItems { items };
        let value = self
            .request(HttpMethod::Put, &list_path(list_id), Some(&body))
            .await?;
        parse_list(value)
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        list_id: &str,
        name: &str,
        quantity: Option<String>,
        category: Option<String>,
    ) -> ApiResult<ShoppingList> {
        let mut items = self.get_list_items(list_id).await?;
        let item = append_item(&mut items, name, quantity, category);
        debug!(item_id = ?item.id_string(), "appending item");
        self.put_items(list_id, items).await
    }

    /// Change the given fields of one item. Fails with `ItemNotFound`, and
    /// writes nothing, when the list has no item with that id.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        checked: Option<bool>,
        name: Option<String>,
        quantity: Option<String>,
    ) -> ApiResult<ShoppingList> {
        let mut items = self.get_list_items(list_id).await?;
        let update = ItemUpdate {
            checked,
            name,
            quantity,
        };
        if !apply_update(&mut items, item_id, &update) {
            return Err(item_not_found(list_id, item_id));
        }
        self.put_items(list_id, items).await
    }

    /// Remove one item. Fails with `ItemNotFound`, and writes nothing, when
    /// the list has no item with that id.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, list_id: &str, item_id: &str) -> ApiResult<()> {
        let mut items = self.get_list_items(list_id).await?;
        if !remove_item(&mut items, item_id) {
            return Err(item_not_found(list_id, item_id));
        }
        self.put_items(list_id, items).await?;
        Ok(())
    }

    pub async fn check_item(&self, list_id: &str, item_id: &str, checked: bool) -> ApiResult<ShoppingList> {
        self.update_item(list_id, item_id, Some(checked), None, None).await
    }

    pub async fn create_list(&self, name: &str) -> ApiResult<ShoppingList> {
        let body = CreateList {
            name: name.to_string(),
        };
        parse_list(self.request(HttpMethod::Post, ENDPOINT_LISTS, Some(&body)).await?)
    }
}

fn item_not_found(list_id: &str, item_id: &str) -> ApiError {
    ApiError::ItemNotFound {
        list_id: list_id.to_string(),
        item_id: item_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpRequest;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<ApiResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<ApiResult<HttpResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        async fn execute(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    fn ok(status: u16, body: Value) -> ApiResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn raw(status: u16, body: &str) -> ApiResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn client(responses: Vec<ApiResult<HttpResponse>>) -> SwipeListClient<Scripted> {
        SwipeListClient::with_transport("http://api.test", Scripted::new(responses))
            .with_tokens(Some("old".into()), Some("refresh-1".into()))
    }

    fn list_with_items(items: Value) -> Value {
        json!({"id": 5, "name": "Groceries", "items": items.to_string()})
    }

    fn put_body(request: &HttpRequest) -> Value {
        serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn authenticate_stores_tokens_and_returns_body() {
        let body = json!({"accessToken": "a1", "refreshToken": "r1", "user": {"id": 9}});
        let client = SwipeListClient::with_transport("http://api.test", Scripted::new(vec![ok(200, body.clone())]));

        let info = client.authenticate("a@b.c", "pw").await.unwrap();

        assert_eq!(info.raw, body);
        assert_eq!(client.token().as_deref(), Some("a1"));
        assert_eq!(client.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn authenticate_401_is_auth_error() {
        let client = client(vec![raw(401, "nope")]);
        let err = client.authenticate("a@b.c", "bad").await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn authenticate_other_status_is_api_error() {
        let client = client(vec![raw(502, "bad gateway")]);
        let err = client.authenticate("a@b.c", "pw").await.unwrap_err();
        assert!(!err.is_auth());
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn refresh_without_token_makes_no_call() {
        let transport = Scripted::new(Vec::new());
        let client = SwipeListClient::with_transport("http://api.test", transport);
        assert!(!client.refresh_session().await);
        assert!(client.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token_when_not_rotated() {
        let client = client(vec![ok(200, json!({"token": "new"}))]);
        assert!(client.refresh_session().await);
        assert_eq!(client.token().as_deref(), Some("new"));
        assert_eq!(client.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn refresh_failure_returns_false() {
        let client = client(vec![raw(401, "")]);
        assert!(!client.refresh_session().await);
        assert_eq!(client.token().as_deref(), Some("old"));

        let client = self::client(vec![Err(ApiError::Connection("refused".into()))]);
        assert!(!client.refresh_session().await);
    }

    #[tokio::test]
    async fn request_retries_once_after_refresh() {
        let client = client(vec![
            raw(401, "expired"),
            ok(200, json!({"accessToken": "new", "refreshToken": "refresh-2"})),
            ok(200, json!([{"id": 1}])),
        ]);

        let value = client.request::<Value>(HttpMethod::Get, "/lists", None).await.unwrap();

        assert_eq!(value, json!([{"id": 1}]));
        let requests = client.transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header("authorization"), Some("Bearer old"));
        assert_eq!(requests[1].path, "http://api.test/auth/refresh");
        assert_eq!(requests[2].path, "http://api.test/lists");
        assert_eq!(requests[2].header("authorization"), Some("Bearer new"));
        assert_eq!(client.refresh_token().as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn request_fails_with_auth_error_when_refresh_fails() {
        let client = client(vec![raw(401, "expired"), raw(401, "refresh revoked")]);
        let err = client.request::<Value>(HttpMethod::Get, "/lists", None).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(client.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn second_401_is_not_retried_again() {
        let client = client(vec![raw(401, ""), ok(200, json!({"token": "new"})), raw(401, "still no")]);
        let err = client.request::<Value>(HttpMethod::Get, "/lists", None).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(client.transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn request_maps_statuses() {
        let client = client(vec![raw(204, ""), raw(404, "missing")]);
        let empty = client.request::<Value>(HttpMethod::Get, "/lists/1", None).await.unwrap();
        assert_eq!(empty, json!({}));
        let err = client.request::<Value>(HttpMethod::Get, "/lists/2", None).await.unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 404, ref body } if body == "missing"));
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let client = client(vec![Err(ApiError::Timeout(Duration::from_secs(30)))]);
        let err = client.get_lists().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
    }

    #[tokio::test]
    async fn get_lists_unwraps_lists_key() {
        let client = client(vec![ok(200, json!({"lists": [{"id": 1}, {"id": 2}]}))]);
        let lists = client.get_lists().await.unwrap();
        assert_eq!(lists.len(), 2);
    }

    #[tokio::test]
    async fn add_item_puts_full_array_with_new_item() {
        let existing = json!([{"id": "a", "name": "Milk", "checked": true, "isChecked": true}]);
        let client = client(vec![ok(200, list_with_items(existing)), ok(200, json!({"id": 5}))]);

        client
            .add_item("5", "Bread", Some("2".into()), None)
            .await
            .unwrap();

        let requests = client.transport.requests();
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].path, "http://api.test/lists/5");
        let items = put_body(&requests[1])["items"].clone();
        assert_eq!(items.as_array().unwrap().len(), 2);
        assert_eq!(items[0]["id"], "a");
        assert_eq!(items[1]["name"], "Bread");
        assert_eq!(items[1]["quantity"], "2");
        assert_eq!(items[1]["checked"], false);
        assert_ne!(items[1]["id"], "a");
    }

    #[tokio::test]
    async fn add_item_writes_back_loosely_typed_items_untouched() {
        let existing = json!([
            {"id": "x", "checked": 1},
            {"id": "y", "name": "Eggs", "category": {"id": 2, "name": "Dairy"}},
            {"id": "z", "name": 42},
            "junk"
        ]);
        let client = client(vec![
            ok(200, list_with_items(existing.clone())),
            ok(200, json!({"id": 5})),
            ok(200, list_with_items(existing)),
            ok(200, json!({"id": 5})),
        ]);

        client.add_item("5", "Bread", None, None).await.unwrap();
        let items = put_body(&client.transport.requests()[1])["items"].clone();
        assert_eq!(items.as_array().unwrap().len(), 5);
        assert_eq!(items[0], json!({"id": "x", "checked": 1}));
        assert_eq!(items[1], json!({"id": "y", "name": "Eggs", "category": {"id": 2, "name": "Dairy"}}));
        assert_eq!(items[2], json!({"id": "z", "name": 42}));
        assert_eq!(items[3], json!("junk"));
        assert_eq!(items[4]["name"], "Bread");

        client.check_item("5", "x", false).await.unwrap();
        let items = put_body(&client.transport.requests()[3])["items"].clone();
        assert_eq!(items[0], json!({"id": "x", "checked": false, "isChecked": false}));
        assert_eq!(items[2], json!({"id": "z", "name": 42}));
    }

    #[tokio::test]
    async fn update_item_sets_both_flags() {
        let existing = json!([
            {"id": 1, "name": "Milk", "checked": false},
            {"id": 2, "name": "Bread", "quantity": "1", "note": "rye"}
        ]);
        let client = client(vec![ok(200, list_with_items(existing)), ok(200, json!({"id": 5}))]);

        client.check_item("5", "2", true).await.unwrap();

        let items = put_body(&client.transport.requests()[1])["items"].clone();
        assert_eq!(items[0], json!({"id": 1, "name": "Milk", "checked": false}));
        assert_eq!(
            items[1],
            json!({"id": 2, "name": "Bread", "quantity": "1", "note": "rye", "checked": true, "isChecked": true})
        );
    }

    #[tokio::test]
    async fn update_unknown_item_writes_nothing() {
        let client = client(vec![ok(200, list_with_items(json!([{"id": "a"}])))]);
        let err = client
            .update_item("5", "zzz", Some(true), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ItemNotFound { .. }));
        assert_eq!(client.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn delete_item_keeps_order() {
        let existing = json!([{"id": "a"}, {"id": "b"}, {"id": "c"}]);
        let client = client(vec![ok(200, list_with_items(existing)), raw(204, "")]);

        client.delete_item("5", "b").await.unwrap();

        let items = put_body(&client.transport.requests()[1])["items"].clone();
        assert_eq!(items, json!([{"id": "a"}, {"id": "c"}]));
    }

    #[tokio::test]
    async fn create_list_posts_name() {
        let client = client(vec![ok(201, json!({"id": 8, "name": "Hardware", "items": []}))]);
        let list = client.create_list("Hardware").await.unwrap();
        assert_eq!(list.name(), Some("Hardware"));
        let request = &client.transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(put_body(request), json!({"name": "Hardware"}));
    }
}
