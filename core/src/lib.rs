//! Async API client core for the SwipeList shopping-list service.
//!
//! # Overview
//! Logs in with email and password, keeps the resulting access/refresh token
//! pair, and exposes the service's lists and items. The service embeds a
//! list's items inside the list resource (sometimes as a JSON-encoded
//! string) and only accepts whole-array writes, so item operations are
//! read-modify-write over `GET`/`PUT /lists/{id}`.
//!
//! # Design
//! - `Endpoints` builds `HttpRequest` values and the parse helpers consume
//!   `HttpResponse` values without touching the network.
//! - `Transport` is the only I/O seam; `ReqwestTransport` implements it for
//!   production use and tests plug in scripted transports.
//! - `SwipeListClient` owns the session and performs the single
//!   refresh-and-replay on a 401.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod items;
pub mod transport;
pub mod types;

pub use client::SwipeListClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use items::{parse_items, ItemUpdate};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Item, SessionInfo, ShoppingList};
