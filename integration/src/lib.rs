//! Host glue that turns SwipeList accounts into todo lists.
//!
//! # Overview
//! - `config_flow` logs in and produces the `ConfigEntry` the host stores.
//! - `AppContext::setup_entry` builds a client from that entry and a
//!   `ListsCoordinator` that the host polls on `DEFAULT_SCAN_INTERVAL`.
//! - `SwipeListTodoEntity` exposes one list as a todo list with create,
//!   update and delete.
//!
//! Scheduling, entity registration and credential storage stay with the
//! host; this crate only provides the pieces it calls into.

pub mod config_flow;
pub mod context;
pub mod coordinator;
pub mod entry;
pub mod error;
pub mod todo;

pub use config_flow::{login, reauth, UserInput};
pub use context::{Account, AppContext, Setup};
pub use coordinator::{DataSource, ListsCoordinator, ListsSnapshot, ReauthTrigger};
pub use entry::ConfigEntry;
pub use error::{EntityError, FlowError, SetupError, UpdateFailed};
pub use swipelist_core::config::DEFAULT_SCAN_INTERVAL;
pub use todo::{SwipeListTodoEntity, TodoItem, TodoItemStatus, TodoListEntity, TodoListFeature};
