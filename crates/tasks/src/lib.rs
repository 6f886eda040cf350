//! Taskdeck tasks for Rust
//!
//! REST bindings for the `/tasks` endpoints and [`TaskSync`], which keeps a
//! local mirror of the signed-in user's tasks consistent with the server.

pub mod api;
mod error;
pub mod filter;
pub mod models;
mod sync;
pub mod validation;

pub use api::TasksApi;
pub use error::TaskError;
pub use filter::{TaskFilter, TaskStats, TaskView};
pub use models::{NewTask, Task, TaskUpdate};
pub use sync::{MirrorChange, TaskSync};
pub use validation::{TaskField, ValidationError};
