//! Task retrieval
//!
//! [`TaskService`] is the seam to the remote service, [`GoogleTasksClient`]
//! its production implementation, and [`TaskSource`] the adapter that turns
//! raw service payloads into validated [`TaskRecord`]s.

mod error;
mod google;
pub mod service;
mod source;
mod types;

pub use error::TasksError;
pub use google::GoogleTasksClient;
pub use service::TaskService;
pub use source::TaskSource;
pub use types::{
    DEFAULT_LIST_ID, MAX_RESULTS, NEEDS_ACTION, TaskListDescriptor, TaskQuery, TaskRecord, ValidationError, parse_due,
    parse_timestamp,
};
