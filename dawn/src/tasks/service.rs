//! TaskService trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::{TaskQuery, TasksError};

/// Read-only access to a remote task-list service
///
/// Both calls return raw, untyped records exactly as the service sent them;
/// validation happens in [`super::TaskSource`]. Errors carry the HTTP status
/// when the service produced one so callers can decide whether to retry.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// List every task list of the authenticated account
    async fn list_task_lists(&self) -> Result<Vec<Value>, TasksError>;

    /// List the items of one task list
    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Value>, TasksError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted response for one mock call
    #[derive(Debug, Clone)]
    pub enum Reply {
        Items(Vec<Value>),
        Status(u16),
    }

    impl Reply {
        fn into_result(self) -> Result<Vec<Value>, TasksError> {
            match self {
                Reply::Items(items) => Ok(items),
                Reply::Status(status) => Err(TasksError::Api {
                    status,
                    message: "mock failure".to_string(),
                }),
            }
        }
    }

    /// Mock task service for unit tests
    ///
    /// Each list replays its script in order and repeats the last reply once
    /// the script runs out.
    #[derive(Default)]
    pub struct MockTaskService {
        lists: Mutex<Vec<Reply>>,
        tasks: Mutex<HashMap<String, Vec<Reply>>>,
        list_calls: AtomicUsize,
        task_calls: Mutex<Vec<TaskQuery>>,
    }

    impl MockTaskService {
        pub fn new() -> Self {
            debug!("MockTaskService::new: called");
            Self::default()
        }

        pub fn with_lists(self, replies: Vec<Reply>) -> Self {
            *self.lists.lock().unwrap() = replies;
            self
        }

        pub fn with_tasks(self, list_id: &str, replies: Vec<Reply>) -> Self {
            self.tasks.lock().unwrap().insert(list_id.to_string(), replies);
            self
        }

        pub fn list_call_count(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn task_queries(&self) -> Vec<TaskQuery> {
            self.task_calls.lock().unwrap().clone()
        }

        fn next(script: &mut Vec<Reply>) -> Reply {
            if script.len() > 1 {
                script.remove(0)
            } else {
                script.first().cloned().unwrap_or(Reply::Items(vec![]))
            }
        }
    }

    #[async_trait]
    impl TaskService for MockTaskService {
        async fn list_task_lists(&self) -> Result<Vec<Value>, TasksError> {
            debug!("MockTaskService::list_task_lists: called");
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.lists.lock().unwrap();
            Self::next(&mut script).into_result()
        }

        async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Value>, TasksError> {
            debug!(list_id = %query.list_id, "MockTaskService::list_tasks: called");
            self.task_calls.lock().unwrap().push(query.clone());
            let mut tasks = self.tasks.lock().unwrap();
            match tasks.get_mut(&query.list_id) {
                Some(script) => Self::next(script).into_result(),
                None => Err(TasksError::Api {
                    status: 404,
                    message: format!("no such list: {}", query.list_id),
                }),
            }
        }
    }

    mod tests {
        use super::*;
        use serde_json::json;

        #[tokio::test]
        async fn test_mock_replays_script_then_repeats() {
            let service = MockTaskService::new().with_lists(vec![
                Reply::Status(503),
                Reply::Items(vec![json!({"id": "a", "title": "A"})]),
            ]);

            assert!(service.list_task_lists().await.is_err());
            assert_eq!(service.list_task_lists().await.unwrap().len(), 1);
            assert_eq!(service.list_task_lists().await.unwrap().len(), 1);
            assert_eq!(service.list_call_count(), 3);
        }

        #[tokio::test]
        async fn test_mock_unknown_list_is_404() {
            let service = MockTaskService::new();
            let err = service.list_tasks(&TaskQuery::open_items("nope")).await.unwrap_err();
            assert_eq!(err.status(), Some(404));
        }
    }
}
