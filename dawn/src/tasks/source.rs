//! Task source adapter
//!
//! Enumerates every list of the account, pulls the open items of each one,
//! and normalizes them into [`TaskRecord`]s. Only the initial enumeration is
//! fatal; a list that cannot be read is skipped for this run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{TaskListDescriptor, TaskQuery, TaskRecord, TaskService, TasksError};
use crate::retry::{RetryPolicy, with_retry};

/// Fetches and validates open tasks from a [`TaskService`]
pub struct TaskSource {
    service: Arc<dyn TaskService>,
    retry: RetryPolicy,
}

impl TaskSource {
    pub fn new(service: Arc<dyn TaskService>, retry: RetryPolicy) -> Self {
        debug!(?retry, "TaskSource::new: called");
        Self { service, retry }
    }

    /// Fetch every open task across all lists
    ///
    /// Tasks come back in list order, then in the order the service returned
    /// them within each list.
    pub async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, TasksError> {
        debug!("fetch_tasks: called");
        let mut lists = self.task_lists().await?;

        if lists.is_empty() {
            info!("No task lists found, using @default");
            lists.push(TaskListDescriptor::default_list());
        }

        let titles = lists.iter().map(|l| l.title.as_str()).collect::<Vec<_>>().join(", ");
        info!("Found {} task list(s): {}", lists.len(), titles);

        let mut all_tasks = Vec::new();
        for list in &lists {
            match self.tasks_in(list).await {
                Ok(tasks) => {
                    debug!(list = %list.title, count = tasks.len(), "fetch_tasks: list fetched");
                    all_tasks.extend(tasks);
                }
                Err(e) => {
                    warn!(list = %list.title, error = %e, "Could not fetch tasks from list \"{}\"", list.title);
                }
            }
        }

        debug!(total = all_tasks.len(), "fetch_tasks: done");
        Ok(all_tasks)
    }

    /// All valid list descriptors; malformed ones are dropped
    async fn task_lists(&self) -> Result<Vec<TaskListDescriptor>, TasksError> {
        debug!("task_lists: called");
        let raw = with_retry(&self.retry, || self.service.list_task_lists()).await?;

        let lists = raw
            .iter()
            .filter_map(|item| match TaskListDescriptor::from_raw(item) {
                Ok(list) => Some(list),
                Err(e) => {
                    debug!(error = %e, "task_lists: dropping invalid list");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(raw = raw.len(), valid = lists.len(), "task_lists: validated");
        Ok(lists)
    }

    /// Open, valid tasks of one list
    async fn tasks_in(&self, list: &TaskListDescriptor) -> Result<Vec<TaskRecord>, TasksError> {
        debug!(list_id = %list.id, "tasks_in: called");
        let query = TaskQuery::open_items(&list.id);
        let raw = with_retry(&self.retry, || self.service.list_tasks(&query)).await?;

        let tasks = raw
            .iter()
            .filter_map(|item| match TaskRecord::from_raw(item) {
                Ok(task) if task.is_needs_action() => Some(task),
                Ok(task) => {
                    debug!(id = %task.id, status = %task.status, "tasks_in: dropping finished task");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "tasks_in: dropping invalid task");
                    None
                }
            })
            .collect();

        Ok(tasks)
    }
}
