//! Task ranking
//!
//! Orders tasks by three keys, most significant first:
//!
//! 1. urgent titles (containing "urgent", any case)
//! 2. overdue tasks (due strictly before today)
//! 3. oldest update first; tasks with no timestamp go last
//!
//! The sort is stable, so tasks tied on all three keep their input order.

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::debug;

use crate::tasks::TaskRecord;

/// Recency tier; known timestamps sort before unknown ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Recency {
    At(DateTime<Utc>),
    Unknown,
}

/// Sort key for one task; smaller ranks first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    not_urgent: bool,
    not_overdue: bool,
    recency: Recency,
}

impl RankKey {
    fn of(task: &TaskRecord, today: NaiveDate) -> Self {
        Self {
            not_urgent: !task.is_urgent(),
            not_overdue: !task.is_overdue(today),
            recency: task.created_or_updated.map_or(Recency::Unknown, Recency::At),
        }
    }
}

/// Rank tasks against the local calendar date
pub fn rank_tasks(tasks: Vec<TaskRecord>) -> Vec<TaskRecord> {
    rank_tasks_on(tasks, Local::now().date_naive())
}

/// Rank tasks against an explicit `today`
pub fn rank_tasks_on(mut tasks: Vec<TaskRecord>, today: NaiveDate) -> Vec<TaskRecord> {
    debug!(count = tasks.len(), %today, "rank_tasks_on: called");
    tasks.sort_by_cached_key(|task| RankKey::of(task, today));
    tasks
}
