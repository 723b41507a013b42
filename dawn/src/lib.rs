//! Task Dawn - daily digest of your most important tasks
//!
//! Task Dawn pulls every open item from Google Tasks, ranks them with a small
//! fixed policy, and emails the top three each morning.
//!
//! # Ranking
//!
//! - **Urgent first**: titles containing "urgent", in any case
//! - **Then overdue**: due date before today
//! - **Then oldest**: earliest update time, unknown times last
//!
//! # Modules
//!
//! - [`tasks`] - Task service trait, Google client, and the fetching adapter
//! - [`retry`] - Bounded exponential-backoff retry
//! - [`rank`] - Task ranking
//! - [`digest`] - Digest rendering and delivery
//! - [`run`] - One daily run from fetch to delivery
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod digest;
pub mod rank;
pub mod retry;
pub mod run;
pub mod tasks;

// Re-export commonly used types
pub use config::{Config, DigestConfig, EmailConfig, GoogleConfig, Secrets};
pub use digest::{Digest, DigestRenderer, Notifier, NotifyError, SmtpMailer, StdoutNotifier};
pub use rank::{rank_tasks, rank_tasks_on};
pub use retry::{HttpStatus, RetryPolicy, is_retryable_status, with_retry};
pub use run::{DailyRun, RunOutcome};
pub use tasks::{GoogleTasksClient, TaskListDescriptor, TaskQuery, TaskRecord, TaskService, TaskSource, TasksError};
