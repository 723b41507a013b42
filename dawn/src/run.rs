//! One daily run: fetch, rank, render, deliver

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use eyre::{Context, Result};
use tracing::{debug, info};

use crate::config::DigestConfig;
use crate::digest::{Digest, DigestRenderer, Notifier};
use crate::rank::rank_tasks_on;
use crate::tasks::{TaskRecord, TaskSource};

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Today is a rest day; nothing was fetched
    Skipped { day: Weekday },
    /// A digest was delivered
    Sent { total: usize, top: Vec<TaskRecord>, digest: Digest },
}

/// Wires the task source, ranking, rendering, and delivery together
pub struct DailyRun {
    source: TaskSource,
    renderer: DigestRenderer,
    notifier: Arc<dyn Notifier>,
    digest: DigestConfig,
}

impl DailyRun {
    pub fn new(source: TaskSource, renderer: DigestRenderer, notifier: Arc<dyn Notifier>, digest: &DigestConfig) -> Self {
        debug!(top_n = digest.top_n, skip_days = ?digest.skip_days, "DailyRun::new: called");
        Self {
            source,
            renderer,
            notifier,
            digest: digest.clone(),
        }
    }

    /// Fetch and rank every open task
    pub async fn ranked(&self, today: NaiveDate) -> Result<Vec<TaskRecord>> {
        debug!(%today, "ranked: called");
        let tasks = self.source.fetch_tasks().await.context("Failed to fetch tasks")?;
        info!("Found {} uncompleted task(s)", tasks.len());
        Ok(rank_tasks_on(tasks, today))
    }

    /// Run the digest for `today`; `force` ignores rest days
    pub async fn execute(&self, today: NaiveDate, force: bool) -> Result<RunOutcome> {
        debug!(%today, force, "execute: called");
        let day = today.weekday();
        if !force && self.digest.is_rest_day(day) {
            info!("{} - skipping daily digest", day);
            return Ok(RunOutcome::Skipped { day });
        }

        let ranked = self.ranked(today).await?;
        let total = ranked.len();
        let top: Vec<TaskRecord> = ranked.into_iter().take(self.digest.top_n).collect();

        for (i, task) in top.iter().enumerate() {
            info!("Top {}: {}", i + 1, task.title);
        }

        let digest = self.renderer.render(&top, total, today)?;
        self.notifier.send(&digest).await.context("Failed to deliver digest")?;

        info!(total, top = top.len(), "Daily digest complete");
        Ok(RunOutcome::Sent { total, top, digest })
    }
}
