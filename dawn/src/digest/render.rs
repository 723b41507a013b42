//! Digest rendering
//!
//! Builds the subject line and the plain-text body from the ranked tasks.
//! The body comes from a Handlebars template: the embedded default, or a
//! user-supplied override file.

use std::path::Path;

use chrono::NaiveDate;
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::tasks::TaskRecord;

/// Product name used in subject, sender, and body
pub const BRAND_NAME: &str = "Task Dawn";

/// Closing line of every digest
pub const BRAND_TAGLINE: &str = "Ignite your day with prioritized tasks in your inbox.";

/// Built-in body template
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/digest.hbs");

/// A rendered digest, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub body: String,
}

/// Values the body template can use
#[derive(Debug, Clone, Serialize)]
pub struct DigestContext {
    pub brand: String,
    pub tagline: String,
    /// First-ranked task line, absent when there is nothing to do
    pub top: Option<String>,
    /// Remaining lines, numbered from 2
    pub stretch: Vec<String>,
    /// "N task(s) in queue"
    pub remaining: String,
}

impl DigestContext {
    pub fn new(top_tasks: &[TaskRecord], total: usize) -> Self {
        debug!(top = top_tasks.len(), total, "DigestContext::new: called");
        let (top, stretch) = match top_tasks.split_first() {
            Some((first, rest)) => (
                Some(format_task_line(first, None)),
                rest.iter()
                    .enumerate()
                    .map(|(idx, task)| format_task_line(task, Some(idx + 2)))
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        Self {
            brand: BRAND_NAME.to_string(),
            tagline: BRAND_TAGLINE.to_string(),
            top,
            stretch,
            remaining: format!("{} task{} in queue", total, if total == 1 { "" } else { "s" }),
        }
    }
}

/// Renders digests from a body template
pub struct DigestRenderer {
    hbs: Handlebars<'static>,
    template: String,
}

impl DigestRenderer {
    /// Renderer using the built-in template
    pub fn new() -> Self {
        debug!("DigestRenderer::new: called");
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Renderer using a custom template string
    pub fn with_template(template: impl Into<String>) -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self {
            hbs,
            template: template.into(),
        }
    }

    /// Renderer using a template file, or the built-in one when `path` is None
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        debug!(?path, "DigestRenderer::from_path: called");
        match path {
            Some(path) => {
                let template = std::fs::read_to_string(path)
                    .map_err(|e| eyre!("Failed to read digest template {}: {}", path.display(), e))?;
                Ok(Self::with_template(template))
            }
            None => Ok(Self::new()),
        }
    }

    /// Render the digest for `top_tasks` out of `total` open tasks
    pub fn render(&self, top_tasks: &[TaskRecord], total: usize, today: NaiveDate) -> Result<Digest> {
        debug!(top = top_tasks.len(), total, %today, "DigestRenderer::render: called");
        let context = DigestContext::new(top_tasks, total);
        let body = self
            .hbs
            .render_template(&self.template, &context)
            .map_err(|e| eyre!("Failed to render digest template: {}", e))?;

        Ok(Digest {
            subject: subject_for(today),
            body: body.trim_end_matches('\n').to_string(),
        })
    }
}

impl Default for DigestRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// "Task Dawn - Mon, Oct 19"
pub fn subject_for(today: NaiveDate) -> String {
    format!("{} - {}", BRAND_NAME, today.format("%a, %b %-d"))
}

/// "Due: Oct 19", or empty when there is no due date
pub fn format_due_date(due: Option<NaiveDate>) -> String {
    match due {
        Some(date) => format!("Due: {}", date.format("%b %-d")),
        None => String::new(),
    }
}

/// One task line, optionally numbered
pub fn format_task_line(task: &TaskRecord, index: Option<usize>) -> String {
    let prefix = index.map(|i| format!("{}. ", i)).unwrap_or_default();
    let due = format_due_date(task.due);
    if due.is_empty() {
        format!("{}{}", prefix, task.title)
    } else {
        format!("{}{} ({})", prefix, task.title, due)
    }
}
