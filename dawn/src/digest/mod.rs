//! Daily digest
//!
//! Renders the ranked tasks into an email-ready digest and hands it to a
//! [`Notifier`].

mod notify;
mod render;

pub use notify::{Notifier, NotifyError, SmtpMailer, StdoutNotifier};
pub use render::{
    BRAND_NAME, BRAND_TAGLINE, DEFAULT_TEMPLATE, Digest, DigestContext, DigestRenderer, format_due_date,
    format_task_line, subject_for,
};
