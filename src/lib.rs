//! `quip-http` is an async HTTP client for the Quip platform API.
//!
//! [`QuipClient`] exposes one accessor per endpoint (threads, folders, users,
//! messages, PDF/DOCX/XLSX exports, blobs) on top of a single dispatcher:
//! - [`QuipClient::try_dispatch`] returns a [`QuipError`] describing failures
//! - [`QuipClient::dispatch`] logs failures and returns `None`
//!
//! HTTP 429 and 503 responses are retried against per-path budgets that live
//! as long as the client. See [`retry`] for the budget rules.

mod client;
mod error;
mod logger;
mod options;
pub mod retry;
mod stats;
mod types;

pub use client::{QuipClient, DEFAULT_API_URL};
pub use error::QuipError;
pub use logger::{Logger, TracingLogger};
pub use options::ClientOptions;
pub use reqwest::Method;
pub use stats::{Operation, StatsSnapshot};
pub use types::{Payload, PayloadKind};

pub type Result<T> = std::result::Result<T, QuipError>;
