//! Slack Exception Notifier - posts application exceptions to a Slack webhook
//!
//! This library formats a captured exception and its request context into a
//! Slack attachment and delivers it through an incoming webhook. A notifier
//! whose webhook client cannot be built stays inert instead of failing.
pub mod config;
pub mod core;
pub mod formatting;
pub mod notification;

// Re-export core types for convenience
pub use crate::core::*;
pub use config::NotifierConfig;
pub use notification::{notifier::SlackNotifier, NotifierError};
