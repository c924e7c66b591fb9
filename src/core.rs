//! Core domain types and service traits for the exception notifier
//!
//! This module defines the values handed to the notifier by the host
//! application's exception pipeline, and the small trait seams (clock,
//! hostname) the formatter reads from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An insertion-ordered string-keyed map of free-form values.
pub type DataMap = serde_json::Map<String, Value>;

/// A captured application exception.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExceptionReport {
    /// The exception's type name, e.g. `ArgumentError` or `TimeoutError`.
    pub type_name: String,
    /// Human-readable message.
    pub message: String,
    /// Stack frames, innermost first. `None` when no backtrace was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<Vec<String>>,
}

impl ExceptionReport {
    /// Creates a report without a backtrace.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            backtrace: None,
        }
    }

    /// Attaches a backtrace to the report.
    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = Some(frames.into_iter().map(Into::into).collect());
        self
    }

    /// Builds a report from a Rust error value, naming it after its type.
    ///
    /// The type name is the last path segment of [`std::any::type_name`],
    /// with generic arguments dropped (`std::io::error::Error` becomes `Error`).
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    /// Returns the backtrace only when it holds at least one frame.
    pub fn frames(&self) -> Option<&[String]> {
        self.backtrace.as_deref().filter(|frames| !frames.is_empty())
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// The controller/action pair that was handling a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControllerRef {
    pub controller_name: String,
    pub action_name: String,
}

/// Request environment captured alongside an exception.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RequestEnv {
    /// HTTP method, e.g. `GET`.
    pub request_method: String,
    /// Full request URI.
    pub request_uri: String,
    /// The request handler, if the framework exposed one.
    #[serde(default)]
    pub controller: Option<ControllerRef>,
    /// Framework-provided data attached to the request.
    #[serde(default)]
    pub exception_data: Option<DataMap>,
}

impl RequestEnv {
    pub fn new(request_method: impl Into<String>, request_uri: impl Into<String>) -> Self {
        Self {
            request_method: request_method.into(),
            request_uri: request_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_controller(
        mut self,
        controller_name: impl Into<String>,
        action_name: impl Into<String>,
    ) -> Self {
        self.controller = Some(ControllerRef {
            controller_name: controller_name.into(),
            action_name: action_name.into(),
        });
        self
    }

    pub fn with_exception_data(mut self, data: DataMap) -> Self {
        self.exception_data = Some(data);
        self
    }
}

/// Contextual information passed with each notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NotificationContext {
    /// Present when the exception happened while serving a request.
    #[serde(default)]
    pub env: Option<RequestEnv>,
    /// Free-form data supplied by the caller.
    #[serde(default)]
    pub data: Option<DataMap>,
    /// How many times this error has been seen since it was last reported.
    #[serde(default)]
    pub accumulated_errors_count: i64,
}

impl NotificationContext {
    /// A context for an exception raised outside of any request.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context for an exception raised while serving `env`.
    pub fn for_request(env: RequestEnv) -> Self {
        Self {
            env: Some(env),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: DataMap) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_accumulated_errors_count(mut self, count: i64) -> Self {
        self.accumulated_errors_count = count;
        self
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Resolves the name of the machine the notifier is running on.
pub trait HostnameProvider: Send + Sync {
    /// Returns `None` if the hostname cannot be determined.
    fn hostname(&self) -> Option<String>;
}

/// Asks the operating system for the hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostname;

impl HostnameProvider for SystemHostname {
    fn hostname(&self) -> Option<String> {
        sysinfo::System::host_name()
    }
}

/// A hostname fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticHostname(pub String);

impl HostnameProvider for StaticHostname {
    fn hostname(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
