// src/formatting.rs

use crate::config::IgnoreDataIf;
use crate::core::{
    Clock, DataMap, ExceptionReport, HostnameProvider, NotificationContext, SystemClock,
    SystemHostname,
};
use crate::notification::NotifierError;
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Attachment color used when none is configured.
pub const DEFAULT_COLOR: &str = "danger";

/// A labeled value inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
}

impl Field {
    fn new(title: &str, value: String) -> Self {
        Self {
            title: title.to_string(),
            value,
        }
    }
}

/// A styled block of a Slack message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub color: String,
    pub text: String,
    pub fields: Vec<Field>,
    pub mrkdwn_in: Vec<String>,
}

/// Turns an exception and its context into a Slack attachment.
#[derive(Clone)]
pub struct SlackMessageFormatter {
    color: String,
    backtrace_lines: Option<usize>,
    ignore_data_if: Option<IgnoreDataIf>,
    clock: Arc<dyn Clock>,
    hostname: Arc<dyn HostnameProvider>,
}

impl SlackMessageFormatter {
    pub fn new(
        color: impl Into<String>,
        backtrace_lines: Option<usize>,
        ignore_data_if: Option<IgnoreDataIf>,
    ) -> Self {
        Self {
            color: color.into(),
            backtrace_lines,
            ignore_data_if,
            clock: Arc::new(SystemClock),
            hostname: Arc::new(SystemHostname),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hostname_provider(mut self, hostname: Arc<dyn HostnameProvider>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Builds the single attachment describing `exception`.
    pub fn attachment(
        &self,
        exception: &ExceptionReport,
        context: &NotificationContext,
    ) -> Result<Attachment, NotifierError> {
        let text = self.summary_text(exception, context);
        let fields = self.fields(exception, context)?;
        Ok(Attachment {
            color: self.color.clone(),
            text,
            fields,
            mrkdwn_in: vec!["text".to_string(), "fields".to_string()],
        })
    }

    /// The headline of the message: when, what, and where.
    pub fn summary_text(&self, exception: &ExceptionReport, context: &NotificationContext) -> String {
        let descriptor =
            exception_descriptor(&exception.type_name, context.accumulated_errors_count);
        let mut text = format!("*At* `{}`", self.timestamp());

        match &context.env {
            None => {
                text.push_str(&format!(" {} *occurred in background*\n", descriptor));
            }
            Some(env) => {
                text.push_str(&format!(
                    " {} *occurred while* `{} <{}>`",
                    descriptor, env.request_method, env.request_uri
                ));
                if let Some(controller) = &env.controller {
                    text.push_str(&format!(
                        " *was processed by* `{}#{}`",
                        controller.controller_name, controller.action_name
                    ));
                }
                text.push('\n');
            }
        }

        text
    }

    /// The attachment fields in display order.
    pub fn fields(
        &self,
        exception: &ExceptionReport,
        context: &NotificationContext,
    ) -> Result<Vec<Field>, NotifierError> {
        let hostname = self.hostname.hostname().ok_or(NotifierError::Hostname)?;

        let mut fields = vec![
            Field::new("Exception", clean_message(&exception.message)),
            Field::new("Hostname", hostname),
            Field::new("Occurred at", self.timestamp()),
        ];

        if let Some(frames) = exception.frames() {
            fields.push(Field::new("Backtrace", self.formatted_backtrace(frames)));
        }

        let data = self.additional_data(context);
        if !data.is_empty() {
            let lines: Vec<String> = data
                .iter()
                .map(|(key, value)| format!("{}: {}", key, render_value(value)))
                .collect();
            fields.push(Field::new("Data", code_block(&lines.join("\n"))));
        }

        Ok(fields)
    }

    /// Caller data merged over the request's exception data, then filtered.
    pub fn additional_data(&self, context: &NotificationContext) -> DataMap {
        let mut data = match &context.env {
            Some(env) => env.exception_data.clone().unwrap_or_default(),
            None => DataMap::new(),
        };
        if let Some(own) = &context.data {
            for (key, value) in own {
                data.insert(key.clone(), value.clone());
            }
        }

        match &self.ignore_data_if {
            Some(predicate) => deep_reject(&data, predicate.as_ref()),
            None => data,
        }
    }

    fn formatted_backtrace(&self, frames: &[String]) -> String {
        let limit = self.backtrace_lines.unwrap_or(frames.len());
        let shown: Vec<&str> = frames.iter().take(limit).map(String::as_str).collect();
        code_block(&shown.join("\n"))
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Renders `*an* `Type``, `*a* `Type`` or `*3* `Type``.
pub fn exception_descriptor(type_name: &str, accumulated_errors_count: i64) -> String {
    let measure_word = if accumulated_errors_count > 1 {
        accumulated_errors_count.to_string()
    } else if starts_with_vowel(type_name) {
        "an".to_string()
    } else {
        "a".to_string()
    };
    format!("*{}* `{}`", measure_word, type_name)
}

fn starts_with_vowel(word: &str) -> bool {
    word.chars()
        .next()
        .map(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .unwrap_or(false)
}

/// Backticks would close the surrounding code span.
fn clean_message(message: &str) -> String {
    message.replace('`', "'")
}

fn code_block(body: &str) -> String {
    format!("```{}```", body)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Returns a copy of `map` without the entries `predicate` rejects.
///
/// Nested maps are filtered first; the predicate then sees the entry with its
/// already-filtered value. The top-level map itself is always returned.
pub fn deep_reject(map: &DataMap, predicate: &(dyn Fn(&str, &Value) -> bool + Send + Sync)) -> DataMap {
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Object(nested) => Value::Object(deep_reject(nested, predicate)),
                other => other.clone(),
            };
            (!predicate(key.as_str(), &value)).then(|| (key.clone(), value))
        })
        .collect()
}
