//! UI toast notification types
//!
//! Toasts are short messages popped one at a time by the UI. They live in
//! their own small queue, separate from the state-change event queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Toast severity, drives the toast colour in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastSeverity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Whether the toast disappears by itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastDuration {
    #[default]
    Temporary,
    Permanent,
}

/// Action button shown on the toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastButton {
    #[default]
    Refresh,
    Dismiss,
    None,
}

/// A single UI toast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub severity: ToastSeverity,
    pub duration: ToastDuration,
    pub button: ToastButton,
    /// UI queue the toast is shown in
    pub queue: String,
    pub timestamp: DateTime<Utc>,
}

impl Toast {
    /// Temporary info toast on the main queue with a refresh button
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity: ToastSeverity::default(),
            duration: ToastDuration::default(),
            button: ToastButton::default(),
            queue: "main".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn severity(mut self, severity: ToastSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn duration(mut self, duration: ToastDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn button(mut self, button: ToastButton) -> Self {
        self.button = button;
        self
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }
}
