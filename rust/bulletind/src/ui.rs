//! Ephemeral feedback pushed to the shell: toasts and the loading indicator.

use serde::Serialize;
use std::io::{self, Write};
use uuid::Uuid;

pub const TOAST_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn color(self) -> &'static str {
        match self {
            Level::Success => "green",
            Level::Error => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    Toast {
        id: Uuid,
        message: String,
        level: Level,
        color: &'static str,
        duration_ms: u64,
    },
    Loading { active: bool, scope: &'static str },
}

impl Event {
    pub fn toast(level: Level, message: impl Into<String>) -> Self {
        Event::Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            color: level.color(),
            duration_ms: TOAST_DURATION_MS,
        }
    }
}

pub trait EventSink {
    fn emit(&self, event: Event);
}

/// Writes each event as its own JSON line on stdout, interleaved with
/// responses.
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&self, event: Event) {
        let line = match serde_json::to_string(&event) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("failed to encode event: {e}");
                return;
            }
        };
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

pub fn notify(sink: &dyn EventSink, level: Level, message: impl Into<String>) {
    sink.emit(Event::toast(level, message));
}

/// Emits `loading: true` on creation and `loading: false` when dropped.
pub struct Loading<'a> {
    sink: &'a dyn EventSink,
    scope: &'static str,
}

impl<'a> Loading<'a> {
    pub fn start(sink: &'a dyn EventSink, scope: &'static str) -> Self {
        sink.emit(Event::Loading {
            active: true,
            scope,
        });
        Self { sink, scope }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.sink.emit(Event::Loading {
            active: false,
            scope: self.scope,
        });
    }
}
