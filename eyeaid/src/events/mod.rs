//! Run lifecycle events.
//!
//! The orchestrator reports each run's progress to an [`EventSink`] handed
//! to it at build time. Events carry the run id and an RFC 3339 timestamp;
//! they are never part of the pipeline outcome.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use crate::core::StageName;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt;
use uuid::Uuid;

/// The kinds of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A run began.
    PipelineStarted,
    /// A stage began.
    StageStarted,
    /// A stage produced its record.
    StageCompleted,
    /// A stage replaced an oracle failure with its safety fallback.
    StageFallback,
    /// The intake gate stopped the run.
    PipelineHalted,
    /// Every stage produced a record.
    PipelineCompleted,
}

impl EventKind {
    /// Returns the dotted event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline.started",
            Self::StageStarted => "stage.started",
            Self::StageCompleted => "stage.completed",
            Self::StageFallback => "stage.fallback",
            Self::PipelineHalted => "pipeline.halted",
            Self::PipelineCompleted => "pipeline.completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    /// What happened.
    pub kind: EventKind,
    /// The run it happened in.
    pub run_id: Uuid,
    /// The stage concerned, for stage events.
    pub stage: Option<StageName>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Extra fields.
    pub data: Map<String, Value>,
}

impl PipelineEvent {
    /// Creates a run-level event stamped now.
    #[must_use]
    pub fn new(kind: EventKind, run_id: Uuid) -> Self {
        Self {
            kind,
            run_id,
            stage: None,
            timestamp: Utc::now(),
            data: Map::new(),
        }
    }

    /// Creates a stage event stamped now.
    #[must_use]
    pub fn for_stage(kind: EventKind, run_id: Uuid, stage: StageName) -> Self {
        Self {
            stage: Some(stage),
            ..Self::new(kind, run_id)
        }
    }

    /// Adds a data field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns a data field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Converts to the JSON payload delivered to external sinks.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut payload = self.data.clone();
        payload.insert("type".to_string(), json!(self.kind.as_str()));
        payload.insert("run_id".to_string(), json!(self.run_id.to_string()));
        if let Some(stage) = self.stage {
            payload.insert("stage".to_string(), json!(stage.as_str()));
        }
        payload.insert(
            "timestamp".to_string(),
            json!(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(payload)
    }
}
