use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Optional context attached to a log line. Unset fields are left out.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogScope<'a> {
    pub run_id: Option<&'a str>,
    pub scenario: Option<&'a str>,
    pub seed: Option<u64>,
    pub tick: Option<u64>,
}

impl<'a> LogScope<'a> {
    pub fn run(run_id: &'a str) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub event: String,
    #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

pub fn build_log_line(
    at: DateTime<Utc>,
    level: LogLevel,
    event: &str,
    scope: LogScope<'_>,
    details: Value,
) -> StructuredLogLine {
    StructuredLogLine {
        timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp_ms: at.timestamp_millis().max(0) as u64,
        level,
        event: event.to_string(),
        run_id: scope.run_id.map(str::to_string),
        scenario: scope.scenario.map(str::to_string),
        seed: scope.seed,
        tick: scope.tick,
        details,
    }
}

/// Writes one JSON object per line to stderr.
pub fn emit_log(level: LogLevel, event: &str, scope: LogScope<'_>, details: Value) {
    let line = build_log_line(Utc::now(), level, event, scope, details);
    eprintln!(
        "{}",
        serde_json::to_string(&line).expect("structured log should serialize")
    );
}

pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
