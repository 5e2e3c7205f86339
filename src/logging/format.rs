//! JSON log lines: one JSON object per line (ndjson) for training reports and predictions.

use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Envelope written around every emitted record.
#[derive(Serialize)]
pub struct RecordLine<'a, T: Serialize> {
    pub ts: String,
    pub kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'a str>,
    pub record: &'a T,
}

impl<'a, T: Serialize> RecordLine<'a, T> {
    pub fn new(kind: &'a str, record: &'a T) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            kind,
            tag: None,
            record,
        }
    }

    pub fn with_tag(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: JSON lines (or plain text) to stderr, level
    /// from RUST_LOG or `default_level`. A second call is a no-op.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let installed = if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if installed.is_err() {
            tracing::debug!("subscriber already installed");
        }
    }

    /// Write a single record as one JSON line, bypassing tracing.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_one_line_per_record() {
        let mut buf = Vec::new();
        let payload = serde_json::json!({ "score": 72.5 });
        StructuredLogger::emit_json(&RecordLine::new("prediction", &payload).with_tag("v1"), &mut buf).unwrap();
        StructuredLogger::emit_json(&RecordLine::new("prediction", &payload), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "prediction");
        assert_eq!(first["tag"], "v1");
        assert_eq!(first["record"]["score"], 72.5);
        assert!(serde_json::from_str::<serde_json::Value>(lines[1]).unwrap().get("tag").is_none());
    }
}
