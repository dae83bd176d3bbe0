//! Swap audit emission
//!
//! Every attempted swap, successful or not, is emitted through a
//! [`SwapEventSink`]. The console sink prints the one-line operator trace; the
//! JSONL sink appends structured records for dashboards and after-the-fact
//! audits. Supervisors plug their own sink in to publish elsewhere.

use std::io::Write;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::swapper::{SwapReason, SwapRequest, SwapResult};
use crate::Result;

/// Destination for swap audit events
pub trait SwapEventSink: Send + Sync {
    /// Record one attempted swap
    fn emit(&self, request: &SwapRequest, result: &SwapResult);
}

/// Sink that prints the human-readable `[SWAP]` trace to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSwapEventSink;

impl SwapEventSink for ConsoleSwapEventSink {
    fn emit(&self, request: &SwapRequest, result: &SwapResult) {
        if result.success {
            println!(
                "[SWAP] {}/{}: {} -> {} (reason: {})",
                request.rig, request.polecat, request.old_profile, request.new_profile,
                request.reason
            );
        } else {
            let error = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            println!(
                "[SWAP FAILED] {}/{}: {} -> {} (reason: {}): {}",
                request.rig, request.polecat, request.old_profile, request.new_profile,
                request.reason, error
            );
        }
    }
}

/// One line of the JSONL audit stream
#[derive(Debug, Serialize)]
struct SwapRecord<'a> {
    success: bool,
    rig: &'a str,
    polecat: &'a str,
    old_profile: &'a str,
    new_profile: &'a str,
    reason: SwapReason,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hooked_work: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Sink that appends one JSON object per swap to a writer
pub struct JsonlSwapEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonlSwapEventSink {
    /// Create a sink appending to the given writer
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_record(&self, request: &SwapRequest, result: &SwapResult) -> Result<()> {
        let record = SwapRecord {
            success: result.success,
            rig: &request.rig,
            polecat: &request.polecat,
            old_profile: &request.old_profile,
            new_profile: &request.new_profile,
            reason: request.reason,
            timestamp: result.timestamp,
            new_session_id: result.new_session_id.as_deref(),
            hooked_work: request.hooked_work.as_deref(),
            error: result.error.as_ref().map(|e| e.to_string()),
        };

        let line = serde_json::to_string(&record)?;
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", line)?;
        Ok(())
    }
}

impl SwapEventSink for JsonlSwapEventSink {
    fn emit(&self, request: &SwapRequest, result: &SwapResult) {
        if let Err(err) = self.write_record(request, result) {
            warn!("failed to write swap audit record: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GasTownError;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn request() -> SwapRequest {
        SwapRequest {
            rig: "gastown".to_string(),
            polecat: "Toast".to_string(),
            old_profile: "acctA".to_string(),
            new_profile: "acctB".to_string(),
            hooked_work: Some("gt-123".to_string()),
            reason: SwapReason::RateLimit,
        }
    }

    #[test]
    fn test_jsonl_sink_success_record() {
        let buf = SharedBuf::default();
        let sink = JsonlSwapEventSink::new(buf.clone());

        let result = SwapResult {
            success: true,
            new_session_id: Some("gt-gastown-Toast".to_string()),
            error: None,
            timestamp: Utc::now(),
            event: None,
        };
        sink.emit(&request(), &result);

        let bytes = buf.0.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["rig"], "gastown");
        assert_eq!(value["reason"], "rate_limit");
        assert_eq!(value["new_session_id"], "gt-gastown-Toast");
        assert_eq!(value["hooked_work"], "gt-123");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_jsonl_sink_failure_record() {
        let buf = SharedBuf::default();
        let sink = JsonlSwapEventSink::new(buf.clone());

        let result = SwapResult {
            success: false,
            new_session_id: None,
            error: Some(GasTownError::Session("starting new session: boom".to_string())),
            timestamp: Utc::now(),
            event: None,
        };
        sink.emit(&request(), &result);

        let bytes = buf.0.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("starting new session"));
        assert!(value.get("new_session_id").is_none());
    }
}
