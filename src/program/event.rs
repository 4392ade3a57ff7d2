//! Event extraction from transaction logs

use rayon::prelude::*;
use tracing::{debug, warn};

use super::execution::ExecutionTracker;
use crate::coder::{Event, EventCoder};
use crate::error::{Error, Result};
use crate::options::ParseOptions;

/// Pulls one program's events out of transaction logs
///
/// Only data lines logged while the program is the active frame are decoded,
/// so events that another program happens to log (or that a CPI callee
/// logs) are never misattributed.
#[derive(Debug, Clone)]
pub struct EventParser<'c> {
    program_id: String,
    coder: &'c EventCoder,
    options: ParseOptions,
}

impl<'c> EventParser<'c> {
    pub fn new(program_id: impl Into<String>, coder: &'c EventCoder) -> Self {
        Self::with_options(program_id, coder, ParseOptions::default())
    }

    pub fn with_options(
        program_id: impl Into<String>,
        coder: &'c EventCoder,
        options: ParseOptions,
    ) -> Self {
        Self {
            program_id: program_id.into(),
            coder,
            options,
        }
    }

    /// Calls `callback` for every event, in log order.
    ///
    /// Lines that fail to decode are skipped. Plain `msg!` text is not an
    /// event payload and is logged at debug level; a known event whose body
    /// fails to decode is a warning. Only a malformed trace (bad first line, stack underflow, or an unbalanced
    /// end under `strict_balance`) is an error.
    pub fn parse_logs<S, F>(&self, logs: &[S], mut callback: F) -> Result<()>
    where
        S: AsRef<str>,
        F: FnMut(Event),
    {
        let Some((first, rest)) = logs.split_first() else {
            return Ok(());
        };
        let mut tracker =
            ExecutionTracker::new(self.program_id.as_str(), first.as_ref(), self.options.clone())?;

        for line in rest {
            let Some(payload) = tracker.step(line.as_ref())? else {
                continue;
            };
            match self.coder.decode(payload) {
                Ok(Some(event)) => callback(event),
                Ok(None) => {}
                Err(e @ Error::MalformedLog { .. }) => {
                    debug!(program = %self.program_id, error = %e, "Skipping non-event log line")
                }
                Err(e) => warn!(program = %self.program_id, error = %e, "Skipping undecodable event"),
            }
        }
        tracker.finish()
    }

    /// Collects every event of one trace
    pub fn parse_events<S: AsRef<str>>(&self, logs: &[S]) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        self.parse_logs(logs, |event| events.push(event))?;
        Ok(events)
    }

    /// Parses many independent traces in parallel; results keep input order
    pub fn parse_logs_batch<S>(&self, traces: &[Vec<S>]) -> Vec<Result<Vec<Event>>>
    where
        S: AsRef<str> + Sync,
    {
        debug!(program = %self.program_id, traces = traces.len(), "Parsing log batch");
        traces
            .par_iter()
            .map(|logs| self.parse_events(logs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::Idl;
    use crate::value::Value;

    const IDL: &str = r#"{
        "name": "p",
        "instructions": [],
        "events": [{"name": "Ping", "fields": [{"name": "n", "type": "u8", "index": false}]}]
    }"#;

    fn ping(coder: &EventCoder, n: u8) -> String {
        coder
            .encode("Ping", &Value::structure([("n", Value::U8(n))]))
            .unwrap()
    }

    #[test]
    fn test_skips_malformed_lines() {
        let coder = EventCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let logs = vec![
            "Program P invoke [1]".to_string(),
            "Program log: Instruction: Ping".to_string(),
            format!("Program data: {}", ping(&coder, 1)),
            "Program log: %%%".to_string(),
            format!("Program log: {}", ping(&coder, 2)),
            "Program P consumed 10 of 200 compute units".to_string(),
            "Program P success".to_string(),
        ];
        let parser = EventParser::new("P", &coder);
        let events = parser.parse_events(&logs).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data.get("n"), Some(&Value::U8(2)));
    }

    #[test]
    fn test_truncated_event_body_is_skipped() {
        let coder = EventCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let full = coder
            .encode_bytes("Ping", &Value::structure([("n", Value::U8(3))]))
            .unwrap();
        let truncated = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &full[..8],
        );

        assert!(matches!(
            coder.decode("Instruction: Ping"),
            Err(Error::MalformedLog { .. })
        ));
        assert!(matches!(
            coder.decode(&truncated),
            Err(Error::BufferUnderrun { .. })
        ));

        let logs = vec![
            "Program P invoke [1]".to_string(),
            format!("Program data: {}", truncated),
            format!("Program data: {}", ping(&coder, 4)),
            "Program P success".to_string(),
        ];
        let events = EventParser::new("P", &coder).parse_events(&logs).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data.get("n"), Some(&Value::U8(4)));
    }

    #[test]
    fn test_empty_trace() {
        let coder = EventCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let parser = EventParser::new("P", &coder);
        let none: Vec<String> = Vec::new();
        assert!(parser.parse_events(&none).unwrap().is_empty());
    }

    #[test]
    fn test_batch_keeps_order() {
        let coder = EventCoder::new(&Idl::parse(IDL).unwrap()).unwrap();
        let trace = |n: u8| {
            vec![
                "Program P invoke [1]".to_string(),
                format!("Program data: {}", ping(&coder, n)),
                "Program P consumed 1 of 2 compute units".to_string(),
            ]
        };
        let traces: Vec<Vec<String>> = (0..16).map(trace).collect();
        let parser = EventParser::new("P", &coder);
        let results = parser.parse_logs_batch(&traces);
        for (n, result) in results.into_iter().enumerate() {
            let events = result.unwrap();
            assert_eq!(events[0].data.get("n"), Some(&Value::U8(n as u8)));
        }
    }
}
