//! # Execution Tracking
//!
//! Transaction logs are a flat list of lines. Which program emitted a given
//! `Program log:` line is only recoverable by replaying the runtime's
//! invoke/complete markers:
//!
//! ```text
//! Program A invoke [1]                          push A
//! Program B invoke [2]                          push B
//! Program log: inner                            active frame is B
//! Program B consumed 5 of 100 compute units     pop
//! Program log: outer                            active frame is A
//! Program A consumed 20 of 200 compute units    pop
//! ```
//!
//! [`ExecutionTracker`] pops on the `consumed` marker, which every program
//! logs whether it succeeds or fails. [`ProgramErrorStack`] pops on
//! `success` instead, so that after a failure the program that failed is
//! left on top.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::options::ParseOptions;
use solana_sdk::pubkey::Pubkey;

/// Prefix of `msg!` log lines; the runtime follows it with one space
pub const PROGRAM_LOG: &str = "Program log:";
/// Prefix of `sol_log_data` lines
pub const PROGRAM_DATA: &str = "Program data:";

lazy_static! {
    static ref INVOKE_RE: Regex = Regex::new(r"^Program (\S+) invoke \[(\d+)\]$").unwrap();
    static ref CONSUMED_RE: Regex =
        Regex::new(r"^Program (\S+) consumed (\d+) of (\d+) compute units$").unwrap();
    static ref SUCCESS_RE: Regex = Regex::new(r"^Program (\S+) success$").unwrap();
}

/// Runtime log line, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine<'a> {
    /// `Program <addr> invoke [<depth>]`
    Invoke { program: &'a str, depth: u32 },
    /// `Program <addr> consumed <n> of <m> compute units`
    Consumed { program: &'a str, units: u64, budget: u64 },
    /// `Program <addr> success`
    Success { program: &'a str },
    /// `Program log: <text>`
    Log(&'a str),
    /// `Program data: <base64>`
    Data(&'a str),
    /// Anything else (`Program return:`, failure lines, free text)
    Other(&'a str),
}

/// Strips `tag` and at most one space after it
pub(crate) fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.strip_prefix(tag).map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

impl<'a> LogLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        if let Some(text) = strip_tag(line, PROGRAM_LOG) {
            return LogLine::Log(text);
        }
        if let Some(text) = strip_tag(line, PROGRAM_DATA) {
            return LogLine::Data(text);
        }
        if let Some(caps) = INVOKE_RE.captures(line) {
            if let (Some(program), Some(depth)) = (caps.get(1), caps.get(2)) {
                if let Ok(depth) = depth.as_str().parse() {
                    return LogLine::Invoke {
                        program: program.as_str(),
                        depth,
                    };
                }
            }
        }
        if let Some(caps) = CONSUMED_RE.captures(line) {
            if let (Some(program), Some(units), Some(budget)) = (caps.get(1), caps.get(2), caps.get(3))
            {
                if let (Ok(units), Ok(budget)) = (units.as_str().parse(), budget.as_str().parse()) {
                    return LogLine::Consumed {
                        program: program.as_str(),
                        units,
                        budget,
                    };
                }
            }
        }
        if let Some(program) = SUCCESS_RE.captures(line).and_then(|c| c.get(1)) {
            return LogLine::Success {
                program: program.as_str(),
            };
        }
        LogLine::Other(line)
    }
}

/// Stack machine over one transaction's logs that knows which program is
/// executing at every line
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
    watched: String,
    stack: Vec<String>,
    options: ParseOptions,
    /// Index of the next line to be stepped
    index: usize,
    last_line: String,
}

impl ExecutionTracker {
    /// Starts tracking from the first line of a trace, which must be a
    /// top-level invoke
    pub fn new(watched: impl Into<String>, first_line: &str, options: ParseOptions) -> Result<Self> {
        let program = match LogLine::parse(first_line) {
            LogLine::Invoke { program, .. } => program.to_string(),
            _ => {
                return Err(Error::malformed_log(
                    first_line,
                    "trace must start with a program invoke",
                ))
            }
        };
        trace!(program = %program, "Execution started");
        Ok(Self {
            watched: watched.into(),
            stack: vec![program],
            options,
            index: 1,
            last_line: first_line.to_string(),
        })
    }

    /// Program executing at the current line
    pub fn program(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    /// Whether the watched program is the active frame
    pub fn is_watched_active(&self) -> bool {
        self.program() == Some(self.watched.as_str())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Frames from outermost to innermost
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// Applies one line. Returns the payload of a data line emitted by the
    /// watched program, `None` for every other line.
    pub fn step<'l>(&mut self, line: &'l str) -> Result<Option<&'l str>> {
        let index = self.index;
        self.index += 1;
        self.last_line.clear();
        self.last_line.push_str(line);

        match LogLine::parse(line) {
            LogLine::Invoke { program, depth } => {
                trace!(index, program, depth, "invoke");
                self.stack.push(program.to_string());
                Ok(None)
            }
            LogLine::Consumed { program, .. } => {
                trace!(index, program, "consumed");
                match self.stack.pop() {
                    Some(_) => Ok(None),
                    None => Err(Error::StackUnderflow {
                        index,
                        line: line.to_string(),
                    }),
                }
            }
            LogLine::Log(payload) if self.is_watched_active() => Ok(Some(payload)),
            LogLine::Data(payload) if self.is_watched_active() && self.options.accept_program_data => {
                Ok(Some(payload))
            }
            _ => Ok(None),
        }
    }

    /// Ends the trace. An unbalanced stack is only an error under
    /// [`ParseOptions::strict_balance`].
    pub fn finish(&self) -> Result<()> {
        if self.options.strict_balance && !self.stack.is_empty() {
            return Err(Error::malformed_log(
                self.last_line.clone(),
                format!("{} frame(s) still open at end of trace", self.stack.len()),
            ));
        }
        Ok(())
    }
}

/// A log line attributed to the watched program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedLine<'a> {
    /// Position in the trace
    pub index: usize,
    /// Full log line
    pub line: &'a str,
    /// Text after the `Program log: ` / `Program data: ` prefix
    pub payload: &'a str,
}

/// Replays `logs` and returns every data line emitted while `program` was
/// the active frame. An empty trace yields nothing.
pub fn attribute_logs<'a, S: AsRef<str>>(
    program: &str,
    logs: &'a [S],
    options: &ParseOptions,
) -> Result<Vec<AttributedLine<'a>>> {
    let Some((first, rest)) = logs.split_first() else {
        return Ok(Vec::new());
    };
    let mut tracker = ExecutionTracker::new(program, first.as_ref(), options.clone())?;
    let mut lines = Vec::new();
    for (offset, line) in rest.iter().enumerate() {
        let line = line.as_ref();
        if let Some(payload) = tracker.step(line)? {
            lines.push(AttributedLine {
                index: offset + 1,
                line,
                payload,
            });
        }
    }
    tracker.finish()?;
    Ok(lines)
}

/// Programs on the call stack at the point a transaction failed, outermost
/// first; the last entry is the program that failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramErrorStack {
    pub stack: Vec<Pubkey>,
}

impl ProgramErrorStack {
    /// Pushes on `invoke`, pops on `success`. Lines naming something that is
    /// not an address are ignored.
    pub fn parse<S: AsRef<str>>(logs: &[S]) -> Self {
        let mut stack = Vec::new();
        for line in logs {
            match LogLine::parse(line.as_ref()) {
                LogLine::Success { .. } => {
                    stack.pop();
                }
                LogLine::Invoke { program, .. } => {
                    if let Ok(key) = program.parse::<Pubkey>() {
                        stack.push(key);
                    }
                }
                _ => {}
            }
        }
        Self { stack }
    }

    /// The program that raised the error
    pub fn failed_program(&self) -> Option<&Pubkey> {
        self.stack.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert_eq!(
            LogLine::parse("Program P invoke [1]"),
            LogLine::Invoke {
                program: "P",
                depth: 1
            }
        );
        assert_eq!(
            LogLine::parse("Program P consumed 10 of 200 compute units"),
            LogLine::Consumed {
                program: "P",
                units: 10,
                budget: 200
            }
        );
        assert_eq!(
            LogLine::parse("Program P success"),
            LogLine::Success { program: "P" }
        );
        assert_eq!(LogLine::parse("Program log: X"), LogLine::Log("X"));
        assert_eq!(LogLine::parse("Program data: AAAA"), LogLine::Data("AAAA"));
        assert_eq!(LogLine::parse("Program log:"), LogLine::Log(""));
        assert_eq!(LogLine::parse("Program log:X"), LogLine::Log("X"));
        assert_eq!(LogLine::parse("Program log:  two"), LogLine::Log(" two"));
        assert_eq!(LogLine::parse("Program data:"), LogLine::Data(""));
        assert!(matches!(
            LogLine::parse("Program P failed: custom program error: 0x1770"),
            LogLine::Other(_)
        ));
    }

    #[test]
    fn test_first_line_must_invoke() {
        let err = ExecutionTracker::new("P", "Program log: hi", ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedLog { .. }));
    }

    #[test]
    fn test_underflow_is_an_error() {
        let mut tracker =
            ExecutionTracker::new("P", "Program P invoke [1]", ParseOptions::default()).unwrap();
        tracker.step("Program P consumed 1 of 2 compute units").unwrap();
        let err = tracker
            .step("Program P consumed 1 of 2 compute units")
            .unwrap_err();
        assert_eq!(
            err,
            Error::StackUnderflow {
                index: 2,
                line: "Program P consumed 1 of 2 compute units".to_string()
            }
        );
    }

    #[test]
    fn test_strict_balance() {
        let logs = ["Program P invoke [1]", "Program log: X"];
        assert_eq!(
            attribute_logs("P", &logs, &ParseOptions::default()).unwrap().len(),
            1
        );

        let strict = ParseOptions {
            strict_balance: true,
            ..ParseOptions::default()
        };
        assert!(matches!(
            attribute_logs("P", &logs, &strict),
            Err(Error::MalformedLog { .. })
        ));
    }

    #[test]
    fn test_program_data_toggle() {
        let logs = [
            "Program P invoke [1]",
            "Program data: AAAA",
            "Program P consumed 1 of 2 compute units",
        ];
        assert_eq!(
            attribute_logs("P", &logs, &ParseOptions::default()).unwrap()[0].payload,
            "AAAA"
        );
        let logs_only = ParseOptions {
            accept_program_data: false,
            ..ParseOptions::default()
        };
        assert!(attribute_logs("P", &logs, &logs_only).unwrap().is_empty());
    }

    #[test]
    fn test_error_stack_keeps_failed_program() {
        let outer = Pubkey::new_from_array([1; 32]).to_string();
        let inner = Pubkey::new_from_array([2; 32]).to_string();
        let logs = vec![
            format!("Program {} invoke [1]", outer),
            format!("Program {} invoke [2]", inner),
            format!("Program {} consumed 10 of 100 compute units", inner),
            format!("Program {} success", inner),
            format!("Program {} invoke [2]", inner),
            format!("Program {} failed: custom program error: 0x1", inner),
        ];
        let stack = ProgramErrorStack::parse(&logs);
        assert_eq!(stack.stack.len(), 2);
        assert_eq!(stack.failed_program(), Some(&Pubkey::new_from_array([2; 32])));
    }
}
