// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Event classification for Siril's output pipe.
//!
//! Every line Siril writes to its output pipe is classified into exactly one
//! [`SirilEvent`]. Parsing is total: malformed lines never raise, they fall
//! back to a log event (or keep their variant with fields unset), so no
//! application chatter is ever dropped.
//!
//! # Wire grammar
//!
//! ```text
//! ready
//! status: <token> <message...>
//! progress: <digits>
//! log: <message...>
//! anything else            (implicit log line)
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^status: (\S+) (.*)$").expect("static regex"));

/// A single classified line from Siril's output pipe.
///
/// The raw line is retained verbatim so that `Display` round-trips exactly,
/// including lines whose structured fields failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SirilEvent {
    raw: String,
    kind: EventKind,
}

/// The event payload, one variant per wire grammar rule.
///
/// Fields are `Option` only where the wire format genuinely allows absence
/// (a malformed `status:`/`log:` line, a `progress:` line without digits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A log line. `message` is unset when a `log:` prefix was present but
    /// the single-space grammar did not match.
    Log { message: Option<String> },

    /// A progress report. `percent` is unset when no digit run followed the
    /// prefix; out-of-range values are reported as Siril sent them.
    Progress { percent: Option<u32> },

    /// A command status line. Both fields are unset when the line does not
    /// match the strict `status: <token> <message>` shape (such statuses are
    /// not actionable and are skipped by the session loop).
    Status {
        status: Option<String>,
        message: Option<String>,
    },

    /// The one-time startup handshake marker, the literal line `ready`.
    Ready,
}

impl SirilEvent {
    /// Classify one line (without its trailing newline).
    pub fn parse(line: &str) -> Self {
        let kind = if line == "ready" {
            EventKind::Ready
        } else if line.starts_with("status:") {
            match STATUS_RE.captures(line) {
                Some(caps) => EventKind::Status {
                    status: Some(caps[1].to_string()),
                    message: Some(caps[2].to_string()),
                },
                None => EventKind::Status {
                    status: None,
                    message: None,
                },
            }
        } else if let Some(rest) = line.strip_prefix("progress:") {
            EventKind::Progress {
                percent: parse_progress(rest),
            }
        } else if line.starts_with("log:") {
            EventKind::Log {
                message: line.strip_prefix("log: ").map(str::to_string),
            }
        } else {
            EventKind::Log {
                message: Some(line.to_string()),
            }
        };

        Self {
            raw: line.to_string(),
            kind,
        }
    }

    /// The raw line as read from the pipe.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The status token, if this is a well-formed status event.
    pub fn status(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Status { status, .. } => status.as_deref(),
            _ => None,
        }
    }

    /// The message payload of a log or status event.
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Log { message } | EventKind::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// The progress percentage, if present.
    pub fn progress(&self) -> Option<u32> {
        match self.kind {
            EventKind::Progress { percent } => percent,
            _ => None,
        }
    }

    /// True for terminal events: a status of `success`, `error` or `exit`.
    pub fn completed(&self) -> bool {
        matches!(self.status(), Some("success" | "error" | "exit"))
    }

    /// True when Siril reported a command failure.
    pub fn errored(&self) -> bool {
        self.status() == Some("error")
    }

    /// True for the ready handshake, either the bare `ready` marker or a
    /// status event whose token is `ready`.
    pub fn is_ready(&self) -> bool {
        matches!(self.kind, EventKind::Ready) || self.status() == Some("ready")
    }
}

impl fmt::Display for SirilEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Extract the leading digit run after `progress:`, requiring the single
/// separator space. Trailing non-digit content is ignored, a missing digit
/// run yields `None`.
fn parse_progress(rest: &str) -> Option<u32> {
    let rest = rest.strip_prefix(' ')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_event_parsing() {
        let event = SirilEvent::parse("status: success Operation completed");
        assert_eq!(event.status(), Some("success"));
        assert_eq!(event.message(), Some("Operation completed"));
        assert!(event.completed());
        assert!(!event.errored());
        assert_eq!(event.to_string(), "status: success Operation completed");
    }

    #[test]
    fn test_status_event_with_error() {
        let event = SirilEvent::parse("status: error Something went wrong");
        assert_eq!(event.status(), Some("error"));
        assert_eq!(event.message(), Some("Something went wrong"));
        assert!(event.errored());
        assert!(event.completed());
    }

    #[test]
    fn test_status_event_with_exit() {
        let event = SirilEvent::parse("status: exit Exiting application");
        assert_eq!(event.status(), Some("exit"));
        assert!(event.completed());
        assert!(!event.errored());
    }

    #[test]
    fn test_status_message_keeps_embedded_colons() {
        let event = SirilEvent::parse("status: success File saved: /path/to/file.fits");
        assert_eq!(event.status(), Some("success"));
        assert_eq!(event.message(), Some("File saved: /path/to/file.fits"));
    }

    #[test]
    fn test_status_without_message_leaves_fields_unset() {
        let event = SirilEvent::parse("status: running");
        assert!(matches!(
            event.kind(),
            EventKind::Status {
                status: None,
                message: None
            }
        ));
        assert!(!event.completed());
    }

    #[test]
    fn test_status_no_space_after_colon() {
        let event = SirilEvent::parse("status:success");
        assert_eq!(event.status(), None);
        assert_eq!(event.message(), None);
    }

    #[test]
    fn test_status_extra_whitespace_leaves_fields_unset() {
        let event = SirilEvent::parse("status:   success    spaced out");
        assert!(matches!(
            event.kind(),
            EventKind::Status {
                status: None,
                message: None
            }
        ));
    }

    #[test]
    fn test_progress_event_parsing() {
        let event = SirilEvent::parse("progress: 75");
        assert_eq!(event.progress(), Some(75));
        assert_eq!(event.status(), None);
        assert_eq!(event.message(), None);
    }

    #[test]
    fn test_progress_bounds() {
        assert_eq!(SirilEvent::parse("progress: 0").progress(), Some(0));
        assert_eq!(SirilEvent::parse("progress: 100").progress(), Some(100));
        // Siril occasionally over-reports; pass it through untouched.
        assert_eq!(SirilEvent::parse("progress: 999999").progress(), Some(999999));
    }

    #[test]
    fn test_progress_invalid_number_is_unset() {
        let event = SirilEvent::parse("progress: abc");
        assert!(matches!(event.kind(), EventKind::Progress { percent: None }));
    }

    #[test]
    fn test_progress_empty_number_is_unset() {
        let event = SirilEvent::parse("progress: ");
        assert!(matches!(event.kind(), EventKind::Progress { percent: None }));
    }

    #[test]
    fn test_progress_trailing_junk_keeps_digits() {
        assert_eq!(SirilEvent::parse("progress: 42%").progress(), Some(42));
    }

    #[test]
    fn test_log_event_parsing() {
        let event = SirilEvent::parse("log: This is a log message");
        assert_eq!(event.message(), Some("This is a log message"));
        assert_eq!(event.status(), None);
        assert_eq!(event.progress(), None);
    }

    #[test]
    fn test_log_no_space_after_colon() {
        let event = SirilEvent::parse("log:message");
        assert!(matches!(event.kind(), EventKind::Log { message: None }));
    }

    #[test]
    fn test_log_with_non_ascii() {
        let event = SirilEvent::parse("log: Processing file with special chars: éñ§™");
        assert_eq!(
            event.message(),
            Some("Processing file with special chars: éñ§™")
        );
    }

    #[test]
    fn test_ready_event() {
        let event = SirilEvent::parse("ready");
        assert!(event.is_ready());
        assert!(!event.completed());
        assert!(matches!(event.kind(), EventKind::Ready));
    }

    #[test]
    fn test_status_ready_token_is_ready() {
        let event = SirilEvent::parse("status: ready pipe active");
        assert!(event.is_ready());
        assert!(!event.completed());
    }

    #[test]
    fn test_unrecognized_line_becomes_log() {
        let event = SirilEvent::parse("Some random output from siril");
        assert_eq!(event.message(), Some("Some random output from siril"));
        assert!(matches!(event.kind(), EventKind::Log { .. }));
    }

    #[test]
    fn test_empty_line_becomes_log() {
        let event = SirilEvent::parse("");
        assert_eq!(event.message(), Some(""));
    }

    #[test]
    fn test_display_round_trips_raw_line() {
        for line in [
            "ready",
            "status: success done",
            "status:malformed",
            "progress: 50",
            "progress: ",
            "log: hello",
            "log:hello",
            "free chatter",
            "",
        ] {
            assert_eq!(SirilEvent::parse(line).to_string(), line);
        }
    }
}
