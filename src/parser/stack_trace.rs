//! Stack trace parser.
//!
//! Turns the loosely-structured `stack` text of a thrown error into an
//! ordered list of frames. Patterns are tried in order; a line nothing
//! matches is kept verbatim as a raw frame.

use crate::payload::schema::StackFrame;
use log::debug;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `at functionName (file.js:10:5)`
static NAMED_FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at\s+(.*?)\s+\((.*?):([0-9]+):([0-9]+)\)").unwrap()
});

/// `at file.js:10:5` (anonymous or arrow functions, top-level code)
static ANONYMOUS_FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at\s+(.*?):([0-9]+):([0-9]+)").unwrap()
});

/// A single tier of the parser
type FrameMatcher = fn(&str) -> Option<StackFrame>;

/// Tiers tried in order before falling back to a raw frame
const MATCHERS: &[FrameMatcher] = &[match_named_frame, match_anonymous_frame];

/// Parse a stack trace into frames
///
/// **Public** - main entry point for stack parsing
///
/// # Arguments
/// * `stack` - Raw `stack` text; the first line is the error banner
///
/// # Returns
/// Frames in source order (innermost call first). `None` or empty input
/// yields an empty list. Never fails: unrecognized lines become raw frames.
pub fn parse_stack(stack: Option<&str>) -> Vec<StackFrame> {
    let Some(stack) = stack.filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    let frames: Vec<StackFrame> = stack
        .split('\n')
        .skip(1)
        .map(|line| parse_line(line.trim()))
        .filter(StackFrame::has_content)
        .collect();

    debug!("Parsed {} stack frames", frames.len());
    frames
}

/// Run one trimmed line through the tiers
///
/// **Private** - internal helper for parse_stack
fn parse_line(line: &str) -> StackFrame {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(line))
        .unwrap_or_else(|| StackFrame::Raw {
            raw: line.to_string(),
        })
}

fn match_named_frame(line: &str) -> Option<StackFrame> {
    let caps = NAMED_FRAME_RE.captures(line)?;
    Some(StackFrame::Located {
        function: Some(caps[1].to_string()),
        file: caps[2].to_string(),
        line: position(&caps, 3),
        column: position(&caps, 4),
    })
}

fn match_anonymous_frame(line: &str) -> Option<StackFrame> {
    let caps = ANONYMOUS_FRAME_RE.captures(line)?;
    Some(StackFrame::Located {
        function: None,
        file: caps[1].to_string(),
        line: position(&caps, 2),
        column: position(&caps, 3),
    })
}

/// Line/column number; zero or overflow counts as unknown
fn position(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn located(function: Option<&str>, file: &str, line: u32, column: u32) -> StackFrame {
        StackFrame::Located {
            function: function.map(str::to_string),
            file: file.to_string(),
            line: Some(line),
            column: Some(column),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_stack(None).is_empty());
        assert!(parse_stack(Some("")).is_empty());
    }

    #[test]
    fn test_banner_only() {
        assert!(parse_stack(Some("Error: boom")).is_empty());
    }

    #[test]
    fn test_named_frame() {
        let frames = parse_stack(Some("Error: boom\n  at myFn (http://h/app.js:10:5)"));
        assert_eq!(frames, vec![located(Some("myFn"), "http://h/app.js", 10, 5)]);
    }

    #[test]
    fn test_anonymous_frame() {
        let frames = parse_stack(Some("Error: boom\n  at http://h/app.js:10:5"));
        assert_eq!(frames, vec![located(None, "http://h/app.js", 10, 5)]);
    }

    #[test]
    fn test_named_frame_with_spaces_in_function() {
        let frames = parse_stack(Some(
            "TypeError: x is undefined\n    at new Widget (https://cdn.example.com/w.js:3:14)",
        ));
        assert_eq!(
            frames,
            vec![located(Some("new Widget"), "https://cdn.example.com/w.js", 3, 14)]
        );
    }

    #[test]
    fn test_fallback_keeps_raw_line() {
        let frames = parse_stack(Some("Error\n   at <anonymous>   "));
        assert_eq!(
            frames,
            vec![StackFrame::Raw {
                raw: "at <anonymous>".to_string()
            }]
        );
    }

    #[test]
    fn test_firefox_style_lines_fall_back() {
        let frames = parse_stack(Some("Error\nhandler@http://h/app.js:4:9"));
        assert_eq!(frames[0].raw(), Some("handler@http://h/app.js:4:9"));
    }

    #[test]
    fn test_non_ascii_digits_fall_back() {
        let frames = parse_stack(Some("Error\n  at f (a.js:\u{661}:\u{662})"));
        assert_eq!(
            frames,
            vec![StackFrame::Raw {
                raw: "at f (a.js:\u{661}:\u{662})".to_string()
            }]
        );
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let frames = parse_stack(Some("Error\n  at f (a.js:1:1)\n\n   \n  at b.js:2:2\n"));
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_zero_position_is_unknown() {
        let frames = parse_stack(Some("Error\n  at f (a.js:0:7)"));
        assert_eq!(
            frames,
            vec![StackFrame::Located {
                function: Some("f".to_string()),
                file: "a.js".to_string(),
                line: None,
                column: Some(7),
            }]
        );
    }

    #[test]
    fn test_overflowing_position_is_unknown() {
        let frames = parse_stack(Some("Error\n  at a.js:99999999999:1"));
        assert_eq!(frames[0], StackFrame::Located {
            function: None,
            file: "a.js".to_string(),
            line: None,
            column: Some(1),
        });
    }

    #[test]
    fn test_empty_file_frame_is_dropped() {
        assert!(parse_stack(Some("Error\n  at :1:2")).is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let frames = parse_stack(Some("Error: boom\r\n  at myFn (app.js:1:2)\r\n  at app.js:3:4\r\n"));
        assert_eq!(
            frames,
            vec![
                located(Some("myFn"), "app.js", 1, 2),
                located(None, "app.js", 3, 4)
            ]
        );
    }
}
