//! Line parser for `/proc` status text.
//!
//! Both `/proc/meminfo` and `/proc/[pid]/status` use the same loose layout:
//!
//! ```text
//! MemTotal:       16384000 kB
//! VmRSS:	    1234 kB
//! HugePages_Total:       0
//! ```
//!
//! A line is a counter name, an optional colon, whitespace, an integer value
//! and an optional unit. This is a pure function over a single line, so it is
//! tested with string inputs only.

use std::io::{self, BufRead};

use crate::model::Sample;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Splits a line on `:?\s+` boundaries.
///
/// Whitespace separates tokens, and a colon that sits right before a
/// separator belongs to the separator. Leading and trailing whitespace do
/// not produce empty tokens.
fn tokenize(line: &str) -> Vec<&str> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let last = words.len().saturating_sub(1);

    words
        .into_iter()
        .enumerate()
        .map(|(idx, word)| {
            if idx < last {
                word.strip_suffix(':').unwrap_or(word)
            } else {
                word
            }
        })
        .collect()
}

/// Parses one line of kernel status text into a [`Sample`].
///
/// The first token is the counter name, the second a base-10 integer, the
/// optional third token the unit.
///
/// # Errors
/// Returns [`ParseError`] when the line has fewer than two tokens or the
/// second token is not an integer. Callers treat this as "skip the line".
pub fn parse_line(line: &str) -> Result<Sample, ParseError> {
    let words = tokenize(line);
    if words.len() < 2 {
        return Err(ParseError::new(format!(
            "wrong input line {:?}: expected at least 2 fields, got {}",
            line,
            words.len()
        )));
    }

    let value: u64 = words[1]
        .parse()
        .map_err(|_| ParseError::new(format!("invalid value {:?} in line {:?}", words[1], line)))?;
    let unit = words.get(2).map(|u| u.to_string());

    Ok(Sample::new(words[0], value, unit))
}

/// Lines of kernel text, decoded lossily.
///
/// The kernel prints `comm` raw and truncated to 15 bytes, so a `Name:` line
/// can end in half of a multi-byte character. Such bytes become U+FFFD
/// instead of failing the read; only I/O errors are reported.
pub(crate) struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

pub(crate) fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

/// Returns the counter name of a line without parsing its value.
///
/// Used to filter lines against an allow-list before paying for a parse.
pub fn counter_name(line: &str) -> Option<&str> {
    tokenize(line).first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo_line() {
        let sample = parse_line("MemTotal:       16384000 kB").unwrap();
        assert_eq!(sample.name, "MemTotal");
        assert_eq!(sample.value, 16384000);
        assert_eq!(sample.unit.as_deref(), Some("kB"));
    }

    #[test]
    fn test_parse_status_line_with_tabs() {
        let sample = parse_line("VmRSS:\t    1234 kB").unwrap();
        assert_eq!(sample.name, "VmRSS");
        assert_eq!(sample.value, 1234);
        assert_eq!(sample.unit.as_deref(), Some("kB"));
    }

    #[test]
    fn test_parse_line_without_colon_or_unit() {
        let sample = parse_line("pgfault 999999").unwrap();
        assert_eq!(sample.name, "pgfault");
        assert_eq!(sample.value, 999999);
        assert_eq!(sample.unit, None);
    }

    #[test]
    fn test_parse_line_unitless_counter() {
        let sample = parse_line("HugePages_Total:       0").unwrap();
        assert_eq!(sample.name, "HugePages_Total");
        assert_eq!(sample.value, 0);
        assert_eq!(sample.unit, None);
    }

    #[test]
    fn test_parse_line_leading_whitespace() {
        let sample = parse_line("   Cached:  2048 kB").unwrap();
        assert_eq!(sample.name, "Cached");
        assert_eq!(sample.value, 2048);
    }

    #[test]
    fn test_parse_line_too_few_tokens() {
        assert!(parse_line("").is_err());
        assert!(parse_line("MemTotal:").is_err());
        assert!(parse_line("   ").is_err());
    }

    #[test]
    fn test_parse_line_non_numeric_value() {
        let err = parse_line("Name:\tbash").unwrap_err();
        assert!(err.message.contains("bash"));

        assert!(parse_line("MemTotal: 12.5 kB").is_err());
        assert!(parse_line("MemTotal: -5 kB").is_err());
    }

    #[test]
    fn test_colon_inside_token_is_kept() {
        // Only a colon right before whitespace is a separator.
        let sample = parse_line("a:b 7").unwrap();
        assert_eq!(sample.name, "a:b");
        assert_eq!(sample.value, 7);
    }

    #[test]
    fn test_lossy_lines_keeps_invalid_utf8() {
        let raw: &[u8] = b"Name:\tnode-\xe6\x97\nVmRSS:\t250 kB\nlast";
        let lines: Vec<String> = lossy_lines(raw).map(|l| l.unwrap()).collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name:\tnode-"));
        assert!(lines[0].contains('\u{FFFD}'));
        assert_eq!(lines[1], "VmRSS:\t250 kB");
        assert_eq!(lines[2], "last");
    }

    #[test]
    fn test_counter_name() {
        assert_eq!(counter_name("VmSize:\t  1000 kB"), Some("VmSize"));
        assert_eq!(counter_name("Name:\tbash"), Some("Name"));
        assert_eq!(counter_name("VmRSSx: 1 kB"), Some("VmRSSx"));
        assert_eq!(counter_name(""), None);
    }
}
