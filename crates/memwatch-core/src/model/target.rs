//! Processes selected for sampling.

use std::fmt;
use std::str::FromStr;

/// A named process to sample.
///
/// The label prefixes every metric emitted for this process, so
/// `web=1234` produces `webVmSize`, `webVmRss` and `webMemUsedPercent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTarget {
    label: String,
    pid: u32,
}

impl ProcessTarget {
    /// Creates a target, rejecting an empty label or a zero pid.
    pub fn new(label: impl Into<String>, pid: u32) -> Result<Self, TargetParseError> {
        let label = label.into();
        if label.is_empty() {
            return Err(TargetParseError::EmptyLabel);
        }
        if pid == 0 {
            return Err(TargetParseError::InvalidPid(pid.to_string()));
        }
        Ok(Self { label, pid })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl fmt::Display for ProcessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.label, self.pid)
    }
}

/// Error for a malformed `label=pid` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetParseError {
    /// Not exactly one `=` in the entry.
    Format(String),
    /// Label before `=` is empty.
    EmptyLabel,
    /// Pid is not a positive integer.
    InvalidPid(String),
}

impl fmt::Display for TargetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetParseError::Format(s) => {
                write!(f, "invalid target {:?}: expected format label=<pid>", s)
            }
            TargetParseError::EmptyLabel => write!(f, "target label must not be empty"),
            TargetParseError::InvalidPid(s) => {
                write!(f, "invalid pid {:?}: must be a positive integer", s)
            }
        }
    }
}

impl std::error::Error for TargetParseError {}

impl FromStr for ProcessTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split('=').collect();
        if words.len() != 2 {
            return Err(TargetParseError::Format(s.to_string()));
        }

        let pid_str = words[1].trim();
        let pid: i64 = pid_str
            .parse()
            .map_err(|_| TargetParseError::InvalidPid(pid_str.to_string()))?;
        let pid = u32::try_from(pid)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| TargetParseError::InvalidPid(pid_str.to_string()))?;

        ProcessTarget::new(words[0].trim(), pid)
    }
}
