use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} '{}'; expected one of: {}",
            self.kind,
            self.value,
            self.expected.join(", ")
        )
    }
}

impl Error for ParseEnumError {}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    New,
    Assigned,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub const NAMES: &'static [&'static str] = &["new", "assigned", "resolved", "closed"];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::New => "new",
            IssueStatus::Assigned => "assigned",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, IssueStatus::New | IssueStatus::Assigned)
    }
}

impl FromStr for IssueStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "new" => Ok(IssueStatus::New),
            "assigned" => Ok(IssueStatus::Assigned),
            "resolved" => Ok(IssueStatus::Resolved),
            "closed" => Ok(IssueStatus::Closed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: value.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Immediate,
}

impl Priority {
    pub const NAMES: &'static [&'static str] = &["low", "normal", "high", "immediate"];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Immediate => "immediate",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "immediate" => Ok(Priority::Immediate),
            _ => Err(ParseEnumError {
                kind: "priority",
                value: value.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Feature,
    #[default]
    Minor,
    Major,
    Crash,
}

impl Severity {
    pub const NAMES: &'static [&'static str] = &["feature", "minor", "major", "crash"];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Feature => "feature",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Crash => "crash",
        }
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "feature" => Ok(Severity::Feature),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "crash" => Ok(Severity::Crash),
            _ => Err(ParseEnumError {
                kind: "severity",
                value: value.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    #[default]
    Standard,
    Checklist,
}

impl IssueType {
    pub const NAMES: &'static [&'static str] = &["standard", "checklist"];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Standard => "standard",
            IssueType::Checklist => "checklist",
        }
    }
}

impl FromStr for IssueType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "standard" => Ok(IssueType::Standard),
            "checklist" => Ok(IssueType::Checklist),
            _ => Err(ParseEnumError {
                kind: "issue type",
                value: value.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(IssueStatus, Priority, Severity, IssueType);
