use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::issue::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Development,
    Release,
    Stable,
    Obsolete,
}

impl ProjectStatus {
    pub const NAMES: &'static [&'static str] = &["development", "release", "stable", "obsolete"];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Development => "development",
            ProjectStatus::Release => "release",
            ProjectStatus::Stable => "stable",
            ProjectStatus::Obsolete => "obsolete",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(ProjectStatus::Development),
            "release" => Ok(ProjectStatus::Release),
            "stable" => Ok(ProjectStatus::Stable),
            "obsolete" => Ok(ProjectStatus::Obsolete),
            _ => Err(ParseEnumError {
                kind: "project status",
                value: value.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}
