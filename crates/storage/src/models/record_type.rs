use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Metric tracked by a personal record chain. Every variant is higher-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    MaxWeight,
    MaxReps,
    MaxDuration,
    MaxVolume,
    MaxDistance,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxWeight => "max_weight",
            Self::MaxReps => "max_reps",
            Self::MaxDuration => "max_duration",
            Self::MaxVolume => "max_volume",
            Self::MaxDistance => "max_distance",
        }
    }

    pub fn all() -> &'static [RecordType] {
        &[
            Self::MaxWeight,
            Self::MaxReps,
            Self::MaxDuration,
            Self::MaxVolume,
            Self::MaxDistance,
        ]
    }

    fn parse_str(s: &str) -> Result<Self, StorageError> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "max_weight" => Ok(Self::MaxWeight),
            "max_reps" => Ok(Self::MaxReps),
            "max_duration" => Ok(Self::MaxDuration),
            "max_volume" => Ok(Self::MaxVolume),
            "max_distance" => Ok(Self::MaxDistance),
            _ => Err(StorageError::InvalidRecordType(s.to_string())),
        }
    }
}

impl TryFrom<&str> for RecordType {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse_str(value)
    }
}

impl std::str::FromStr for RecordType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
