//! Result status and user feedback enumerations

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle of a single generated variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Like/dislike tag a user attaches to a generated variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserFeedback {
    #[default]
    None,
    Like,
    Dislike,
}

impl std::fmt::Display for UserFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Like => write!(f, "like"),
            Self::Dislike => write!(f, "dislike"),
        }
    }
}

impl std::str::FromStr for UserFeedback {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            _ => Err(DomainError::parse(format!("Unknown feedback: {}", s))),
        }
    }
}
