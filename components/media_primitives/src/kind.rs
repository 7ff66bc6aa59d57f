use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KindError {
    #[error("Unknown media kind: {0}")]
    UnknownKind(String),

    #[error("Unknown quality tier: {0}")]
    UnknownTier(String),
}

/// Whether a job targets a full video stream or audio only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl FromStr for MediaKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(KindError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Output quality tier selecting an encoder preset fragment.
///
/// Tiers order from `Highest` (largest files, slowest encode) down to
/// `Low` (smallest files, fastest encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Highest,
    High,
    Medium,
    Low,
}

impl QualityTier {
    /// All tiers, in quality order.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Highest,
        QualityTier::High,
        QualityTier::Medium,
        QualityTier::Low,
    ];
}

impl FromStr for QualityTier {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "highest" => Ok(QualityTier::Highest),
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            other => Err(KindError::UnknownTier(other.to_string())),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Highest => write!(f, "highest"),
            QualityTier::High => write!(f, "high"),
            QualityTier::Medium => write!(f, "medium"),
            QualityTier::Low => write!(f, "low"),
        }
    }
}
