use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single download mirror: host label plus outbound link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub host: String,
    pub link: String,
}

/// One quality tier of a download block: its label ("480p"), a size token
/// and the mirror list collected from that tier's anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTier {
    pub quality: String,
    pub size: String,
    pub download_links: Vec<Mirror>,
}

/// The three-tier download structure stored as a JSON text column.
///
/// Individual tiers may be absent when the upstream page lacks that
/// quality, but the three keys are always serialized so readers can rely
/// on the shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    pub low_quality: Option<QualityTier>,
    pub medium_quality: Option<QualityTier>,
    pub high_quality: Option<QualityTier>,
}

impl DownloadLinks {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.low_quality.is_none() && self.medium_quality.is_none() && self.high_quality.is_none()
    }
}
