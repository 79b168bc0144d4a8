use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Observation;

/// How to interpret a freshly scraped view count of exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroViewsPolicy {
    /// Trust zero only when other fields were found; otherwise ignore the observation.
    #[default]
    TrustWhenCorroborated,
    /// Zero views means the post is gone.
    TreatAsRemoved,
    /// Zero views is a real count.
    AlwaysTrust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroViewsVerdict {
    Trust,
    Removed,
    Suspicious,
}

impl ZeroViewsPolicy {
    pub fn judge(&self, observation: &Observation) -> ZeroViewsVerdict {
        match self {
            ZeroViewsPolicy::TrustWhenCorroborated => {
                if observation.has_corroborating_fields() {
                    ZeroViewsVerdict::Trust
                } else {
                    ZeroViewsVerdict::Suspicious
                }
            }
            ZeroViewsPolicy::TreatAsRemoved => ZeroViewsVerdict::Removed,
            ZeroViewsPolicy::AlwaysTrust => ZeroViewsVerdict::Trust,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroViewsPolicy::TrustWhenCorroborated => "trust-when-corroborated",
            ZeroViewsPolicy::TreatAsRemoved => "treat-as-removed",
            ZeroViewsPolicy::AlwaysTrust => "always-trust",
        }
    }
}

impl fmt::Display for ZeroViewsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zero-views policy '{0}' (expected trust-when-corroborated, treat-as-removed or always-trust)")]
pub struct UnknownPolicy(pub String);

impl FromStr for ZeroViewsPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "trust-when-corroborated" => Ok(ZeroViewsPolicy::TrustWhenCorroborated),
            "treat-as-removed" => Ok(ZeroViewsPolicy::TreatAsRemoved),
            "always-trust" => Ok(ZeroViewsPolicy::AlwaysTrust),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}
