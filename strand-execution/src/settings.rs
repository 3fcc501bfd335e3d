// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ExecutionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use strand_models::constants::MAX_OFFERS_EXAMINED;

/// A protocol feature gate consulted at the top of preflight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// payment channel transaction types
    PaymentChannels,
    /// the order-crossing flow engine
    FlowCross,
}

/// The set of enabled protocol features.
///
/// A disabled feature rejects its transaction types outright in preflight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    enabled: BTreeSet<Feature>,
}

impl Rules {
    /// Rules with every feature enabled.
    pub fn all_enabled() -> Self {
        Rules {
            enabled: BTreeSet::from([Feature::PaymentChannels, Feature::FlowCross]),
        }
    }

    /// Rules with no feature enabled.
    pub fn none_enabled() -> Self {
        Rules {
            enabled: BTreeSet::new(),
        }
    }

    /// Enable a feature.
    #[must_use]
    pub fn with(mut self, feature: Feature) -> Self {
        self.enabled.insert(feature);
        self
    }

    /// Returns `true` if the feature is enabled.
    pub fn enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::all_enabled()
    }
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// enabled protocol features
    pub rules: Rules,
    /// cap on offers examined per matching session
    pub max_offers_examined: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            rules: Rules::default(),
            max_offers_examined: MAX_OFFERS_EXAMINED,
        }
    }
}

impl ExecutionConfig {
    /// Load the configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ExecutionError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ExecutionError::ConfigError(format!(
                "error loading execution config {}: {}",
                path.to_str().unwrap_or("(non-utf8 path)"),
                err
            ))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            ExecutionError::ConfigError(format!(
                "error parsing execution config {}: {}",
                path.to_str().unwrap_or("(non-utf8 path)"),
                err
            ))
        })
    }
}
