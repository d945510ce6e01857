//! Runtime feature gates.
//!
//! Gates are plain atomics so they can be flipped while authorizers and
//! updaters hold a shared `Arc<FeatureGates>`. A flip takes effect on the
//! next check; nothing is cached.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

/// A gated relation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Node → Attachment edges and the attachment reachability check.
    VolumeAttachmentAccess,
}

impl Feature {
    pub const ALL: [Feature; 1] = [Feature::VolumeAttachmentAccess];

    pub const fn name(self) -> &'static str {
        match self {
            Feature::VolumeAttachmentAccess => "VolumeAttachmentAccess",
        }
    }

    pub const fn default_enabled(self) -> bool {
        match self {
            Feature::VolumeAttachmentAccess => false,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| CoreError::UnknownFeature(s.to_string()))
    }
}

/// The set of feature gates for a process.
pub struct FeatureGates {
    flags: [AtomicBool; Feature::ALL.len()],
}

impl FeatureGates {
    /// Gates with every feature at its default.
    pub fn new() -> Self {
        Self {
            flags: Feature::ALL.map(|f| AtomicBool::new(f.default_enabled())),
        }
    }

    /// Parse a `Name=bool,Name=bool` setting on top of the defaults.
    pub fn parse(setting: &str) -> Result<Self, CoreError> {
        let gates = Self::new();
        for pair in setting.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| CoreError::MalformedFeatureSetting(pair.to_string()))?;
            let feature: Feature = name.trim().parse()?;
            let enabled: bool = value
                .trim()
                .parse()
                .map_err(|_| CoreError::MalformedFeatureSetting(pair.to_string()))?;
            gates.set(feature, enabled);
        }
        Ok(gates)
    }

    pub fn with(self, feature: Feature, enabled: bool) -> Self {
        self.set(feature, enabled);
        self
    }

    pub fn enabled(&self, feature: Feature) -> bool {
        self.flags[feature.index()].load(Ordering::Acquire)
    }

    pub fn set(&self, feature: Feature, enabled: bool) {
        let previous = self.flags[feature.index()].swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            tracing::info!("Feature gate {} set to {}", feature, enabled);
        }
    }
}

impl Default for FeatureGates {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FeatureGates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for feature in Feature::ALL {
            map.entry(&feature.name(), &self.enabled(feature));
        }
        map.finish()
    }
}
