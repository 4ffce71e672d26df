//! Validator configuration.

use serde::{Deserialize, Serialize};

/// Knobs for one validation run.
///
/// Deserializable so the CLI can read it from a JSON config file; every
/// field defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    /// Count events per class and per tag while validating.
    pub collect_summary: bool,
    /// Reject envelope keys other than `type` and `data`.
    pub strict_envelope: bool,
}

impl ValidatorOptions {
    /// Options with summary collection enabled.
    pub fn with_summary(mut self) -> Self {
        self.collect_summary = true;
        self
    }

    /// Options with strict envelope checking enabled.
    pub fn strict(mut self) -> Self {
        self.strict_envelope = true;
        self
    }
}
