//! Engine configuration.

use chrono_tz::Tz;

/// Configuration for the quota engine.
///
/// All calendar anchors (daily and monthly reset boundaries) are computed in
/// a single civil timezone so that "today" means the same thing for every
/// record a subscriber owns, regardless of where the serving process runs.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Civil timezone used to derive calendar dates from the wall clock.
    pub timezone: Tz,
    /// Length of the Pro trial, in days.
    pub trial_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::Europe__Rome,
            trial_days: 7,
        }
    }
}

impl EngineConfig {
    /// Create a builder for constructing a configuration.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    timezone: Option<Tz>,
    trial_days: Option<u32>,
}

impl EngineConfigBuilder {
    /// Set the civil timezone.
    #[must_use]
    pub fn timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Set the trial length in days.
    #[must_use]
    pub fn trial_days(mut self, days: u32) -> Self {
        self.trial_days = Some(days);
        self
    }

    /// Build the configuration, falling back to defaults for unset fields.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            timezone: self.timezone.unwrap_or(defaults.timezone),
            trial_days: self.trial_days.unwrap_or(defaults.trial_days),
        }
    }
}
