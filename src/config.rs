//! Report configuration

use serde::{Deserialize, Serialize};

use crate::annotator::UnderflowPolicy;
use crate::dates::{ReferenceClock, DEFAULT_REFERENCE_TIMEZONE};
use crate::error::GridError;

/// Default width of monthly reports in weeks
pub const DEFAULT_NUM_WEEKS: usize = 4;

/// Settings shared by every report build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// IANA timezone used to resolve the `NOW` end date
    pub reference_timezone: String,
    /// Weeks per monthly window
    pub num_weeks: usize,
    /// Marker placement when a start date is the first day of a daily report
    pub daily_underflow: UnderflowPolicy,
    /// Marker placement in windowed reports, where the start is always column 0
    pub window_underflow: UnderflowPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            reference_timezone: DEFAULT_REFERENCE_TIMEZONE.to_string(),
            num_weeks: DEFAULT_NUM_WEEKS,
            daily_underflow: UnderflowPolicy::Reject,
            window_underflow: UnderflowPolicy::Skip,
        }
    }
}

impl GridConfig {
    /// Load and validate a configuration from JSON; absent fields take defaults
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, GridError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.num_weeks == 0 {
            return Err(GridError::InvalidConfig(
                "num_weeks must be at least 1".to_string(),
            ));
        }
        self.clock()?;
        Ok(())
    }

    /// Clock for the configured reference timezone
    pub fn clock(&self) -> Result<ReferenceClock, GridError> {
        ReferenceClock::new(&self.reference_timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = GridConfig::from_json(r#"{"num_weeks": 2}"#).unwrap();

        assert_eq!(config.num_weeks, 2);
        assert_eq!(config.reference_timezone, "America/New_York");
        assert_eq!(config.daily_underflow, UnderflowPolicy::Reject);
        assert_eq!(config.window_underflow, UnderflowPolicy::Skip);
    }

    #[test]
    fn test_policy_names() {
        let config =
            GridConfig::from_json(r#"{"daily_underflow": "clamp", "window_underflow": "reject"}"#)
                .unwrap();
        assert_eq!(config.daily_underflow, UnderflowPolicy::Clamp);
        assert_eq!(config.window_underflow, UnderflowPolicy::Reject);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let result = GridConfig::from_json(r#"{"reference_timezone": "Nowhere/Town"}"#);
        assert!(matches!(result, Err(GridError::InvalidTimezone(_))));
    }

    #[test]
    fn test_zero_weeks_rejected() {
        let result = GridConfig::from_json(r#"{"num_weeks": 0}"#);
        assert!(matches!(result, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = GridConfig::default();
        let restored = GridConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, restored);
    }
}
