use compute::PressureThresholds;
use foundation::math::Vec2;
use scene::{TOOLTIP_OFFSET, ViewConfig};
use serde::{Deserialize, Serialize};

pub const FEED_URL: &str = "https://pum--on-default-rtdb.firebaseio.com/rescuedAnimals.json";
pub const REGION: &str = "경기도";

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "invalid config JSON: {e}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid config field {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Dashboard settings. Every field defaults, so a config file only lists
/// what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub feed_url: String,
    /// Region whose shelters feed the statistics and the drill-down overrides.
    pub region: String,
    #[serde(flatten)]
    pub views: ViewConfig,
    pub top_shelters: usize,
    pub pet_card_limit: usize,
    pub counter_duration_ms: f64,
    /// Tooltip offset from the pointer, `[x, y]` in CSS pixels.
    pub tooltip_offset: [f64; 2],
    pub thresholds: PressureThresholds,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed_url: FEED_URL.to_string(),
            region: REGION.to_string(),
            views: ViewConfig::default(),
            top_shelters: 5,
            pet_card_limit: 4,
            counter_duration_ms: 800.0,
            tooltip_offset: [TOOLTIP_OFFSET.x, TOOLTIP_OFFSET.y],
            thresholds: PressureThresholds::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(payload).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.counter_duration_ms.is_finite() && self.counter_duration_ms >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "counter_duration_ms",
                reason: format!("expected a non-negative duration, got {}", self.counter_duration_ms),
            });
        }
        if self.thresholds.warning > self.thresholds.danger {
            return Err(ConfigError::Invalid {
                field: "thresholds",
                reason: "warning must not exceed danger".to_string(),
            });
        }
        Ok(())
    }

    pub fn tooltip_offset(&self) -> Vec2 {
        Vec2::new(self.tooltip_offset[0], self.tooltip_offset[1])
    }
}
