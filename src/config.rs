use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{HotelError, Result};

/// hotel-wide pricing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelConfig {
    /// flat price of one night in any room
    pub nightly_rate: Money,
    /// display currency code, amounts are never converted
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for HotelConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl HotelConfig {
    /// 100 per night
    pub fn standard() -> Self {
        Self {
            nightly_rate: Money::from_major(100),
            currency: default_currency(),
        }
    }

    pub fn with_nightly_rate(nightly_rate: Money) -> Self {
        Self {
            nightly_rate,
            ..Self::standard()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.nightly_rate.is_positive() {
            return Err(HotelError::InvalidConfiguration {
                message: format!("nightly rate must be positive, got {}", self.nightly_rate),
            });
        }
        // any stay length a booking can express must stay priceable
        if self.nightly_rate.checked_times(u32::MAX).is_none() {
            return Err(HotelError::InvalidConfiguration {
                message: format!("nightly rate {} is too large", self.nightly_rate),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(HotelError::InvalidConfiguration {
                message: "currency must be provided".to_string(),
            });
        }
        Ok(())
    }

    /// parse and validate a json document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HotelConfig =
            serde_json::from_str(json).map_err(|e| HotelError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| HotelError::InvalidConfiguration {
            message: e.to_string(),
        })
    }
}
