// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxEV.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use super::errors::{HaError, HaResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    pub attributes: serde_json::Value,
    pub last_changed: String,
    pub last_updated: String,
}

impl HaEntityState {
    /// `unit_of_measurement` attribute, if the entity declares one
    pub fn unit(&self) -> Option<&str> {
        self.attributes
            .get("unit_of_measurement")
            .and_then(|u| u.as_str())
    }

    /// Parse the state as a number
    ///
    /// HA reports "unavailable"/"unknown" while an integration is reconnecting.
    pub fn numeric_value(&self) -> HaResult<f64> {
        self.state
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| HaError::Unavailable {
                entity_id: self.entity_id.clone(),
                state: self.state.clone(),
            })
    }

    /// Power in watts, converting from kW when needed
    pub fn power_w(&self) -> HaResult<f64> {
        let value = self.numeric_value()?;
        match self.unit() {
            None | Some("W") => Ok(value),
            Some("kW") => Ok(value * 1000.0),
            Some(unit) => Err(self.unsupported(unit)),
        }
    }

    /// Energy in kWh, converting from Wh when needed
    pub fn energy_kwh(&self) -> HaResult<f64> {
        let value = self.numeric_value()?;
        match self.unit() {
            None | Some("kWh") => Ok(value),
            Some("Wh") => Ok(value / 1000.0),
            Some(unit) => Err(self.unsupported(unit)),
        }
    }

    /// Binary entity state (`on`/`off`)
    pub fn is_on(&self) -> HaResult<bool> {
        match self.state.as_str() {
            "on" => Ok(true),
            "off" => Ok(false),
            _ => Err(HaError::Unavailable {
                entity_id: self.entity_id.clone(),
                state: self.state.clone(),
            }),
        }
    }

    fn unsupported(&self, unit: &str) -> HaError {
        HaError::UnsupportedUnit {
            entity_id: self.entity_id.clone(),
            unit: unit.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: &str, unit: Option<&str>) -> HaEntityState {
        HaEntityState {
            entity_id: "sensor.test".to_string(),
            state: value.to_string(),
            attributes: unit.map_or_else(|| json!({}), |u| json!({ "unit_of_measurement": u })),
            last_changed: "2025-10-02T10:00:00Z".to_string(),
            last_updated: "2025-10-02T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_power_units() {
        assert_eq!(state("1500", Some("W")).power_w().unwrap(), 1500.0);
        assert_eq!(state("1.5", Some("kW")).power_w().unwrap(), 1500.0);
        assert_eq!(state("-250.5", None).power_w().unwrap(), -250.5);
        assert!(matches!(
            state("3", Some("A")).power_w(),
            Err(HaError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_energy_units() {
        assert_eq!(state("12.5", Some("kWh")).energy_kwh().unwrap(), 12.5);
        assert_eq!(state("2500", Some("Wh")).energy_kwh().unwrap(), 2.5);
    }

    #[test]
    fn test_unavailable_state() {
        for raw in ["unavailable", "unknown", "", "nan"] {
            assert!(matches!(
                state(raw, Some("W")).power_w(),
                Err(HaError::Unavailable { .. })
            ));
        }
    }

    #[test]
    fn test_binary_state() {
        assert!(state("on", None).is_on().unwrap());
        assert!(!state("off", None).is_on().unwrap());
        assert!(state("unavailable", None).is_on().is_err());
    }
}
