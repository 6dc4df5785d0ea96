// ABOUTME: Persisted extension toggles, serialized under the storage keys the popup uses.
// ABOUTME: Settings::commands() turns stored toggles into the commands that restore them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::dispatch::Command;
use crate::error::{EngineError, Result};

const ENERGY_MIN: u8 = 1;
const ENERGY_MAX: u8 = 10;

/// Toggles remembered across page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "settings_bionic")]
    pub bionic: bool,
    #[serde(rename = "settings_clutter")]
    pub clutter_free: bool,
    /// Self-reported energy level, 1..=10.
    #[serde(rename = "settings_energy", deserialize_with = "energy_level")]
    pub energy: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bionic: false,
            clutter_free: false,
            energy: 5,
        }
    }
}

/// Accepts numbers or numeric strings (range inputs store strings) and clamps.
fn energy_level<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n,
        Raw::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom)?,
    };
    if !value.is_finite() {
        return Err(serde::de::Error::custom("energy level must be a finite number"));
    }
    Ok(value.round().clamp(ENERGY_MIN as f64, ENERGY_MAX as f64) as u8)
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::config("settings", Some(e.into())))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Commands that bring a freshly loaded page in line with these settings.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.bionic {
            commands.push(Command::SetReadingAid(true));
        }
        if self.clutter_free {
            commands.push(Command::SetFocusView(true));
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys() {
        let settings = Settings {
            bionic: true,
            clutter_free: false,
            energy: 7,
        };
        let json = settings.to_json();
        assert!(json.contains(r#""settings_bionic":true"#));
        assert!(json.contains(r#""settings_clutter":false"#));
        assert!(json.contains(r#""settings_energy":7"#));
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_energy_from_string_is_clamped() {
        let s = Settings::from_json(r#"{"settings_energy": "42"}"#).unwrap();
        assert_eq!(s.energy, 10);
        let s = Settings::from_json(r#"{"settings_energy": 0}"#).unwrap();
        assert_eq!(s.energy, 1);
        assert!(Settings::from_json(r#"{"settings_energy": "high"}"#).is_err());
        assert!(Settings::from_json(r#"{"settings_energy": "NaN"}"#).is_err());
        assert!(Settings::from_json(r#"{"settings_energy": "inf"}"#).is_err());
    }

    #[test]
    fn test_missing_keys_default() {
        let s = Settings::from_json("{}").unwrap();
        assert_eq!(s, Settings::default());
        assert!(s.commands().is_empty());
    }

    #[test]
    fn test_commands_restore_toggles() {
        let s = Settings::from_json(r#"{"settings_bionic": true, "settings_clutter": true}"#).unwrap();
        assert_eq!(
            s.commands(),
            vec![Command::SetReadingAid(true), Command::SetFocusView(true)]
        );
    }
}
