// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode enumerations for Total Connect Comfort thermostats.
//!
//! The portal encodes operating modes as small integers. These types carry
//! the exact wire indices and the portal's display strings, so callers never
//! juggle magic numbers.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// SystemMode
// =============================================================================

/// Operating mode of the heating/cooling system.
///
/// The portal's `SystemSwitchPosition` field encodes these as 0-5, where
/// both 4 and 5 mean automatic changeover (a portal quirk; 4 is sent when
/// writing).
///
/// # Examples
///
/// ```
/// use comfortr_lib::types::SystemMode;
///
/// assert_eq!(SystemMode::Heat.as_str(), "heat");
/// assert_eq!(SystemMode::Heat.as_position(), 1);
/// assert_eq!(SystemMode::from_position(5), Some(SystemMode::Auto));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemMode {
    /// Emergency/auxiliary heat (heat pumps).
    EmergencyHeat,
    /// Heating only.
    Heat,
    /// System off.
    Off,
    /// Cooling only.
    Cool,
    /// Automatic changeover between heating and cooling.
    Auto,
}

impl SystemMode {
    /// Returns the portal's display string for this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmergencyHeat => "emheat",
            Self::Heat => "heat",
            Self::Off => "off",
            Self::Cool => "cool",
            Self::Auto => "auto",
        }
    }

    /// Returns the `SystemSwitchPosition` value sent to the portal.
    #[must_use]
    pub const fn as_position(&self) -> u8 {
        match self {
            Self::EmergencyHeat => 0,
            Self::Heat => 1,
            Self::Off => 2,
            Self::Cool => 3,
            Self::Auto => 4,
        }
    }

    /// Decodes a `SystemSwitchPosition` value reported by the portal.
    ///
    /// Position 5 is accepted as [`SystemMode::Auto`]; the portal reports
    /// both 4 and 5 for automatic changeover.
    #[must_use]
    pub const fn from_position(position: u8) -> Option<Self> {
        match position {
            0 => Some(Self::EmergencyHeat),
            1 => Some(Self::Heat),
            2 => Some(Self::Off),
            3 => Some(Self::Cool),
            4 | 5 => Some(Self::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SystemMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emheat" | "0" => Ok(Self::EmergencyHeat),
            "heat" | "1" => Ok(Self::Heat),
            "off" | "2" => Ok(Self::Off),
            "cool" | "3" => Ok(Self::Cool),
            "auto" | "4" | "5" => Ok(Self::Auto),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

// =============================================================================
// FanMode
// =============================================================================

/// Operating mode of the circulation fan.
///
/// The portal's `fanMode` field encodes these as 0-3.
///
/// # Examples
///
/// ```
/// use comfortr_lib::types::FanMode;
///
/// assert_eq!(FanMode::Circulate.as_index(), 2);
/// assert_eq!(FanMode::from_index(1), Some(FanMode::On));
/// assert_eq!(FanMode::FollowSchedule.as_str(), "follow schedule");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanMode {
    /// Fan runs only when heating or cooling demands it.
    Auto,
    /// Fan runs continuously.
    On,
    /// Fan cycles periodically to circulate air.
    Circulate,
    /// Fan follows the programmed schedule.
    FollowSchedule,
}

impl FanMode {
    /// Returns the portal's display string for this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::On => "on",
            Self::Circulate => "circulate",
            Self::FollowSchedule => "follow schedule",
        }
    }

    /// Returns the `fanMode` value sent to the portal.
    #[must_use]
    pub const fn as_index(&self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::On => 1,
            Self::Circulate => 2,
            Self::FollowSchedule => 3,
        }
    }

    /// Decodes a `fanMode` value reported by the portal.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Auto),
            1 => Some(Self::On),
            2 => Some(Self::Circulate),
            3 => Some(Self::FollowSchedule),
            _ => None,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "0" => Ok(Self::Auto),
            "on" | "1" => Ok(Self::On),
            "circulate" | "2" => Ok(Self::Circulate),
            "follow schedule" | "3" => Ok(Self::FollowSchedule),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

// =============================================================================
// EquipmentStatus
// =============================================================================

/// What the HVAC equipment is doing right now.
///
/// The portal's `EquipmentOutputStatus` reports 1 for heating and 2 for
/// cooling. Zero (or an absent field) means idle, which resolves to
/// [`EquipmentStatus::Fan`] when the fan happens to be running and
/// [`EquipmentStatus::Off`] otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentStatus {
    /// Equipment idle, fan stopped.
    Off,
    /// Equipment idle, fan running.
    Fan,
    /// Actively heating.
    Heat,
    /// Actively cooling.
    Cool,
}

impl EquipmentStatus {
    /// Returns a lowercase label for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Fan => "fan",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }

    /// Decodes a raw `EquipmentOutputStatus` value.
    ///
    /// `raw` of `None` stands for an absent field, which the portal emits
    /// for idle equipment on some firmware revisions.
    #[must_use]
    pub const fn from_raw(raw: Option<i64>, fan_running: bool) -> Option<Self> {
        match raw {
            None | Some(0) => {
                if fan_running {
                    Some(Self::Fan)
                } else {
                    Some(Self::Off)
                }
            }
            Some(1) => Some(Self::Heat),
            Some(2) => Some(Self::Cool),
            Some(_) => None,
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// TemperatureUnit
// =============================================================================

/// Display unit a thermostat reports its temperatures in.
///
/// All setpoints and readings of one device use this unit; the portal never
/// mixes units within a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureUnit {
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Degrees Celsius.
    Celsius,
}

impl TemperatureUnit {
    /// Returns the portal's single-letter unit string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fahrenheit => "F",
            Self::Celsius => "C",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            "c" | "celsius" => Ok(Self::Celsius),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_mode_positions_round_trip() {
        for mode in [
            SystemMode::EmergencyHeat,
            SystemMode::Heat,
            SystemMode::Off,
            SystemMode::Cool,
            SystemMode::Auto,
        ] {
            assert_eq!(SystemMode::from_position(mode.as_position()), Some(mode));
        }
    }

    #[test]
    fn system_mode_position_five_is_auto() {
        assert_eq!(SystemMode::from_position(5), Some(SystemMode::Auto));
    }

    #[test]
    fn system_mode_unknown_position() {
        assert_eq!(SystemMode::from_position(6), None);
    }

    #[test]
    fn system_mode_from_str() {
        assert_eq!("heat".parse::<SystemMode>().unwrap(), SystemMode::Heat);
        assert_eq!("EMHEAT".parse::<SystemMode>().unwrap(), SystemMode::EmergencyHeat);
        assert_eq!("2".parse::<SystemMode>().unwrap(), SystemMode::Off);
        assert!("warm".parse::<SystemMode>().is_err());
    }

    #[test]
    fn fan_mode_indices_round_trip() {
        for mode in [
            FanMode::Auto,
            FanMode::On,
            FanMode::Circulate,
            FanMode::FollowSchedule,
        ] {
            assert_eq!(FanMode::from_index(mode.as_index()), Some(mode));
        }
    }

    #[test]
    fn fan_mode_unknown_index() {
        assert_eq!(FanMode::from_index(4), None);
    }

    #[test]
    fn fan_mode_from_str() {
        assert_eq!("on".parse::<FanMode>().unwrap(), FanMode::On);
        assert_eq!(
            "follow schedule".parse::<FanMode>().unwrap(),
            FanMode::FollowSchedule
        );
        assert!("fast".parse::<FanMode>().is_err());
    }

    #[test]
    fn equipment_status_idle_resolves_by_fan() {
        assert_eq!(
            EquipmentStatus::from_raw(Some(0), false),
            Some(EquipmentStatus::Off)
        );
        assert_eq!(
            EquipmentStatus::from_raw(Some(0), true),
            Some(EquipmentStatus::Fan)
        );
        assert_eq!(
            EquipmentStatus::from_raw(None, true),
            Some(EquipmentStatus::Fan)
        );
    }

    #[test]
    fn equipment_status_active_values() {
        assert_eq!(
            EquipmentStatus::from_raw(Some(1), true),
            Some(EquipmentStatus::Heat)
        );
        assert_eq!(
            EquipmentStatus::from_raw(Some(2), false),
            Some(EquipmentStatus::Cool)
        );
        assert_eq!(EquipmentStatus::from_raw(Some(7), false), None);
    }

    #[test]
    fn temperature_unit_from_str() {
        assert_eq!(
            "F".parse::<TemperatureUnit>().unwrap(),
            TemperatureUnit::Fahrenheit
        );
        assert_eq!(
            "c".parse::<TemperatureUnit>().unwrap(),
            TemperatureUnit::Celsius
        );
        assert!("K".parse::<TemperatureUnit>().is_err());
    }
}
