// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat command payloads.
//!
//! The portal takes device changes as a single JSON object posted to
//! `SubmitControlScreenChanges`. Fields that are not being changed must
//! still appear, set to `null`; [`ControlScreenChanges`] produces exactly
//! that shape.

use serde::Serialize;

use crate::error::ValidationError;
use crate::types::{DeviceId, FanMode, Hold, SystemMode, quarter_hours};

/// A change set for one thermostat.
///
/// Build one with the `with_*` methods; untouched fields serialize as
/// `null`, which the portal reads as "leave unchanged".
///
/// # Examples
///
/// ```
/// use comfortr_lib::command::ControlScreenChanges;
/// use comfortr_lib::types::{DeviceId, SystemMode};
///
/// let changes = ControlScreenChanges::new(DeviceId::from("1234"))
///     .with_system_mode(SystemMode::Cool)
///     .with_cool_setpoint(75.0);
/// let json = serde_json::to_value(&changes).unwrap();
/// assert_eq!(json["SystemSwitch"], 3);
/// assert!(json["HeatSetpoint"].is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ControlScreenChanges {
    #[serde(rename = "DeviceID")]
    device_id: DeviceId,
    system_switch: Option<u8>,
    heat_setpoint: Option<f64>,
    cool_setpoint: Option<f64>,
    heat_next_period: Option<u16>,
    cool_next_period: Option<u16>,
    status_heat: Option<u8>,
    status_cool: Option<u8>,
    fan_mode: Option<u8>,
}

impl ControlScreenChanges {
    /// Creates an empty change set for the given device.
    #[must_use]
    pub const fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            system_switch: None,
            heat_setpoint: None,
            cool_setpoint: None,
            heat_next_period: None,
            cool_next_period: None,
            status_heat: None,
            status_cool: None,
            fan_mode: None,
        }
    }

    /// Switches the system operating mode.
    #[must_use]
    pub const fn with_system_mode(mut self, mode: SystemMode) -> Self {
        self.system_switch = Some(mode.as_position());
        self
    }

    /// Sets the heat setpoint.
    #[must_use]
    pub const fn with_heat_setpoint(mut self, temperature: f64) -> Self {
        self.heat_setpoint = Some(temperature);
        self
    }

    /// Sets the cool setpoint.
    #[must_use]
    pub const fn with_cool_setpoint(mut self, temperature: f64) -> Self {
        self.cool_setpoint = Some(temperature);
        self
    }

    /// Sets the fan mode.
    #[must_use]
    pub const fn with_fan_mode(mut self, mode: FanMode) -> Self {
        self.fan_mode = Some(mode.as_index());
        self
    }

    /// Applies a hold transition.
    ///
    /// The portal applies hold status to both sides at once, so both
    /// `Status*` fields are set; a temporary hold additionally carries its
    /// deadline in both `*NextPeriod` fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MisalignedDeadline`] when a temporary
    /// hold's deadline is not on a quarter-hour boundary.
    pub fn with_hold(mut self, hold: Hold) -> Result<Self, ValidationError> {
        let quarters = match hold {
            Hold::Temporary(deadline) => Some(quarter_hours(deadline)?),
            Hold::Schedule | Hold::Permanent => None,
        };
        self.status_heat = Some(hold.status_code());
        self.status_cool = Some(hold.status_code());
        self.heat_next_period = quarters;
        self.cool_next_period = quarters;
        Ok(self)
    }

    /// Marks both sides as temporary hold without touching the deadlines.
    ///
    /// A manual setpoint edit while both sides follow their schedule
    /// implies this, matching the thermostat's own front panel.
    #[must_use]
    pub const fn with_hold_promotion(mut self) -> Self {
        self.status_heat = Some(1);
        self.status_cool = Some(1);
        self
    }

    /// The device this change set addresses.
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// The heat setpoint staged in this change set, if any.
    #[must_use]
    pub const fn heat_setpoint(&self) -> Option<f64> {
        self.heat_setpoint
    }

    /// The cool setpoint staged in this change set, if any.
    #[must_use]
    pub const fn cool_setpoint(&self) -> Option<f64> {
        self.cool_setpoint
    }

    pub(crate) const fn system_switch(&self) -> Option<u8> {
        self.system_switch
    }

    pub(crate) const fn status_heat(&self) -> Option<u8> {
        self.status_heat
    }

    pub(crate) const fn status_cool(&self) -> Option<u8> {
        self.status_cool
    }

    pub(crate) const fn heat_next_period(&self) -> Option<u16> {
        self.heat_next_period
    }

    pub(crate) const fn cool_next_period(&self) -> Option<u16> {
        self.cool_next_period
    }

    pub(crate) const fn fan_mode(&self) -> Option<u8> {
        self.fan_mode
    }
}

/// Which humidification equipment a menu command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HumidityEquipment {
    /// The humidifier.
    Humidifier,
    /// The dehumidifier.
    Dehumidifier,
}

impl HumidityEquipment {
    /// URL path segment under `/portal/Device/Menu/`.
    #[must_use]
    pub const fn endpoint_segment(&self) -> &'static str {
        match self {
            Self::Humidifier => "Humidifier",
            Self::Dehumidifier => "Dehumidifier",
        }
    }

    /// Lowercase label for log and error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Humidifier => "humidifier",
            Self::Dehumidifier => "dehumidifier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use serde_json::{Value, json};

    #[test]
    fn empty_change_set_serializes_nulls() {
        let changes = ControlScreenChanges::new(DeviceId::from("42"));
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["DeviceID"], "42");
        for field in [
            "SystemSwitch",
            "HeatSetpoint",
            "CoolSetpoint",
            "HeatNextPeriod",
            "CoolNextPeriod",
            "StatusHeat",
            "StatusCool",
            "FanMode",
        ] {
            assert_eq!(json[field], Value::Null, "{field} should be null");
        }
    }

    #[test]
    fn setpoints_and_modes_serialize() {
        let changes = ControlScreenChanges::new(DeviceId::from("42"))
            .with_heat_setpoint(68.0)
            .with_fan_mode(FanMode::Circulate)
            .with_system_mode(SystemMode::EmergencyHeat);
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["HeatSetpoint"], json!(68.0));
        assert_eq!(json["FanMode"], json!(2));
        assert_eq!(json["SystemSwitch"], json!(0));
        assert_eq!(json["CoolSetpoint"], Value::Null);
    }

    #[test]
    fn temporary_hold_sets_both_sides() {
        let deadline = NaiveTime::from_hms_opt(17, 45, 0).unwrap();
        let changes = ControlScreenChanges::new(DeviceId::from("42"))
            .with_hold(Hold::Temporary(deadline))
            .unwrap();
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["StatusHeat"], json!(1));
        assert_eq!(json["StatusCool"], json!(1));
        assert_eq!(json["HeatNextPeriod"], json!(71));
        assert_eq!(json["CoolNextPeriod"], json!(71));
    }

    #[test]
    fn schedule_release_clears_periods() {
        let changes = ControlScreenChanges::new(DeviceId::from("42"))
            .with_hold(Hold::Schedule)
            .unwrap();
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["StatusHeat"], json!(0));
        assert_eq!(json["StatusCool"], json!(0));
        assert_eq!(json["HeatNextPeriod"], Value::Null);
    }

    #[test]
    fn misaligned_hold_deadline_is_rejected() {
        let deadline = NaiveTime::from_hms_opt(17, 40, 0).unwrap();
        let result =
            ControlScreenChanges::new(DeviceId::from("42")).with_hold(Hold::Temporary(deadline));
        assert!(matches!(
            result,
            Err(ValidationError::MisalignedDeadline(_))
        ));
    }

    #[test]
    fn hold_promotion_leaves_periods_alone() {
        let changes = ControlScreenChanges::new(DeviceId::from("42"))
            .with_heat_setpoint(70.0)
            .with_hold_promotion();
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["StatusHeat"], json!(1));
        assert_eq!(json["StatusCool"], json!(1));
        assert_eq!(json["HeatNextPeriod"], Value::Null);
        assert_eq!(json["CoolNextPeriod"], Value::Null);
    }

    #[test]
    fn equipment_endpoint_segments() {
        assert_eq!(HumidityEquipment::Humidifier.endpoint_segment(), "Humidifier");
        assert_eq!(HumidityEquipment::Dehumidifier.label(), "dehumidifier");
    }
}
