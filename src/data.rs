// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire payloads exchanged with the portal.
//!
//! Every struct models the fields this library reads by name and funnels
//! everything else into a capture-all `extra` map, so payloads survive the
//! portal's schema drift without losing data. Field names follow the
//! portal's own casing, which mixes PascalCase (`uiData` contents, location
//! records) with camelCase (the live-data envelope and fan block).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DeviceId, FanMode, LocationId, SystemMode};

// =============================================================================
// Live data (CheckDataSession)
// =============================================================================

/// Envelope of a `CheckDataSession` response.
///
/// # Examples
///
/// ```
/// use comfortr_lib::data::LiveData;
///
/// let json = r#"{
///     "success": true,
///     "deviceLive": true,
///     "communicationLost": false,
///     "latestData": {"uiData": {"DispTemperature": 71.0}}
/// }"#;
/// let live: LiveData = serde_json::from_str(json).unwrap();
/// assert!(live.device_live);
/// assert_eq!(live.latest_data.ui_data.disp_temperature, Some(71.0));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveData {
    /// Whether the portal reports the query itself succeeded. Bool on most
    /// firmware, a number on some; absent on others.
    #[serde(default)]
    pub success: Option<Value>,

    /// Whether the device currently has a live connection to the portal.
    #[serde(default)]
    pub device_live: bool,

    /// Whether the portal lost communication with the device.
    #[serde(default)]
    pub communication_lost: bool,

    /// The device's current state snapshot.
    pub latest_data: LatestData,

    /// Unmodeled envelope fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LiveData {
    /// Whether the envelope's `success` flag reports success.
    ///
    /// Tolerates the portal sending a bool, a number, or nothing at all;
    /// absent counts as failure.
    #[must_use]
    pub fn reported_success(&self) -> bool {
        match &self.success {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(num)) => num.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}

/// The `latestData` block of a live-data response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestData {
    /// Thermostat display state: temperatures, setpoints, holds, switches.
    #[serde(default)]
    pub ui_data: UiData,

    /// Fan state and allowed fan modes; absent on fanless installs.
    #[serde(default)]
    pub fan_data: Option<FanData>,

    /// Demand-response block, passed through unmodeled.
    #[serde(default)]
    pub dr_data: Option<Value>,

    /// Whether the install has a fan at all.
    #[serde(default)]
    pub has_fan: bool,

    /// Whether the install can control humidification.
    #[serde(default)]
    pub can_control_humidification: bool,

    /// Unmodeled block fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `uiData` block: everything the thermostat's display knows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UiData {
    /// Currently displayed indoor temperature.
    #[serde(default)]
    pub disp_temperature: Option<f64>,

    /// Display unit, `"F"` or `"C"`.
    #[serde(default)]
    pub display_units: Option<String>,

    /// Active heat setpoint.
    #[serde(default)]
    pub heat_setpoint: Option<f64>,

    /// Active cool setpoint.
    #[serde(default)]
    pub cool_setpoint: Option<f64>,

    /// Heat setpoint the schedule would currently dictate.
    #[serde(default)]
    pub schedule_heat_sp: Option<f64>,

    /// Cool setpoint the schedule would currently dictate.
    #[serde(default)]
    pub schedule_cool_sp: Option<f64>,

    /// Lowest accepted heat setpoint.
    #[serde(default)]
    pub heat_lower_setpt_limit: Option<f64>,

    /// Highest accepted heat setpoint.
    #[serde(default)]
    pub heat_upper_setpt_limit: Option<f64>,

    /// Lowest accepted cool setpoint.
    #[serde(default)]
    pub cool_lower_setpt_limit: Option<f64>,

    /// Highest accepted cool setpoint.
    #[serde(default)]
    pub cool_upper_setpt_limit: Option<f64>,

    /// Minimum gap the device enforces between heat and cool setpoints.
    /// Zero when the device runs a single mode.
    #[serde(default)]
    pub deadband: f64,

    /// Hold status of the heat side (0 schedule, 1 temporary, 2 permanent).
    #[serde(default)]
    pub status_heat: Option<u8>,

    /// Hold status of the cool side.
    #[serde(default)]
    pub status_cool: Option<u8>,

    /// Temporary-hold deadline of the heat side, in quarter hours.
    #[serde(default)]
    pub heat_next_period: Option<u16>,

    /// Temporary-hold deadline of the cool side, in quarter hours.
    #[serde(default)]
    pub cool_next_period: Option<u16>,

    /// Current system switch position (see [`SystemMode`]).
    #[serde(default)]
    pub system_switch_position: Option<u8>,

    /// Whether automatic changeover may be selected.
    #[serde(default)]
    pub switch_auto_allowed: bool,

    /// Whether cooling may be selected.
    #[serde(default)]
    pub switch_cool_allowed: bool,

    /// Whether heating may be selected.
    #[serde(default)]
    pub switch_heat_allowed: bool,

    /// Whether off may be selected.
    #[serde(default)]
    pub switch_off_allowed: bool,

    /// Whether emergency heat may be selected.
    #[serde(default)]
    pub switch_emergency_heat_allowed: bool,

    /// Indoor relative humidity reading.
    #[serde(default)]
    pub indoor_humidity: Option<f64>,

    /// Whether an indoor humidity sensor is installed.
    #[serde(default)]
    pub indoor_humidity_sensor_available: bool,

    /// Whether the indoor humidity sensor is working.
    #[serde(default)]
    pub indoor_humidity_sensor_not_fault: bool,

    /// Outdoor temperature reading.
    #[serde(default)]
    pub outdoor_temperature: Option<f64>,

    /// Whether an outdoor temperature sensor is installed.
    #[serde(default)]
    pub outdoor_temperature_available: bool,

    /// Outdoor relative humidity reading.
    #[serde(default)]
    pub outdoor_humidity: Option<f64>,

    /// Whether an outdoor humidity sensor is installed.
    #[serde(default)]
    pub outdoor_humidity_available: bool,

    /// Raw equipment output status (0/absent idle, 1 heating, 2 cooling).
    #[serde(default)]
    pub equipment_output_status: Option<i64>,

    /// Unmodeled display fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UiData {
    /// Whether the device allows switching to the given system mode.
    #[must_use]
    pub const fn allows_system_mode(&self, mode: SystemMode) -> bool {
        match mode {
            SystemMode::EmergencyHeat => self.switch_emergency_heat_allowed,
            SystemMode::Heat => self.switch_heat_allowed,
            SystemMode::Off => self.switch_off_allowed,
            SystemMode::Cool => self.switch_cool_allowed,
            SystemMode::Auto => self.switch_auto_allowed,
        }
    }
}

/// The `fanData` block: fan state and permitted fan modes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanData {
    /// Current fan mode index (see [`FanMode`]).
    #[serde(default)]
    pub fan_mode: Option<u8>,

    /// Whether auto may be selected.
    #[serde(default)]
    pub fan_mode_auto_allowed: bool,

    /// Whether continuous on may be selected.
    #[serde(default)]
    pub fan_mode_on_allowed: bool,

    /// Whether circulate may be selected.
    #[serde(default)]
    pub fan_mode_circulate_allowed: bool,

    /// Whether follow-schedule may be selected.
    #[serde(default)]
    pub fan_mode_follow_schedule_allowed: bool,

    /// Whether the fan is running right now.
    #[serde(default)]
    pub fan_is_running: bool,

    /// Unmodeled fan fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FanData {
    /// Whether the device allows switching to the given fan mode.
    #[must_use]
    pub const fn allows(&self, mode: FanMode) -> bool {
        match mode {
            FanMode::Auto => self.fan_mode_auto_allowed,
            FanMode::On => self.fan_mode_on_allowed,
            FanMode::Circulate => self.fan_mode_circulate_allowed,
            FanMode::FollowSchedule => self.fan_mode_follow_schedule_allowed,
        }
    }
}

// =============================================================================
// Discovery records (GetLocationListData)
// =============================================================================

/// One location entry from the location list.
///
/// `LocationID` and `Devices` must be present; a record missing either is
/// rejected by deserialization and skipped by discovery.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationRecord {
    /// Portal-assigned location id.
    #[serde(rename = "LocationID")]
    pub location_id: LocationId,

    /// Human-readable location name.
    #[serde(default)]
    pub name: Option<String>,

    /// Devices installed at this location.
    pub devices: Vec<DeviceRecord>,

    /// Unmodeled record fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One device entry inside a location record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecord {
    /// Portal-assigned device id.
    #[serde(rename = "DeviceID")]
    pub device_id: DeviceId,

    /// Device MAC address.
    #[serde(rename = "MacID", default)]
    pub mac_id: Option<String>,

    /// Human-readable device name.
    #[serde(default)]
    pub name: Option<String>,

    /// Unmodeled record fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Extended data (Menu/GetData)
// =============================================================================

/// The extended menu block, carrying humidification equipment when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuData {
    /// Humidifier sub-state, when the install has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidifier: Option<HumidifierData>,

    /// Dehumidifier sub-state, when the install has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dehumidifier: Option<HumidifierData>,

    /// Unmodeled menu fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuData {
    /// Whether this block carries a humidifier.
    #[must_use]
    pub const fn has_humidifier(&self) -> bool {
        self.humidifier.is_some()
    }

    /// Whether this block carries a dehumidifier.
    #[must_use]
    pub const fn has_dehumidifier(&self) -> bool {
        self.dehumidifier.is_some()
    }
}

/// Humidifier or dehumidifier sub-state.
///
/// Commands send this struct back whole, extras included, with the changed
/// field updated; the portal expects the full sub-object every time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HumidifierData {
    /// Operating mode: 0 off, 1 auto.
    #[serde(default)]
    pub mode: u8,

    /// Target relative humidity, a multiple of five.
    #[serde(default)]
    pub setpoint: u8,

    /// Lowest accepted setpoint.
    #[serde(default)]
    pub lower_limit: u8,

    /// Highest accepted setpoint.
    #[serde(default)]
    pub upper_limit: u8,

    /// Unmodeled equipment fields, round-tripped on submit.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_live_data() -> Value {
        json!({
            "success": true,
            "deviceLive": true,
            "communicationLost": false,
            "latestData": {
                "uiData": {
                    "DispTemperature": 71.0,
                    "DisplayUnits": "F",
                    "HeatSetpoint": 68.0,
                    "CoolSetpoint": 75.0,
                    "HeatLowerSetptLimit": 40.0,
                    "HeatUpperSetptLimit": 90.0,
                    "CoolLowerSetptLimit": 50.0,
                    "CoolUpperSetptLimit": 99.0,
                    "ScheduleHeatSp": 68.0,
                    "ScheduleCoolSp": 75.0,
                    "Deadband": 3.0,
                    "StatusHeat": 0,
                    "StatusCool": 0,
                    "HeatNextPeriod": 34,
                    "CoolNextPeriod": 34,
                    "SystemSwitchPosition": 1,
                    "SwitchHeatAllowed": true,
                    "SwitchCoolAllowed": true,
                    "SwitchOffAllowed": true,
                    "SwitchAutoAllowed": false,
                    "SwitchEmergencyHeatAllowed": false,
                    "IndoorHumidity": 41.0,
                    "IndoorHumiditySensorAvailable": true,
                    "IndoorHumiditySensorNotFault": true,
                    "OutdoorTemperature": 85.0,
                    "OutdoorTemperatureAvailable": true,
                    "OutdoorHumidity": 55.0,
                    "OutdoorHumidityAvailable": true,
                    "EquipmentOutputStatus": 0,
                    "VacationHold": 0
                },
                "fanData": {
                    "fanMode": 0,
                    "fanModeAutoAllowed": true,
                    "fanModeOnAllowed": true,
                    "fanModeCirculateAllowed": true,
                    "fanModeFollowScheduleAllowed": false,
                    "fanIsRunning": false
                },
                "hasFan": true,
                "canControlHumidification": false,
                "drData": {"CoolSetpLimit": null}
            }
        })
    }

    #[test]
    fn live_data_parses_named_fields() {
        let live: LiveData = serde_json::from_value(sample_live_data()).unwrap();
        assert!(live.reported_success());
        assert!(live.device_live);
        assert!(!live.communication_lost);

        let ui = &live.latest_data.ui_data;
        assert_eq!(ui.heat_setpoint, Some(68.0));
        assert_eq!(ui.cool_setpoint, Some(75.0));
        assert_eq!(ui.deadband, 3.0);
        assert_eq!(ui.system_switch_position, Some(1));
        assert!(live.latest_data.has_fan);
        assert!(live.latest_data.dr_data.is_some());
    }

    #[test]
    fn unknown_fields_land_in_extra() {
        let live: LiveData = serde_json::from_value(sample_live_data()).unwrap();
        let ui = &live.latest_data.ui_data;
        assert_eq!(ui.extra.get("VacationHold"), Some(&json!(0)));
    }

    #[test]
    fn success_flag_tolerates_numbers_and_absence() {
        let live: LiveData =
            serde_json::from_value(json!({"success": 1, "latestData": {"uiData": {}}})).unwrap();
        assert!(live.reported_success());

        let live: LiveData =
            serde_json::from_value(json!({"latestData": {"uiData": {}}})).unwrap();
        assert!(!live.reported_success());
    }

    #[test]
    fn missing_latest_data_is_an_error() {
        let result: Result<LiveData, _> = serde_json::from_value(json!({"success": true}));
        assert!(result.is_err());
    }

    #[test]
    fn system_mode_permission_lookup() {
        let live: LiveData = serde_json::from_value(sample_live_data()).unwrap();
        let ui = &live.latest_data.ui_data;
        assert!(ui.allows_system_mode(SystemMode::Heat));
        assert!(ui.allows_system_mode(SystemMode::Off));
        assert!(!ui.allows_system_mode(SystemMode::Auto));
        assert!(!ui.allows_system_mode(SystemMode::EmergencyHeat));
    }

    #[test]
    fn fan_mode_permission_lookup() {
        let live: LiveData = serde_json::from_value(sample_live_data()).unwrap();
        let fan = live.latest_data.fan_data.as_ref().unwrap();
        assert!(fan.allows(FanMode::Auto));
        assert!(fan.allows(FanMode::Circulate));
        assert!(!fan.allows(FanMode::FollowSchedule));
    }

    #[test]
    fn location_record_accepts_numeric_ids() {
        let record: LocationRecord = serde_json::from_value(json!({
            "LocationID": 123456,
            "Name": "Home",
            "Devices": [{"DeviceID": 789, "MacID": "00A1B2C3D4E5", "Name": "Hallway"}]
        }))
        .unwrap();
        assert_eq!(record.location_id.as_str(), "123456");
        assert_eq!(record.devices[0].device_id.as_str(), "789");
        assert_eq!(record.devices[0].mac_id.as_deref(), Some("00A1B2C3D4E5"));
    }

    #[test]
    fn location_record_requires_id_and_devices() {
        let missing_id: Result<LocationRecord, _> =
            serde_json::from_value(json!({"Name": "Home", "Devices": []}));
        assert!(missing_id.is_err());

        let missing_devices: Result<LocationRecord, _> =
            serde_json::from_value(json!({"LocationID": 1, "Name": "Home"}));
        assert!(missing_devices.is_err());
    }

    #[test]
    fn device_record_requires_device_id() {
        let result: Result<DeviceRecord, _> =
            serde_json::from_value(json!({"Name": "Hallway"}));
        assert!(result.is_err());
    }

    #[test]
    fn menu_data_reports_equipment() {
        let menu: MenuData = serde_json::from_value(json!({
            "humidifier": {"Mode": 1, "Setpoint": 35, "LowerLimit": 10, "UpperLimit": 60}
        }))
        .unwrap();
        assert!(menu.has_humidifier());
        assert!(!menu.has_dehumidifier());
        assert_eq!(menu.humidifier.as_ref().unwrap().setpoint, 35);
    }

    #[test]
    fn humidifier_submit_keeps_unknown_fields() {
        let hum: HumidifierData = serde_json::from_value(json!({
            "Mode": 1,
            "Setpoint": 35,
            "LowerLimit": 10,
            "UpperLimit": 60,
            "CanControlHumidification": true
        }))
        .unwrap();
        let out = serde_json::to_value(&hum).unwrap();
        assert_eq!(out.get("Setpoint"), Some(&json!(35)));
        assert_eq!(out.get("CanControlHumidification"), Some(&json!(true)));
    }
}
