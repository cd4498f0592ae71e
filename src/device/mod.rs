// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level thermostat abstraction.
//!
//! A [`Device`] pairs a portal session with a cached state snapshot. Getters
//! read the cache; commands validate against the cache, submit to the
//! portal, and fold the accepted values back in, so readings stay coherent
//! between polls without an extra round trip after every write.
//!
//! Call [`Device::refresh`] to re-poll the portal; the cache is only as
//! fresh as the last refresh, and [`Device::last_refresh`] tells you when
//! that was.
//!
//! ```no_run
//! use comfortr_lib::ComfortClient;
//!
//! # async fn example() -> comfortr_lib::Result<()> {
//! let client = ComfortClient::builder("user@example.com", "hunter2").build()?;
//! client.login().await?;
//! client.discover().await?;
//!
//! if let Some(device) = client.default_device() {
//!     device.refresh().await?;
//!     if let Some(temperature) = device.current_temperature() {
//!         println!("{} reads {temperature}", device.name());
//!     }
//!     device.set_setpoint_heat(68.0).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod humidity;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use crate::command::ControlScreenChanges;
use crate::data::{DeviceRecord, FanData, HumidifierData, LatestData, MenuData, UiData};
use crate::error::{Error, Result, ValidationError};
use crate::session::PortalSession;
use crate::types::{
    DeviceId, EquipmentStatus, FanMode, Hold, SystemMode, TemperatureUnit,
    deadline_from_quarter_hours,
};

/// Cached portal state from the most recent refresh.
#[derive(Debug, Clone)]
struct DeviceState {
    alive: bool,
    communication_lost: bool,
    latest: LatestData,
    extended: Option<MenuData>,
    last_refresh: DateTime<Utc>,
}

/// One thermostat known to the portal.
///
/// Handles are created by discovery and shared behind [`Arc`]; all methods
/// take `&self`. The cached state sits behind its own lock, which is never
/// held across a portal request.
#[derive(Debug)]
pub struct Device {
    session: Arc<PortalSession>,
    device_id: DeviceId,
    mac_id: Option<String>,
    name: String,
    state: RwLock<DeviceState>,
}

impl Device {
    /// Builds a handle from a discovery record and performs its first
    /// refresh, so a handle never exposes empty state.
    pub(crate) async fn from_record(
        session: Arc<PortalSession>,
        record: &DeviceRecord,
    ) -> Result<Self> {
        let live = session.get_thermostat_data(&record.device_id).await?;
        if !live.reported_success() {
            tracing::error!(device_id = %record.device_id, "live data reported failure, applying anyway");
        }
        let extended = session.get_menu_data(&record.device_id).await?;

        let name = record
            .name
            .clone()
            .unwrap_or_else(|| record.device_id.to_string());
        Ok(Self {
            session,
            device_id: record.device_id.clone(),
            mac_id: record.mac_id.clone(),
            name,
            state: RwLock::new(DeviceState {
                alive: live.device_live,
                communication_lost: live.communication_lost,
                latest: live.latest_data,
                extended: Some(extended),
                last_refresh: Utc::now(),
            }),
        })
    }

    /// Re-polls the portal and replaces the cached state.
    ///
    /// The extended menu block is re-fetched only while humidification
    /// equipment is present; for plain installs it never changes.
    ///
    /// # Errors
    ///
    /// Propagates session failures. A payload whose own success flag is
    /// false is logged and applied anyway.
    pub async fn refresh(&self) -> Result<()> {
        let live = self.session.get_thermostat_data(&self.device_id).await?;
        if !live.reported_success() {
            tracing::error!(device_id = %self.device_id, "live data reported failure, applying anyway");
        }

        let need_menu = {
            let state = self.state.read();
            match &state.extended {
                None => true,
                Some(menu) => menu.has_humidifier() || menu.has_dehumidifier(),
            }
        };
        let extended = if need_menu {
            Some(self.session.get_menu_data(&self.device_id).await?)
        } else {
            None
        };

        let mut state = self.state.write();
        state.alive = live.device_live;
        state.communication_lost = live.communication_lost;
        state.latest = live.latest_data;
        if let Some(menu) = extended {
            state.extended = Some(menu);
        }
        state.last_refresh = Utc::now();
        tracing::debug!(device_id = %self.device_id, "device state refreshed");
        Ok(())
    }

    // ========== Identity ==========

    /// Portal-assigned device id.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Device MAC address, when the portal reported one.
    #[must_use]
    pub fn mac_id(&self) -> Option<&str> {
        self.mac_id.as_deref()
    }

    /// Device name; falls back to the id when the portal has no name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the cached state was last fetched.
    #[must_use]
    pub fn last_refresh(&self) -> DateTime<Utc> {
        self.state.read().last_refresh
    }

    /// Whether the device is live on the portal and communicating.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        let state = self.state.read();
        state.alive && !state.communication_lost
    }

    // ========== Readings ==========

    /// Currently displayed indoor temperature.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.state.read().latest.ui_data.disp_temperature
    }

    /// Indoor relative humidity.
    ///
    /// `None` unless a humidity sensor is installed and healthy; devices
    /// without one report a bogus reading that must not be surfaced.
    #[must_use]
    pub fn current_humidity(&self) -> Option<f64> {
        let state = self.state.read();
        let ui = &state.latest.ui_data;
        if ui.indoor_humidity_sensor_available && ui.indoor_humidity_sensor_not_fault {
            ui.indoor_humidity
        } else {
            None
        }
    }

    /// Outdoor temperature, when an outdoor sensor is installed.
    #[must_use]
    pub fn outdoor_temperature(&self) -> Option<f64> {
        let state = self.state.read();
        let ui = &state.latest.ui_data;
        if ui.outdoor_temperature_available {
            ui.outdoor_temperature
        } else {
            None
        }
    }

    /// Outdoor relative humidity, when an outdoor sensor is installed.
    #[must_use]
    pub fn outdoor_humidity(&self) -> Option<f64> {
        let state = self.state.read();
        let ui = &state.latest.ui_data;
        if ui.outdoor_humidity_available {
            ui.outdoor_humidity
        } else {
            None
        }
    }

    /// Unit the device displays temperatures in.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal omitted the unit or sent an unknown
    /// one.
    pub fn temperature_unit(&self) -> Result<TemperatureUnit> {
        let state = self.state.read();
        let Some(unit) = state.latest.ui_data.display_units.as_deref() else {
            return Err(Error::Api(format!(
                "device {} reported no display units",
                self.device_id
            )));
        };
        unit.parse().map_err(|_| {
            Error::Api(format!(
                "device {} reported unknown display unit {unit:?}",
                self.device_id
            ))
        })
    }

    /// Whether the fan is running right now.
    #[must_use]
    pub fn fan_running(&self) -> bool {
        let state = self.state.read();
        state.latest.has_fan
            && state
                .latest
                .fan_data
                .as_ref()
                .is_some_and(|fan| fan.fan_is_running)
    }

    /// What the HVAC equipment is doing right now.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal reports a status this library does
    /// not know.
    pub fn equipment_output_status(&self) -> Result<EquipmentStatus> {
        let state = self.state.read();
        let raw = state.latest.ui_data.equipment_output_status;
        let fan_running = state.latest.has_fan
            && state
                .latest
                .fan_data
                .as_ref()
                .is_some_and(|fan| fan.fan_is_running);
        EquipmentStatus::from_raw(raw, fan_running).ok_or_else(|| {
            Error::Api(format!(
                "device {} reported unknown equipment status {raw:?}",
                self.device_id
            ))
        })
    }

    // ========== Setpoints and modes ==========

    /// Active heat setpoint.
    #[must_use]
    pub fn setpoint_heat(&self) -> Option<f64> {
        self.state.read().latest.ui_data.heat_setpoint
    }

    /// Active cool setpoint.
    #[must_use]
    pub fn setpoint_cool(&self) -> Option<f64> {
        self.state.read().latest.ui_data.cool_setpoint
    }

    /// Current system mode.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal omitted the switch position or sent
    /// an unknown one.
    pub fn system_mode(&self) -> Result<SystemMode> {
        let position = self.state.read().latest.ui_data.system_switch_position;
        let Some(position) = position else {
            return Err(Error::Api(format!(
                "device {} reported no system switch position",
                self.device_id
            )));
        };
        SystemMode::from_position(position).ok_or_else(|| {
            Error::Api(format!(
                "device {} reported unknown system switch position {position}",
                self.device_id
            ))
        })
    }

    /// Current fan mode.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the device has no fan block or reports an
    /// unknown mode.
    pub fn fan_mode(&self) -> Result<FanMode> {
        let index = {
            let state = self.state.read();
            state.latest.fan_data.as_ref().and_then(|fan| fan.fan_mode)
        };
        let Some(index) = index else {
            return Err(Error::Api(format!(
                "device {} reported no fan mode",
                self.device_id
            )));
        };
        FanMode::from_index(index).ok_or_else(|| {
            Error::Api(format!(
                "device {} reported unknown fan mode {index}",
                self.device_id
            ))
        })
    }

    /// Current hold on the heat setpoint.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal's hold fields cannot be decoded.
    pub fn hold_heat(&self) -> Result<Hold> {
        let (status, period) = {
            let state = self.state.read();
            let ui = &state.latest.ui_data;
            (ui.status_heat, ui.heat_next_period)
        };
        self.decode_hold("heat", status, period)
    }

    /// Current hold on the cool setpoint.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal's hold fields cannot be decoded.
    pub fn hold_cool(&self) -> Result<Hold> {
        let (status, period) = {
            let state = self.state.read();
            let ui = &state.latest.ui_data;
            (ui.status_cool, ui.cool_next_period)
        };
        self.decode_hold("cool", status, period)
    }

    fn decode_hold(&self, side: &str, status: Option<u8>, period: Option<u16>) -> Result<Hold> {
        match status {
            Some(0) => Ok(Hold::Schedule),
            Some(1) => {
                let Some(quarters) = period else {
                    return Err(Error::Api(format!(
                        "device {} reported a temporary {side} hold without a deadline",
                        self.device_id
                    )));
                };
                let Some(deadline) = deadline_from_quarter_hours(quarters) else {
                    return Err(Error::Api(format!(
                        "device {} reported {side} hold deadline {quarters} out of range",
                        self.device_id
                    )));
                };
                Ok(Hold::Temporary(deadline))
            }
            Some(2) => Ok(Hold::Permanent),
            other => Err(Error::Api(format!(
                "device {} reported unknown {side} hold status {other:?}",
                self.device_id
            ))),
        }
    }

    // ========== Commands ==========

    /// Sets the heat setpoint.
    ///
    /// When the device enforces a deadband and the cool setpoint sits too
    /// close, the cool setpoint is pushed up in the same submission; the
    /// portal rejects the request otherwise. Changing a setpoint while both
    /// sides follow the schedule puts the device into a temporary hold,
    /// mirroring a setpoint change at the thermostat itself.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SetpointOutOfRange`] before any portal call when
    /// the temperature is outside the device's heat limits.
    pub async fn set_setpoint_heat(&self, temperature: f64) -> Result<()> {
        let changes = {
            let state = self.state.read();
            self.plan_heat_setpoint(&state.latest.ui_data, temperature)?
        };
        self.submit(changes).await
    }

    /// Sets the cool setpoint.
    ///
    /// The counterpart of [`set_setpoint_heat`](Self::set_setpoint_heat):
    /// a heat setpoint within the deadband is pushed down.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SetpointOutOfRange`] before any portal call when
    /// the temperature is outside the device's cool limits.
    pub async fn set_setpoint_cool(&self, temperature: f64) -> Result<()> {
        let changes = {
            let state = self.state.read();
            self.plan_cool_setpoint(&state.latest.ui_data, temperature)?
        };
        self.submit(changes).await
    }

    /// Places, changes, or releases the hold on the heat setpoint.
    ///
    /// The portal applies hold status to both sides of the schedule in one
    /// submission; `temperature`, when given, changes the heat setpoint
    /// under that hold.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MisalignedDeadline`] for a temporary hold whose
    /// deadline is not on a quarter hour;
    /// [`ValidationError::SetpointOutOfRange`] when the temperature is
    /// outside the device's heat limits.
    pub async fn set_hold_heat(&self, hold: Hold, temperature: Option<f64>) -> Result<()> {
        let changes = {
            let state = self.state.read();
            let ui = &state.latest.ui_data;
            let mut changes = ControlScreenChanges::new(self.device_id.clone()).with_hold(hold)?;
            if let Some(temperature) = temperature {
                let (lower, upper) =
                    self.setpoint_limits(ui.heat_lower_setpt_limit, ui.heat_upper_setpt_limit, "heat")?;
                check_setpoint_range(temperature, lower, upper)?;
                changes = changes.with_heat_setpoint(temperature);
            }
            changes
        };
        self.submit(changes).await
    }

    /// Places, changes, or releases the hold on the cool setpoint.
    ///
    /// # Errors
    ///
    /// As [`set_hold_heat`](Self::set_hold_heat), but the temperature is
    /// checked against the cool limits.
    pub async fn set_hold_cool(&self, hold: Hold, temperature: Option<f64>) -> Result<()> {
        let changes = {
            let state = self.state.read();
            let ui = &state.latest.ui_data;
            let mut changes = ControlScreenChanges::new(self.device_id.clone()).with_hold(hold)?;
            if let Some(temperature) = temperature {
                let (lower, upper) =
                    self.setpoint_limits(ui.cool_lower_setpt_limit, ui.cool_upper_setpt_limit, "cool")?;
                check_setpoint_range(temperature, lower, upper)?;
                changes = changes.with_cool_setpoint(temperature);
            }
            changes
        };
        self.submit(changes).await
    }

    /// Sets the fan mode.
    ///
    /// # Errors
    ///
    /// [`ValidationError::FanModeUnsupported`] before any portal call when
    /// the device does not offer the mode.
    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<()> {
        let changes = {
            let state = self.state.read();
            self.plan_fan_mode(state.latest.fan_data.as_ref(), mode)?
        };
        self.submit(changes).await
    }

    /// Sets the system mode.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SystemModeUnsupported`] before any portal call
    /// when the device does not offer the mode.
    pub async fn set_system_mode(&self, mode: SystemMode) -> Result<()> {
        let changes = {
            let state = self.state.read();
            self.plan_system_mode(&state.latest.ui_data, mode)?
        };
        self.submit(changes).await
    }

    // ========== Raw data ==========

    /// Snapshot of the raw display block.
    #[must_use]
    pub fn raw_ui_data(&self) -> UiData {
        self.state.read().latest.ui_data.clone()
    }

    /// Snapshot of the raw fan block.
    #[must_use]
    pub fn raw_fan_data(&self) -> Option<FanData> {
        self.state.read().latest.fan_data.clone()
    }

    /// Snapshot of the raw demand-response block.
    #[must_use]
    pub fn raw_dr_data(&self) -> Option<Value> {
        self.state.read().latest.dr_data.clone()
    }

    /// Whether the install has a humidifier.
    #[must_use]
    pub fn has_humidifier(&self) -> bool {
        self.state
            .read()
            .extended
            .as_ref()
            .is_some_and(MenuData::has_humidifier)
    }

    /// Whether the install has a dehumidifier.
    #[must_use]
    pub fn has_dehumidifier(&self) -> bool {
        self.state
            .read()
            .extended
            .as_ref()
            .is_some_and(MenuData::has_dehumidifier)
    }

    /// Snapshot of the humidifier state.
    #[must_use]
    pub fn humidifier(&self) -> Option<HumidifierData> {
        self.state
            .read()
            .extended
            .as_ref()
            .and_then(|menu| menu.humidifier.clone())
    }

    /// Snapshot of the dehumidifier state.
    #[must_use]
    pub fn dehumidifier(&self) -> Option<HumidifierData> {
        self.state
            .read()
            .extended
            .as_ref()
            .and_then(|menu| menu.dehumidifier.clone())
    }

    // ========== Planning and commit ==========

    fn plan_heat_setpoint(&self, ui: &UiData, temperature: f64) -> Result<ControlScreenChanges> {
        let (lower, upper) =
            self.setpoint_limits(ui.heat_lower_setpt_limit, ui.heat_upper_setpt_limit, "heat")?;
        check_setpoint_range(temperature, lower, upper)?;

        let mut changes =
            ControlScreenChanges::new(self.device_id.clone()).with_heat_setpoint(temperature);

        if ui.deadband > 0.0 {
            let cool = ui.cool_setpoint.ok_or_else(|| {
                Error::Api(format!(
                    "device {} reported no cool setpoint",
                    self.device_id
                ))
            })?;
            if cool - ui.deadband <= temperature {
                changes = changes.with_cool_setpoint(temperature + ui.deadband);
            }
        }

        Ok(Self::promote_schedule_to_hold(ui, changes))
    }

    fn plan_cool_setpoint(&self, ui: &UiData, temperature: f64) -> Result<ControlScreenChanges> {
        let (lower, upper) =
            self.setpoint_limits(ui.cool_lower_setpt_limit, ui.cool_upper_setpt_limit, "cool")?;
        check_setpoint_range(temperature, lower, upper)?;

        let mut changes =
            ControlScreenChanges::new(self.device_id.clone()).with_cool_setpoint(temperature);

        if ui.deadband > 0.0 {
            let heat = ui.heat_setpoint.ok_or_else(|| {
                Error::Api(format!(
                    "device {} reported no heat setpoint",
                    self.device_id
                ))
            })?;
            if heat + ui.deadband >= temperature {
                changes = changes.with_heat_setpoint(temperature - ui.deadband);
            }
        }

        Ok(Self::promote_schedule_to_hold(ui, changes))
    }

    /// A setpoint change while both sides follow the schedule becomes a
    /// temporary hold. When either hold status is unreadable the change is
    /// still sent, just without touching the hold.
    fn promote_schedule_to_hold(ui: &UiData, changes: ControlScreenChanges) -> ControlScreenChanges {
        if ui.status_heat == Some(0) && ui.status_cool == Some(0) {
            changes.with_hold_promotion()
        } else {
            changes
        }
    }

    fn plan_fan_mode(&self, fan: Option<&FanData>, mode: FanMode) -> Result<ControlScreenChanges> {
        if !fan.is_some_and(|fan| fan.allows(mode)) {
            return Err(ValidationError::FanModeUnsupported(mode.to_string()).into());
        }
        Ok(ControlScreenChanges::new(self.device_id.clone()).with_fan_mode(mode))
    }

    fn plan_system_mode(&self, ui: &UiData, mode: SystemMode) -> Result<ControlScreenChanges> {
        if !ui.allows_system_mode(mode) {
            return Err(ValidationError::SystemModeUnsupported(mode.to_string()).into());
        }
        Ok(ControlScreenChanges::new(self.device_id.clone()).with_system_mode(mode))
    }

    fn setpoint_limits(
        &self,
        lower: Option<f64>,
        upper: Option<f64>,
        side: &str,
    ) -> Result<(f64, f64)> {
        match (lower, upper) {
            (Some(lower), Some(upper)) => Ok((lower, upper)),
            _ => Err(Error::Api(format!(
                "device {} reported no {side} setpoint limits",
                self.device_id
            ))),
        }
    }

    /// Submits a planned change set and folds it into the cached state.
    async fn submit(&self, changes: ControlScreenChanges) -> Result<()> {
        self.session.submit_control_changes(&changes).await?;
        self.commit_changes(&changes);
        Ok(())
    }

    /// Applies exactly the values the portal accepted. Fields the change
    /// set left as null keep their cached values until the next refresh.
    fn commit_changes(&self, changes: &ControlScreenChanges) {
        let mut state = self.state.write();
        let ui = &mut state.latest.ui_data;
        if let Some(position) = changes.system_switch() {
            ui.system_switch_position = Some(position);
        }
        if let Some(heat) = changes.heat_setpoint() {
            ui.heat_setpoint = Some(heat);
        }
        if let Some(cool) = changes.cool_setpoint() {
            ui.cool_setpoint = Some(cool);
        }
        if let Some(status) = changes.status_heat() {
            ui.status_heat = Some(status);
        }
        if let Some(status) = changes.status_cool() {
            ui.status_cool = Some(status);
        }
        if let Some(period) = changes.heat_next_period() {
            ui.heat_next_period = Some(period);
        }
        if let Some(period) = changes.cool_next_period() {
            ui.cool_next_period = Some(period);
        }
        if let Some(mode) = changes.fan_mode()
            && let Some(fan) = state.latest.fan_data.as_mut()
        {
            fan.fan_mode = Some(mode);
        }
    }
}

fn check_setpoint_range(temperature: f64, lower: f64, upper: f64) -> Result<()> {
    if !(lower..=upper).contains(&temperature) {
        return Err(ValidationError::SetpointOutOfRange {
            lower,
            upper,
            actual: temperature,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    use crate::session::SessionBuilder;

    fn sample_ui() -> UiData {
        UiData {
            disp_temperature: Some(71.0),
            display_units: Some("F".to_string()),
            heat_setpoint: Some(68.0),
            cool_setpoint: Some(75.0),
            heat_lower_setpt_limit: Some(40.0),
            heat_upper_setpt_limit: Some(90.0),
            cool_lower_setpt_limit: Some(50.0),
            cool_upper_setpt_limit: Some(99.0),
            deadband: 3.0,
            status_heat: Some(0),
            status_cool: Some(0),
            system_switch_position: Some(1),
            switch_heat_allowed: true,
            switch_cool_allowed: true,
            switch_off_allowed: true,
            ..UiData::default()
        }
    }

    fn sample_fan() -> FanData {
        FanData {
            fan_mode: Some(0),
            fan_mode_auto_allowed: true,
            fan_mode_on_allowed: true,
            fan_mode_circulate_allowed: true,
            fan_mode_follow_schedule_allowed: false,
            fan_is_running: false,
            ..FanData::default()
        }
    }

    fn test_device(ui: UiData, fan: Option<FanData>) -> Device {
        let session = SessionBuilder::new("u", "p")
            .with_base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        Device {
            session: Arc::new(session),
            device_id: DeviceId::from("123456"),
            mac_id: Some("00A1B2C3D4E5".to_string()),
            name: "Hallway".to_string(),
            state: RwLock::new(DeviceState {
                alive: true,
                communication_lost: false,
                latest: LatestData {
                    ui_data: ui,
                    fan_data: fan,
                    has_fan: true,
                    ..LatestData::default()
                },
                extended: None,
                last_refresh: Utc::now(),
            }),
        }
    }

    #[test]
    fn heat_setpoint_pushes_cool_across_deadband() {
        let device = test_device(sample_ui(), None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 74.0).unwrap();
        assert_eq!(changes.heat_setpoint(), Some(74.0));
        assert_eq!(changes.cool_setpoint(), Some(77.0));
    }

    #[test]
    fn heat_setpoint_leaves_distant_cool_alone() {
        let device = test_device(sample_ui(), None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 70.0).unwrap();
        assert_eq!(changes.heat_setpoint(), Some(70.0));
        assert_eq!(changes.cool_setpoint(), None);
    }

    #[test]
    fn cool_setpoint_pushes_heat_across_deadband() {
        let device = test_device(sample_ui(), None);
        let changes = device.plan_cool_setpoint(&device.raw_ui_data(), 70.0).unwrap();
        assert_eq!(changes.cool_setpoint(), Some(70.0));
        assert_eq!(changes.heat_setpoint(), Some(67.0));
    }

    #[test]
    fn zero_deadband_never_touches_the_other_side() {
        let mut ui = sample_ui();
        ui.deadband = 0.0;
        ui.cool_setpoint = None;
        let device = test_device(ui, None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 74.0).unwrap();
        assert_eq!(changes.cool_setpoint(), None);
    }

    #[test]
    fn setpoint_outside_limits_is_rejected() {
        let device = test_device(sample_ui(), None);
        let err = device
            .plan_heat_setpoint(&device.raw_ui_data(), 95.0)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SetpointOutOfRange {
                lower: 40.0,
                upper: 90.0,
                actual: 95.0,
            })
        ));
    }

    #[test]
    fn missing_limits_are_an_api_error() {
        let mut ui = sample_ui();
        ui.heat_upper_setpt_limit = None;
        let device = test_device(ui, None);
        let err = device
            .plan_heat_setpoint(&device.raw_ui_data(), 70.0)
            .unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }

    #[test]
    fn schedule_setpoint_change_becomes_temporary_hold() {
        let device = test_device(sample_ui(), None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 70.0).unwrap();
        assert_eq!(changes.status_heat(), Some(1));
        assert_eq!(changes.status_cool(), Some(1));
        assert_eq!(changes.heat_next_period(), None);
    }

    #[test]
    fn held_setpoint_change_keeps_the_hold() {
        let mut ui = sample_ui();
        ui.status_heat = Some(2);
        ui.status_cool = Some(2);
        let device = test_device(ui, None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 70.0).unwrap();
        assert_eq!(changes.status_heat(), None);
        assert_eq!(changes.status_cool(), None);
    }

    #[test]
    fn unreadable_hold_status_suppresses_promotion() {
        let mut ui = sample_ui();
        ui.status_cool = None;
        let device = test_device(ui, None);
        let changes = device.plan_heat_setpoint(&device.raw_ui_data(), 70.0).unwrap();
        assert_eq!(changes.status_heat(), None);
    }

    #[test]
    fn fan_mode_must_be_offered() {
        let device = test_device(sample_ui(), Some(sample_fan()));
        assert!(device.plan_fan_mode(device.raw_fan_data().as_ref(), FanMode::Circulate).is_ok());

        let err = device
            .plan_fan_mode(device.raw_fan_data().as_ref(), FanMode::FollowSchedule)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::FanModeUnsupported(_))
        ));
    }

    #[test]
    fn fan_mode_without_fan_block_is_unsupported() {
        let device = test_device(sample_ui(), None);
        let err = device.plan_fan_mode(None, FanMode::Auto).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::FanModeUnsupported(_))
        ));
    }

    #[test]
    fn system_mode_must_be_offered() {
        let device = test_device(sample_ui(), None);
        assert!(device.plan_system_mode(&device.raw_ui_data(), SystemMode::Heat).is_ok());

        let err = device
            .plan_system_mode(&device.raw_ui_data(), SystemMode::Auto)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SystemModeUnsupported(_))
        ));
    }

    #[test]
    fn commit_applies_only_sent_fields() {
        let device = test_device(sample_ui(), Some(sample_fan()));
        let changes = ControlScreenChanges::new(DeviceId::from("123456"))
            .with_heat_setpoint(70.0)
            .with_fan_mode(FanMode::Circulate);
        device.commit_changes(&changes);

        let ui = device.raw_ui_data();
        assert_eq!(ui.heat_setpoint, Some(70.0));
        assert_eq!(ui.cool_setpoint, Some(75.0));
        assert_eq!(ui.status_heat, Some(0));
        assert_eq!(device.raw_fan_data().unwrap().fan_mode, Some(2));
    }

    #[test]
    fn decode_hold_variants() {
        let device = test_device(sample_ui(), None);
        assert_eq!(device.decode_hold("heat", Some(0), None).unwrap(), Hold::Schedule);
        assert_eq!(
            device.decode_hold("heat", Some(1), Some(71)).unwrap(),
            Hold::Temporary(NaiveTime::from_hms_opt(17, 45, 0).unwrap())
        );
        assert_eq!(device.decode_hold("cool", Some(2), None).unwrap(), Hold::Permanent);

        assert!(matches!(device.decode_hold("heat", Some(1), None), Err(Error::Api(_))));
        assert!(matches!(device.decode_hold("heat", Some(1), Some(96)), Err(Error::Api(_))));
        assert!(matches!(device.decode_hold("heat", Some(7), None), Err(Error::Api(_))));
        assert!(matches!(device.decode_hold("heat", None, None), Err(Error::Api(_))));
    }

    #[test]
    fn humidity_reading_requires_healthy_sensor() {
        let mut ui = sample_ui();
        ui.indoor_humidity = Some(41.0);
        ui.indoor_humidity_sensor_available = true;
        ui.indoor_humidity_sensor_not_fault = true;
        let device = test_device(ui, None);
        assert_eq!(device.current_humidity(), Some(41.0));

        let mut ui = sample_ui();
        ui.indoor_humidity = Some(41.0);
        ui.indoor_humidity_sensor_available = true;
        ui.indoor_humidity_sensor_not_fault = false;
        let device = test_device(ui, None);
        assert_eq!(device.current_humidity(), None);
    }

    #[test]
    fn outdoor_readings_require_sensors() {
        let mut ui = sample_ui();
        ui.outdoor_temperature = Some(85.0);
        ui.outdoor_temperature_available = false;
        ui.outdoor_humidity = Some(55.0);
        ui.outdoor_humidity_available = true;
        let device = test_device(ui, None);
        assert_eq!(device.outdoor_temperature(), None);
        assert_eq!(device.outdoor_humidity(), Some(55.0));
    }

    #[test]
    fn equipment_status_uses_fan_when_idle() {
        let mut fan = sample_fan();
        fan.fan_is_running = true;
        let device = test_device(sample_ui(), Some(fan));
        assert_eq!(device.equipment_output_status().unwrap(), EquipmentStatus::Fan);

        let mut ui = sample_ui();
        ui.equipment_output_status = Some(2);
        let device = test_device(ui, Some(sample_fan()));
        assert_eq!(device.equipment_output_status().unwrap(), EquipmentStatus::Cool);

        let mut ui = sample_ui();
        ui.equipment_output_status = Some(9);
        let device = test_device(ui, None);
        assert!(matches!(device.equipment_output_status(), Err(Error::Api(_))));
    }

    #[test]
    fn alive_requires_live_and_communicating() {
        let device = test_device(sample_ui(), None);
        assert!(device.is_alive());
        device.state.write().communication_lost = true;
        assert!(!device.is_alive());
    }

    #[test]
    fn temperature_unit_parses_or_errors() {
        let device = test_device(sample_ui(), None);
        assert_eq!(device.temperature_unit().unwrap(), TemperatureUnit::Fahrenheit);

        let mut ui = sample_ui();
        ui.display_units = Some("K".to_string());
        let device = test_device(ui, None);
        assert!(matches!(device.temperature_unit(), Err(Error::Api(_))));
    }
}
