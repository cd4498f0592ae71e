// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Total Connect Comfort thermostat control.
//!
//! This module provides type-safe representations of the values the portal
//! exchanges: operating modes, hold states with their quarter-hour deadline
//! encoding, and the opaque identifiers locations and devices are addressed
//! by.
//!
//! # Types
//!
//! - [`SystemMode`] - Heat/cool/off/auto/emergency-heat switch positions
//! - [`FanMode`] - Fan auto/on/circulate/follow-schedule modes
//! - [`EquipmentStatus`] - What the equipment is currently doing
//! - [`TemperatureUnit`] - Fahrenheit or Celsius display unit
//! - [`Hold`] - Per-side setpoint hold state (schedule/temporary/permanent)
//! - [`LocationId`], [`DeviceId`] - Portal-issued identifiers

mod hold;
mod id;
mod modes;

pub use hold::{Hold, deadline_from_quarter_hours, quarter_hours};
pub use id::{DeviceId, LocationId};
pub use modes::{EquipmentStatus, FanMode, SystemMode, TemperatureUnit};
