// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ComfortR` Lib - A Rust library to control Honeywell Total Connect
//! Comfort thermostats.
//!
//! This library talks to the vendor's cloud portal through the same
//! endpoints the web UI uses: it authenticates, discovers the account's
//! locations and thermostats, and reads and writes setpoints, holds, fan
//! and system modes, and humidification targets.
//!
//! # Supported Features
//!
//! - **Session handling**: login with confirmation, malformed-cookie
//!   repair, rate-limit backoff after repeated auth failures
//! - **Discovery**: every location and thermostat on the account
//! - **Climate control**: heat/cool setpoints with deadband handling,
//!   temporary and permanent holds with quarter-hour deadlines
//! - **Equipment control**: fan modes, system modes, humidifier and
//!   dehumidifier targets
//! - **Readings**: temperatures, humidity (only from healthy sensors),
//!   outdoor conditions, equipment activity
//!
//! # Quick Start
//!
//! ```no_run
//! use comfortr_lib::ComfortClient;
//!
//! #[tokio::main]
//! async fn main() -> comfortr_lib::Result<()> {
//!     let client = ComfortClient::builder("user@example.com", "hunter2").build()?;
//!     client.login().await?;
//!     client.discover().await?;
//!
//!     let device = client
//!         .default_device()
//!         .ok_or_else(|| comfortr_lib::Error::Api("no devices on this account".to_string()))?;
//!
//!     println!(
//!         "{} reads {:?}, system mode {}",
//!         device.name(),
//!         device.current_temperature(),
//!         device.system_mode()?,
//!     );
//!
//!     device.set_setpoint_heat(68.0).await?;
//!
//!     client.logoff().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Holds
//!
//! A temporary hold keeps a setpoint until a quarter-hour deadline, then
//! the schedule resumes; a permanent hold keeps it until released.
//!
//! ```no_run
//! use chrono::NaiveTime;
//! use comfortr_lib::{ComfortClient, Hold};
//!
//! # async fn example(client: &ComfortClient) -> comfortr_lib::Result<()> {
//! let device = client.default_device().expect("discovered device");
//!
//! // Hold 66 degrees until 17:45.
//! let deadline = NaiveTime::from_hms_opt(17, 45, 0).expect("valid time");
//! device.set_hold_heat(Hold::Temporary(deadline), Some(66.0)).await?;
//!
//! // Release the hold early.
//! device.set_hold_heat(Hold::Schedule, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Rate limiting
//!
//! The portal locks accounts that fail authentication repeatedly. After
//! three consecutive failures the client refuses further attempts locally
//! with [`Error::RateLimited`] until the wait has passed; check
//! [`ComfortClient::next_login`] before retrying.

mod client;
pub mod command;
pub mod data;
mod device;
pub mod error;
mod location;
pub mod session;
pub mod types;

pub use client::{ComfortClient, ComfortClientBuilder};
pub use command::{ControlScreenChanges, HumidityEquipment};
pub use data::{FanData, HumidifierData, UiData};
pub use device::Device;
pub use error::{Error, Result, ValidationError};
pub use location::Location;
pub use session::{PortalSession, SessionBuilder};
pub use types::{
    DeviceId, EquipmentStatus, FanMode, Hold, LocationId, SystemMode, TemperatureUnit,
};
