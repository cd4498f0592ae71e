// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Humidifier and dehumidifier commands.
//!
//! The portal has no partial-update endpoint for humidification
//! equipment: every command re-submits the whole cached sub-object with
//! one field changed. Setpoints are rounded to the nearest multiple of
//! five first, because that is the only granularity the equipment
//! accepts.

use crate::command::HumidityEquipment;
use crate::data::HumidifierData;
use crate::error::{Result, ValidationError};

use super::Device;

/// Equipment mode meaning "do nothing".
const MODE_OFF: u8 = 0;
/// Equipment mode meaning "hold the setpoint".
const MODE_AUTO: u8 = 1;

impl Device {
    /// Puts the humidifier in automatic mode.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotEquipped`] when the install has no
    /// humidifier.
    pub async fn set_humidifier_auto(&self) -> Result<()> {
        self.set_humidity_mode(HumidityEquipment::Humidifier, MODE_AUTO)
            .await
    }

    /// Turns the humidifier off.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotEquipped`] when the install has no
    /// humidifier.
    pub async fn set_humidifier_off(&self) -> Result<()> {
        self.set_humidity_mode(HumidityEquipment::Humidifier, MODE_OFF)
            .await
    }

    /// Sets the humidifier's target relative humidity.
    ///
    /// The value is rounded to the nearest multiple of five before being
    /// checked against the equipment's limits.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotEquipped`] when the install has no
    /// humidifier; [`ValidationError::HumidityOutOfRange`] when the
    /// rounded value falls outside the equipment's limits.
    pub async fn set_humidifier_setpoint(&self, setpoint: u8) -> Result<()> {
        self.set_humidity_setpoint(HumidityEquipment::Humidifier, setpoint)
            .await
    }

    /// Puts the dehumidifier in automatic mode.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotEquipped`] when the install has no
    /// dehumidifier.
    pub async fn set_dehumidifier_auto(&self) -> Result<()> {
        self.set_humidity_mode(HumidityEquipment::Dehumidifier, MODE_AUTO)
            .await
    }

    /// Turns the dehumidifier off.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotEquipped`] when the install has no
    /// dehumidifier.
    pub async fn set_dehumidifier_off(&self) -> Result<()> {
        self.set_humidity_mode(HumidityEquipment::Dehumidifier, MODE_OFF)
            .await
    }

    /// Sets the dehumidifier's target relative humidity.
    ///
    /// # Errors
    ///
    /// As [`set_humidifier_setpoint`](Self::set_humidifier_setpoint), for
    /// the dehumidifier.
    pub async fn set_dehumidifier_setpoint(&self, setpoint: u8) -> Result<()> {
        self.set_humidity_setpoint(HumidityEquipment::Dehumidifier, setpoint)
            .await
    }

    async fn set_humidity_mode(&self, equipment: HumidityEquipment, mode: u8) -> Result<()> {
        let mut planned = self.humidity_equipment_state(equipment)?;
        planned.mode = mode;
        self.submit_humidity(equipment, planned).await
    }

    async fn set_humidity_setpoint(
        &self,
        equipment: HumidityEquipment,
        setpoint: u8,
    ) -> Result<()> {
        let mut planned = self.humidity_equipment_state(equipment)?;
        let rounded = round_to_five(setpoint);
        if !(planned.lower_limit..=planned.upper_limit).contains(&rounded) {
            return Err(ValidationError::HumidityOutOfRange {
                lower: planned.lower_limit,
                upper: planned.upper_limit,
                actual: rounded,
            }
            .into());
        }
        planned.setpoint = rounded;
        self.submit_humidity(equipment, planned).await
    }

    /// Clones the cached sub-object for the given equipment.
    fn humidity_equipment_state(&self, equipment: HumidityEquipment) -> Result<HumidifierData> {
        let state = self.state.read();
        let slot = state.extended.as_ref().map(|menu| match equipment {
            HumidityEquipment::Humidifier => &menu.humidifier,
            HumidityEquipment::Dehumidifier => &menu.dehumidifier,
        });
        match slot {
            Some(Some(data)) => Ok(data.clone()),
            _ => Err(ValidationError::NotEquipped(equipment.label()).into()),
        }
    }

    /// Submits a planned sub-object and folds it into the cached state.
    async fn submit_humidity(
        &self,
        equipment: HumidityEquipment,
        planned: HumidifierData,
    ) -> Result<()> {
        self.session
            .submit_menu_changes(&self.device_id, equipment, &planned)
            .await?;
        let mut state = self.state.write();
        if let Some(menu) = state.extended.as_mut() {
            match equipment {
                HumidityEquipment::Humidifier => menu.humidifier = Some(planned),
                HumidityEquipment::Dehumidifier => menu.dehumidifier = Some(planned),
            }
        }
        Ok(())
    }
}

/// Rounds to the nearest multiple of five. 255 rounds to 255, so the
/// result always fits back into a `u8`.
fn round_to_five(value: u8) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    {
        ((u16::from(value) + 2) / 5 * 5) as u8
    }
}
