// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locations group the devices installed at one site.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::LocationRecord;
use crate::device::Device;
use crate::error::Result;
use crate::session::PortalSession;
use crate::types::{DeviceId, LocationId};

/// One portal location and its devices.
///
/// Cloning is cheap: devices are shared handles, and a clone sees the
/// same live device state.
#[derive(Debug, Clone)]
pub struct Location {
    id: LocationId,
    name: Option<String>,
    devices: HashMap<DeviceId, Arc<Device>>,
}

impl Location {
    /// Builds a location from a discovery record, constructing and
    /// refreshing every device in it.
    pub(crate) async fn from_record(
        session: &Arc<PortalSession>,
        record: &LocationRecord,
    ) -> Result<Self> {
        let mut devices = HashMap::with_capacity(record.devices.len());
        for device_record in &record.devices {
            let device = Device::from_record(Arc::clone(session), device_record).await?;
            devices.insert(device_record.device_id.clone(), Arc::new(device));
        }
        tracing::debug!(
            location_id = %record.location_id,
            devices = devices.len(),
            "location ready"
        );
        Ok(Self {
            id: record.location_id.clone(),
            name: record.name.clone(),
            devices,
        })
    }

    /// Portal-assigned location id.
    #[must_use]
    pub fn id(&self) -> &LocationId {
        &self.id
    }

    /// Location name, when the portal reported one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Devices at this location, keyed by id.
    #[must_use]
    pub fn devices_by_id(&self) -> &HashMap<DeviceId, Arc<Device>> {
        &self.devices
    }

    /// Devices at this location, keyed by name.
    ///
    /// Built on the fly; with duplicate names one device wins.
    #[must_use]
    pub fn devices_by_name(&self) -> HashMap<&str, Arc<Device>> {
        self.devices
            .values()
            .map(|device| (device.name(), Arc::clone(device)))
            .collect()
    }

    /// Looks up a device by id.
    #[must_use]
    pub fn device(&self, device_id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get(device_id).cloned()
    }
}
