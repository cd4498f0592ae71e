// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level portal client: session plus the discovered registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::data::LocationRecord;
use crate::device::Device;
use crate::error::Result;
use crate::location::Location;
use crate::session::{PortalSession, SessionBuilder};
use crate::types::{DeviceId, LocationId};

/// Configuration for a [`ComfortClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use comfortr_lib::ComfortClient;
///
/// let client = ComfortClient::builder("user@example.com", "hunter2")
///     .with_timeout(Duration::from_secs(10))
///     .build();
/// assert!(client.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ComfortClientBuilder {
    session: SessionBuilder,
}

impl ComfortClientBuilder {
    /// Creates a builder with the given portal account credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            session: SessionBuilder::new(username, password),
        }
    }

    /// Overrides the portal base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.session = self.session.with_base_url(base_url);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.session = self.session.with_timeout(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the HTTP client cannot be created.
    pub fn build(self) -> Result<ComfortClient> {
        Ok(ComfortClient {
            session: Arc::new(self.session.build()?),
            locations: RwLock::new(HashMap::new()),
        })
    }
}

/// A portal account with its discovered locations and devices.
///
/// The client owns one [`PortalSession`] and a registry of [`Location`]s
/// filled in by [`discover`](Self::discover). Device handles obtained
/// from the registry stay valid across re-discovery; they keep polling
/// through the shared session.
#[derive(Debug)]
pub struct ComfortClient {
    session: Arc<PortalSession>,
    locations: RwLock<HashMap<LocationId, Location>>,
}

impl ComfortClient {
    /// Starts building a client for the given account.
    #[must_use]
    pub fn builder(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ComfortClientBuilder {
        ComfortClientBuilder::new(username, password)
    }

    /// The underlying portal session.
    #[must_use]
    pub fn session(&self) -> &PortalSession {
        &self.session
    }

    /// Authenticates against the portal.
    ///
    /// # Errors
    ///
    /// See [`PortalSession::login`].
    pub async fn login(&self) -> Result<()> {
        self.session.login().await
    }

    /// Ends the portal session.
    ///
    /// # Errors
    ///
    /// See [`PortalSession::logoff`].
    pub async fn logoff(&self) -> Result<()> {
        self.session.logoff().await
    }

    /// Keeps an idle session alive.
    ///
    /// # Errors
    ///
    /// See [`PortalSession::keepalive`].
    pub async fn keepalive(&self) -> Result<()> {
        self.session.keepalive().await
    }

    /// Earliest instant at which the next login attempt is allowed.
    #[must_use]
    pub fn next_login(&self) -> DateTime<Utc> {
        self.session.next_login()
    }

    /// Fetches the account's locations and builds device handles for
    /// every record, refreshing each device once.
    ///
    /// A record the portal mangles beyond recognition is logged and
    /// skipped; the rest of the account still loads. The registry is only
    /// replaced when the whole pass succeeds, so a failed re-discovery
    /// leaves the previous registry usable.
    ///
    /// # Errors
    ///
    /// Propagates session failures from the location list and from the
    /// first refresh of each device.
    pub async fn discover(&self) -> Result<()> {
        let entries = self.session.get_location_list().await?;

        let mut discovered = HashMap::new();
        for entry in entries {
            let fallback_id = entry.get("LocationID").map(ToString::to_string);
            match serde_json::from_value::<LocationRecord>(entry) {
                Ok(record) => {
                    let location = Location::from_record(&self.session, &record).await?;
                    discovered.insert(record.location_id.clone(), location);
                }
                Err(err) => {
                    tracing::warn!(
                        location_id = fallback_id.as_deref().unwrap_or("unknown"),
                        error = %err,
                        "skipping undecodable location record"
                    );
                }
            }
        }

        tracing::debug!(locations = discovered.len(), "discovery complete");
        *self.locations.write() = discovered;
        Ok(())
    }

    /// Snapshot of the discovered locations, keyed by id.
    ///
    /// Empty until [`discover`](Self::discover) has run.
    #[must_use]
    pub fn locations_by_id(&self) -> HashMap<LocationId, Location> {
        self.locations.read().clone()
    }

    /// A device for the common single-thermostat account: the first
    /// device (by id) of the first location (by id).
    #[must_use]
    pub fn default_device(&self) -> Option<Arc<Device>> {
        let locations = self.locations.read();
        let location = locations
            .iter()
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, location)| location)?;
        location
            .devices_by_id()
            .iter()
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, device)| Arc::clone(device))
    }

    /// Looks up a device anywhere in the registry.
    #[must_use]
    pub fn get_device(&self, device_id: &DeviceId) -> Option<Arc<Device>> {
        let locations = self.locations.read();
        locations
            .values()
            .find_map(|location| location.device(device_id))
    }
}
