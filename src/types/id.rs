// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opaque identifiers issued by the portal.
//!
//! Locations and devices are addressed by portal-assigned ids. They look
//! numeric today but carry no structure this library relies on, so they are
//! kept as strings. The portal itself is inconsistent about the JSON type
//! (numbers in list payloads, strings in URLs); deserialization accepts
//! both.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Raw wire form of an id: the portal sends numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Identifier of a location (a dwelling grouping one or more devices).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationId(String);

impl LocationId {
    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

/// Identifier of a single thermostat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_from_json_number() {
        let id: DeviceId = serde_json::from_str("1234567").unwrap();
        assert_eq!(id.as_str(), "1234567");
    }

    #[test]
    fn device_id_from_json_string() {
        let id: DeviceId = serde_json::from_str("\"1234567\"").unwrap();
        assert_eq!(id.as_str(), "1234567");
    }

    #[test]
    fn location_id_serializes_as_string() {
        let id = LocationId::from("987654");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"987654\"");
    }

    #[test]
    fn ids_display_their_value() {
        assert_eq!(DeviceId::from("42").to_string(), "42");
        assert_eq!(LocationId::from("7").to_string(), "7");
    }
}
