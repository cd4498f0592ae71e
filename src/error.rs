// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ComfortR` library.
//!
//! This module provides the error hierarchy for failures across the library:
//! local input validation, transport problems, authentication and rate
//! limiting, and semantic rejections by the portal API.

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;

/// The main error type for this library.
///
/// Every failure a caller can observe falls into one of these classes.
/// Validation errors are raised locally before any request is sent; all
/// other variants describe something the portal or the transport did.
#[derive(Debug, Error)]
pub enum Error {
    /// A locally detected invalid input. Never touches the network.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Transport-level failure: timeout, refused connection, TLS trouble.
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The portal is down or bounced the request through a redirect.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Login was rejected or the portal handed back a null session cookie.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Too many consecutive login failures; retry after the given instant.
    #[error("login rate limited until {until}")]
    RateLimited {
        /// Earliest instant at which another login attempt is allowed.
        until: DateTime<Utc>,
    },

    /// An authenticated call came back 401/403; the session key expired.
    #[error("unauthorized: HTTP {status}")]
    Unauthorized {
        /// The HTTP status the portal returned.
        status: u16,
    },

    /// Any other unexpected status or an undecodable body.
    #[error("unexpected response: HTTP {status} from {path}")]
    UnexpectedResponse {
        /// The HTTP status the portal returned.
        status: u16,
        /// Request path with the portal base URL stripped.
        path: String,
    },

    /// The portal accepted the request shape but rejected the result,
    /// or reported a value outside the known enumerations.
    #[error("API error: {0}")]
    Api(String),
}

/// Errors raised by local input validation.
///
/// These occur before any request is sent; a command that fails validation
/// leaves the cached device state and the network untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A target temperature is outside the device-reported limits.
    #[error("setpoint {actual} is out of range [{lower}, {upper}]")]
    SetpointOutOfRange {
        /// Lowest temperature the device accepts for this side.
        lower: f64,
        /// Highest temperature the device accepts for this side.
        upper: f64,
        /// The temperature that was requested.
        actual: f64,
    },

    /// A humidity setpoint is outside the equipment-reported limits.
    #[error("humidity setpoint {actual} is out of range [{lower}, {upper}]")]
    HumidityOutOfRange {
        /// Lowest humidity the equipment accepts.
        lower: u8,
        /// Highest humidity the equipment accepts.
        upper: u8,
        /// The (rounded) setpoint that was requested.
        actual: u8,
    },

    /// A temporary-hold deadline does not sit on a quarter-hour boundary.
    #[error("hold deadline {0} is not on a 15-minute boundary")]
    MisalignedDeadline(NaiveTime),

    /// The device does not allow the requested fan mode.
    #[error("device does not support fan mode {0}")]
    FanModeUnsupported(String),

    /// The device does not allow the requested system mode.
    #[error("device does not support system mode {0}")]
    SystemModeUnsupported(String),

    /// The device lacks the addressed equipment.
    #[error("device has no {0}")]
    NotEquipped(&'static str),

    /// A mode string could not be parsed.
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_error_display() {
        let err = ValidationError::SetpointOutOfRange {
            lower: 40.0,
            upper: 90.0,
            actual: 105.0,
        };
        assert_eq!(err.to_string(), "setpoint 105 is out of range [40, 90]");
    }

    #[test]
    fn error_from_validation_error() {
        let validation_err = ValidationError::NotEquipped("humidifier");
        let err: Error = validation_err.into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NotEquipped("humidifier"))
        ));
    }

    #[test]
    fn misaligned_deadline_display() {
        let deadline = NaiveTime::from_hms_opt(8, 10, 0).unwrap();
        let err = ValidationError::MisalignedDeadline(deadline);
        assert_eq!(
            err.to_string(),
            "hold deadline 08:10:00 is not on a 15-minute boundary"
        );
    }

    #[test]
    fn unexpected_response_display() {
        let err = Error::UnexpectedResponse {
            status: 418,
            path: "/portal/Device/CheckDataSession/1234".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected response: HTTP 418 from /portal/Device/CheckDataSession/1234"
        );
    }

    #[test]
    fn api_error_display() {
        let err = Error::Api("API rejected thermostat settings".to_string());
        assert_eq!(err.to_string(), "API error: API rejected thermostat settings");
    }
}
