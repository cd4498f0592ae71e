// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setpoint hold state and the quarter-hour deadline encoding.
//!
//! Each setpoint side (heat and cool) is either following the programmed
//! schedule, holding until a deadline later today, or holding permanently.
//! The portal stores temporary-hold deadlines as the number of quarter
//! hours since midnight (0-95), so a deadline must sit exactly on a
//! 15-minute boundary.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveTime;
//! use comfortr_lib::types::Hold;
//!
//! let until = NaiveTime::from_hms_opt(17, 45, 0).unwrap();
//! let hold = Hold::Temporary(until);
//! assert_eq!(hold.deadline(), Some(until));
//! assert!(hold.is_hold());
//! ```

use chrono::{NaiveTime, Timelike};

use crate::error::ValidationError;

/// Total quarter hours in a day; valid wire values are `0..96`.
const QUARTER_HOURS_PER_DAY: u16 = 96;

/// Hold state of one setpoint side.
///
/// The portal's `StatusHeat`/`StatusCool` fields encode these as 0
/// (schedule), 1 (temporary) and 2 (permanent); temporary holds carry
/// their deadline in the matching `*NextPeriod` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hold {
    /// Following the programmed schedule; no hold active.
    Schedule,
    /// Holding the setpoint until the given time of day.
    Temporary(NaiveTime),
    /// Holding the setpoint until explicitly released.
    Permanent,
}

impl Hold {
    /// Returns the `Status*` value sent to the portal.
    #[must_use]
    pub const fn status_code(&self) -> u8 {
        match self {
            Self::Schedule => 0,
            Self::Temporary(_) => 1,
            Self::Permanent => 2,
        }
    }

    /// Returns the temporary-hold deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<NaiveTime> {
        match self {
            Self::Temporary(deadline) => Some(*deadline),
            Self::Schedule | Self::Permanent => None,
        }
    }

    /// Returns `true` unless the side follows its schedule.
    #[must_use]
    pub const fn is_hold(&self) -> bool {
        !matches!(self, Self::Schedule)
    }
}

/// Encodes a hold deadline as quarter hours since midnight.
///
/// # Errors
///
/// Returns [`ValidationError::MisalignedDeadline`] unless the deadline sits
/// exactly on a 15-minute boundary (seconds included).
pub fn quarter_hours(deadline: NaiveTime) -> Result<u16, ValidationError> {
    if deadline.minute() % 15 != 0 || deadline.second() != 0 || deadline.nanosecond() != 0 {
        return Err(ValidationError::MisalignedDeadline(deadline));
    }
    let minutes = deadline.hour() * 60 + deadline.minute();
    // 23:45 encodes to 95, so the quotient always fits.
    #[allow(clippy::cast_possible_truncation)]
    Ok((minutes / 15) as u16)
}

/// Decodes a `*NextPeriod` value back into a time of day.
///
/// Returns `None` for values outside `0..96`.
#[must_use]
pub fn deadline_from_quarter_hours(quarters: u16) -> Option<NaiveTime> {
    if quarters >= QUARTER_HOURS_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt(u32::from(quarters) / 4, (u32::from(quarters) % 4) * 15, 0)
}
