//! The canonical timezone that all calendar period boundaries are computed in.

use std::fmt::Debug;

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::Error;

/// The single timezone used to derive hours, days, weeks, months and years
/// from transaction timestamps.
///
/// The host machine's local timezone is never consulted.
#[derive(Clone, Copy, Default)]
pub enum CanonicalZone {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// An IANA timezone, e.g. "Pacific/Auckland".
    Named(&'static Tz),
}

impl CanonicalZone {
    /// Resolve a canonical timezone string such as "Africa/Lagos".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezone] if `name` is not a known timezone.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.eq_ignore_ascii_case("UTC") {
            return Ok(Self::Utc);
        }

        time_tz::timezones::get_by_name(name)
            .map(Self::Named)
            .ok_or_else(|| Error::InvalidTimezone(name.to_owned()))
    }

    /// The canonical name of the timezone.
    pub fn name(&self) -> &str {
        match self {
            Self::Utc => "UTC",
            Self::Named(tz) => tz.name(),
        }
    }

    /// The UTC offset in effect at `instant`.
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Utc => UtcOffset::UTC,
            Self::Named(tz) => tz.get_offset_utc(&instant).to_utc(),
        }
    }

    /// The wall clock time in this zone at `instant`.
    pub fn to_local(&self, instant: OffsetDateTime) -> PrimitiveDateTime {
        let local = instant.to_offset(self.offset_at(instant));

        PrimitiveDateTime::new(local.date(), local.time())
    }

    /// The instant at which the wall clock in this zone reads `local`.
    ///
    /// A wall clock time skipped by a forward transition is read with the
    /// offset in effect before the gap, which moves it forward by the length
    /// of the gap. A skipped midnight therefore becomes the first instant of
    /// that day. A wall clock time repeated by a backward transition resolves
    /// to the earlier of its two instants.
    pub fn from_local(&self, local: PrimitiveDateTime) -> OffsetDateTime {
        let tz = match self {
            Self::Utc => return local.assume_utc(),
            Self::Named(tz) => *tz,
        };

        match local.assume_timezone(tz) {
            OffsetResult::Some(instant) => instant,
            OffsetResult::Ambiguous(first, second) => first.min(second),
            OffsetResult::None => {
                // Transitions are at least a day apart, so the offset a day
                // earlier is the one in effect before the gap.
                let before_gap = self.offset_at(local.assume_utc() - Duration::DAY);
                local.assume_offset(before_gap)
            }
        }
    }

    /// The calendar date in this zone at `instant`.
    pub fn date_of(&self, instant: OffsetDateTime) -> Date {
        self.to_local(instant).date()
    }
}

impl Debug for CanonicalZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CanonicalZone({})", self.name())
    }
}

impl PartialEq for CanonicalZone {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
