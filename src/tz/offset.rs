use core::ops::{Add, Neg, Sub};

use crate::error::{err, Error};

/// An enum indicating whether a particular instant is in DST or not.
///
/// DST stands for "daylight saving time." When DST takes effect is
/// determined by governments and varies by location; this crate never
/// decides it itself, it only relays what the time zone rules say for a
/// particular instant.
///
/// This type has a `From<bool>` trait implementation, where the bool is
/// interpreted as being `true` when DST is active.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Dst {
    /// DST is not in effect. In other words, standard time is in effect.
    No,
    /// DST is in effect.
    Yes,
}

impl Dst {
    /// Returns true when this value is equal to `Dst::Yes`.
    pub fn is_dst(self) -> bool {
        matches!(self, Dst::Yes)
    }

    /// Returns true when this value is equal to `Dst::No`.
    pub fn is_std(self) -> bool {
        matches!(self, Dst::No)
    }
}

impl From<bool> for Dst {
    fn from(is_dst: bool) -> Dst {
        if is_dst {
            Dst::Yes
        } else {
            Dst::No
        }
    }
}

/// A time zone offset, as a signed number of seconds.
///
/// Negative offsets correspond to time zones west of the prime meridian,
/// positive offsets to time zones east of it. In all cases,
/// `civil-time - offset = UTC`.
///
/// This type doubles as the representation of a rule's daylight saving
/// *adjustment* (the [`save`](crate::tz::SysInfo::save) component of a
/// total offset), which is a duration rather than a position but has the
/// same unit, range and sign conventions.
///
/// # Display format
///
/// The `Display` implementation writes `{sign}{hours}[:{minutes}[:{seconds}]]`
/// where the minute and second components only appear when non-zero:
///
/// ```
/// use tzbind::tz::Offset;
///
/// assert_eq!(Offset::constant(-5).to_string(), "-05");
/// assert_eq!(Offset::hms(5, 30, 0).to_string(), "+05:30");
/// assert_eq!(Offset::constant(0).to_string(), "+00");
/// ```
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Offset {
    second: i32,
}

impl Offset {
    /// The minimum possible offset, `-25:59:59`.
    pub const MIN: Offset = Offset { second: -93_599 };

    /// The maximum possible offset, `+25:59:59`.
    pub const MAX: Offset = Offset { second: 93_599 };

    /// The offset corresponding to UTC; no offset at all.
    pub const UTC: Offset = Offset::constant(0);

    /// A zero offset. Equivalent to [`Offset::UTC`], but used where "no
    /// adjustment" rather than "the UTC zone" is meant, e.g. the `save` of
    /// a standard time rule.
    pub const ZERO: Offset = Offset::constant(0);

    /// Creates an offset from a whole number of hours in a `const`
    /// context.
    ///
    /// # Panics
    ///
    /// When `hours` is out of the range `-25..=25`.
    pub const fn constant(hours: i8) -> Offset {
        assert!(-25 <= hours && hours <= 25, "offset hours out of range");
        Offset { second: hours as i32 * 3600 }
    }

    /// Creates an offset from hour, minute and second components in a
    /// `const` context. The components must all have the same sign; pass
    /// the whole offset through [`Neg`] for western offsets with
    /// sub-hour components, e.g. `-Offset::hms(3, 30, 0)`.
    ///
    /// # Panics
    ///
    /// When any component is out of range (`|hours| <= 25`,
    /// `|minutes|, |seconds| <= 59`).
    pub const fn hms(hours: i8, minutes: i8, seconds: i8) -> Offset {
        assert!(-25 <= hours && hours <= 25, "offset hours out of range");
        assert!(
            -59 <= minutes && minutes <= 59,
            "offset minutes out of range"
        );
        assert!(
            -59 <= seconds && seconds <= 59,
            "offset seconds out of range"
        );
        Offset {
            second: hours as i32 * 3600
                + minutes as i32 * 60
                + seconds as i32,
        }
    }

    /// Creates an offset from a number of seconds, validating the range.
    pub fn from_seconds(seconds: i32) -> Result<Offset, Error> {
        if !(Offset::MIN.second..=Offset::MAX.second).contains(&seconds) {
            return Err(err!(
                "offset of {seconds} seconds is not in the required range \
                 of {}..={}",
                Offset::MIN.second,
                Offset::MAX.second,
            ));
        }
        Ok(Offset { second: seconds })
    }

    /// Returns this offset as a number of seconds.
    pub const fn seconds(self) -> i32 {
        self.second
    }

    /// Returns this offset as a number of milliseconds. Useful for
    /// applying an offset to an [`crate::Instant`], which counts
    /// milliseconds.
    pub const fn milliseconds(self) -> i64 {
        self.second as i64 * 1000
    }

    /// Returns true if and only if this offset is less than zero.
    pub const fn is_negative(self) -> bool {
        self.second < 0
    }

    /// Returns true if and only if this offset is zero.
    pub const fn is_zero(self) -> bool {
        self.second == 0
    }
}

impl Add for Offset {
    type Output = Offset;

    /// Adds two offsets together. Used to combine a rule's standard
    /// component with its daylight saving adjustment. The sum of two valid
    /// offsets is nowhere near `i32` overflow, so this is a plain add.
    fn add(self, rhs: Offset) -> Offset {
        Offset { second: self.second + rhs.second }
    }
}

impl Sub for Offset {
    type Output = Offset;

    fn sub(self, rhs: Offset) -> Offset {
        Offset { second: self.second - rhs.second }
    }
}

impl Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset { second: -self.second }
    }
}

impl core::fmt::Display for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let sign = if self.second < 0 { "-" } else { "+" };
        let second = self.second.unsigned_abs();
        let (hours, minutes, seconds) =
            (second / 3600, (second / 60) % 60, second % 60);
        write!(f, "{sign}{hours:02}")?;
        if minutes != 0 || seconds != 0 {
            write!(f, ":{minutes:02}")?;
        }
        if seconds != 0 {
            write!(f, ":{seconds:02}")?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Offset({self})")
    }
}
