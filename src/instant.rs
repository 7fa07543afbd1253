use core::marker::PhantomData;

use crate::{tz::Offset, util};

/// Milliseconds in one civil day.
const MILLIS_PER_DAY: i64 = 86_400_000;

/// A marker trait for the two flavors of [`Instant`].
///
/// This trait is sealed and implemented only by [`Sys`] and [`Local`].
pub trait TimeKind:
    private::Sealed + Copy + Clone + core::fmt::Debug + Eq + PartialEq + 'static
{
    /// A short label used when rendering instants for humans.
    const LABEL: &'static str;
}

/// The system flavor of an [`Instant`]: a true point on the UTC timeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Sys;

/// The local flavor of an [`Instant`]: a civil clock reading with no
/// offset attached. Two distinct points on the UTC timeline can map to the
/// same `Instant<Local>`, and some `Instant<Local>` values correspond to
/// no point at all. [`crate::TimeZone::local_info`] classifies them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Local;

impl TimeKind for Sys {
    const LABEL: &'static str = "sys";
}

impl TimeKind for Local {
    const LABEL: &'static str = "local";
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Sys {}
    impl Sealed for super::Local {}
}

/// A signed, fixed point count of milliseconds since the Unix epoch,
/// tagged with whether it lives on the system (UTC) or local (civil)
/// timeline.
///
/// The representation is integer only. The platform backend traffics in
/// floating point milliseconds, but that representation loses sub-unit
/// precision at extreme dates, so it is confined to the backend boundary.
///
/// # Sentinels
///
/// [`Instant::MIN`] and [`Instant::MAX`] mean "no further transition in
/// this direction" and behave like -∞/+∞: arithmetic on them is absorbing
/// rather than wrapping. A [`crate::tz::SysInfo`] for a zone with a single
/// rule for all time has `begin == Instant::MIN` and `end == Instant::MAX`.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Instant<K: TimeKind = Sys> {
    kind: PhantomData<K>,
    millisecond: i64,
}

impl<K: TimeKind> Instant<K> {
    /// The minimum instant, standing in for "the beginning of time."
    pub const MIN: Instant<K> =
        Instant { kind: PhantomData, millisecond: i64::MIN };

    /// The maximum instant, standing in for "the end of time."
    pub const MAX: Instant<K> =
        Instant { kind: PhantomData, millisecond: i64::MAX };

    /// The Unix epoch, `1970-01-01T00:00:00`.
    pub const EPOCH: Instant<K> =
        Instant { kind: PhantomData, millisecond: 0 };

    /// Creates an instant from a count of milliseconds since the Unix
    /// epoch.
    pub const fn from_millisecond(millisecond: i64) -> Instant<K> {
        Instant { kind: PhantomData, millisecond }
    }

    /// Creates an instant from civil datetime fields, interpreted naively
    /// on this instant's own timeline.
    ///
    /// For `Instant<Sys>` the fields are a UTC datetime; for
    /// `Instant<Local>` they are a wall clock reading. `month` is
    /// `1..=12`. The fields are not otherwise validated; garbage in,
    /// garbage out.
    pub const fn from_datetime(
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
        second: i8,
    ) -> Instant<K> {
        let days =
            util::days_from_civil(year as i64, month as i64, day as i64);
        let seconds =
            hour as i64 * 3600 + minute as i64 * 60 + second as i64;
        Instant::from_millisecond(days * MILLIS_PER_DAY + seconds * 1000)
    }

    /// Returns this instant as a count of milliseconds since the Unix
    /// epoch.
    pub const fn millisecond(self) -> i64 {
        self.millisecond
    }

    /// Returns true if this is the "beginning of time" sentinel.
    pub const fn is_min(self) -> bool {
        self.millisecond == i64::MIN
    }

    /// Returns true if this is the "end of time" sentinel.
    pub const fn is_max(self) -> bool {
        self.millisecond == i64::MAX
    }

    /// Adds a number of milliseconds, saturating at the sentinels. The
    /// sentinels themselves are absorbing: `MIN + x == MIN` for any `x`.
    pub const fn saturating_add(self, millisecond: i64) -> Instant<K> {
        if self.is_min() || self.is_max() {
            return self;
        }
        Instant::from_millisecond(
            self.millisecond.saturating_add(millisecond),
        )
    }

    /// Subtracts a number of milliseconds, saturating at the sentinels.
    pub const fn saturating_sub(self, millisecond: i64) -> Instant<K> {
        if self.is_min() || self.is_max() {
            return self;
        }
        Instant::from_millisecond(
            self.millisecond.saturating_sub(millisecond),
        )
    }

    /// Re-tags this instant onto another timeline without changing its
    /// representation. This is the "interpret a local time as if it were a
    /// system time" step of local time disambiguation, which is why it is
    /// not public.
    pub(crate) const fn cast<T: TimeKind>(self) -> Instant<T> {
        Instant { kind: PhantomData, millisecond: self.millisecond }
    }
}

impl Instant<Local> {
    /// Applies a UTC offset to this local instant, producing the system
    /// instant that this wall clock reading denotes *if* the offset is the
    /// one in force. `local - offset = sys`.
    pub fn to_sys(self, offset: Offset) -> Instant<Sys> {
        self.cast::<Sys>().saturating_sub(offset.milliseconds())
    }
}

impl Instant<Sys> {
    /// Applies a UTC offset to this system instant, producing the wall
    /// clock reading in a zone using that offset. `sys + offset = local`.
    pub fn to_local(self, offset: Offset) -> Instant<Local> {
        self.cast::<Local>().saturating_add(offset.milliseconds())
    }
}

impl<K: TimeKind> core::fmt::Display for Instant<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.is_min() {
            return f.write_str("-infinity");
        }
        if self.is_max() {
            return f.write_str("+infinity");
        }
        let days = self.millisecond.div_euclid(MILLIS_PER_DAY);
        let of_day = self.millisecond.rem_euclid(MILLIS_PER_DAY);
        let (year, month, day) = util::civil_from_days(days);
        let (second, milli) = (of_day / 1000, of_day % 1000);
        let (hour, minute, second) =
            (second / 3600, (second / 60) % 60, second % 60);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}",
        )?;
        if milli != 0 {
            write!(f, ".{milli:03}")?;
        }
        Ok(())
    }
}

impl<K: TimeKind> core::fmt::Debug for Instant<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}({})", K::LABEL, self)
    }
}
