/*!
Time zone resolution on top of a platform-supplied calendar backend.

This crate answers two questions about a time zone without shipping or
parsing any time zone rule data of its own:

1. Given an absolute instant, which rule is in force? That is, what is the
total UTC offset, how much of it is a daylight saving adjustment, what is
the rule's abbreviation and for which interval of absolute time does the
rule apply? See [`TimeZone::sys_info`].
2. Given a civil ("local", offset-naive) instant, which absolute instants
could it refer to? A local time near a daylight saving transition may be
[unique](tz::LocalInfo::Unique), [ambiguous](tz::LocalInfo::Ambiguous)
(clocks rolled backwards over it) or
[nonexistent](tz::LocalInfo::Nonexistent) (clocks jumped over it). See
[`TimeZone::local_info`] and [`TimeZone::to_sys`].

The raw per-instant rule queries are delegated to an external
[backend](crate::backend::Backend). The production backend binds lazily to
the platform's ICU library, exactly once per process, and failures to bind
are cached rather than retried. Everything above the backend seam is
platform independent, and tests run against a deterministic in-memory
backend.

# Example

Look up a zone and classify a civil time that falls into a spring-forward
gap:

```no_run
use tzbind::{tz::Disambiguation, Instant, Local, Tzdb};

let db = Tzdb::from_platform()?;
let tz = db.locate_zone("America/Los_Angeles").expect("zone exists");

// 2021-03-14 02:30 never happened in Los Angeles.
let civil: Instant<Local> = Instant::from_datetime(2021, 3, 14, 2, 30, 0);
let info = tz.local_info(civil)?;
assert!(info.is_nonexistent());

// Normalizing forward across the gap lands on 03:30-07:00.
let sys = tz.to_sys(civil, Disambiguation::Earliest)?;
assert_eq!(tz.to_local(sys)?, Instant::from_datetime(2021, 3, 14, 3, 30, 0));
# Ok::<(), tzbind::Error>(())
```

# Snapshots

A [`Tzdb`] owns a history of immutable [`TzdbSnapshot`]s. Looking up a zone
never mutates a snapshot, and [`Tzdb::reload`] publishes a completely new
snapshot atomically: holders of handles into an older snapshot keep
observing it unchanged.

# Crate features

* **logging** - Emits diagnostic messages via the [`log`] crate, mostly on
fallback and failure paths. Disabled by default.

[`log`]: https://docs.rs/log
*/

#![deny(missing_docs)]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

#[macro_use]
mod logging;

pub use crate::{
    error::Error,
    instant::{Instant, Local, Sys, TimeKind},
    leap::{LeapFetch, LeapSecond, LeapSecondSource},
    tz::TimeZone,
    tzdb::{Link, Tzdb, TzdbSnapshot},
};

pub mod backend;
mod error;
mod instant;
mod leap;
pub mod tz;
mod tzdb;
mod util;
