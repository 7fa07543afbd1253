/*!
The seam between this crate and the platform's calendar backend.

Everything above this module is platform independent: the transition
resolver and the zone registry speak to a [`Backend`] trait object and
never to the OS directly. The one production implementation (the `icu`
module, Windows only) binds dynamically to the platform's ICU library;
tests use a deterministic in-memory implementation.

The other thing living here is `Binding`, the process-wide write-once
cell that gives the production backend its "load exactly once, cache
failure forever" lifecycle.
*/

use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

use crate::{
    error::Error,
    instant::{Instant, Sys},
    tz::Offset,
};

#[cfg(windows)]
pub(crate) mod icu;
#[cfg(test)]
pub(crate) mod testdata;

/// Which zone identifiers an enumeration should yield.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZoneIdScope {
    /// Only identifiers the backend considers primary (non-alias) rule
    /// sets. Note that the backend's notion of "canonical" does not always
    /// agree with the IANA database; see [`crate::Tzdb`].
    Canonical,
    /// Every identifier the backend knows, aliases included.
    All,
}

/// The direction of a transition query relative to a context's current
/// instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransitionDirection {
    /// The closest transition at or before the current instant.
    PreviousInclusive,
    /// The closest transition strictly after the current instant.
    Next,
}

/// Which display name of a zone to render.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayVariant {
    /// The name used while standard time is in force, e.g. `PST`.
    Standard,
    /// The name used while daylight saving time is in force, e.g. `PDT`.
    Daylight,
}

/// The capability surface this crate requires of a calendar backend.
///
/// Implementations must be safe to call concurrently; each query opens its
/// own [`CalendarContext`], so no mutable state is shared between callers.
///
/// Errors must distinguish "the backend as a whole is unavailable"
/// ([`Error::is_backend_unavailable`]) from "this specific query failed"
/// ([`Error::is_backend_query_failed`]); the rest of the crate propagates
/// both unchanged.
pub trait Backend: Send + Sync + core::fmt::Debug {
    /// Enumerates the zone identifiers known to the backend. The sequence
    /// is finite and produced in one pass.
    fn enumerate_zone_ids(
        &self,
        scope: ZoneIdScope,
    ) -> Result<Vec<String>, Error>;

    /// Returns the identifier of the zone the platform is currently
    /// configured to use.
    fn default_zone_id(&self) -> Result<String, Error>;

    /// Opens a calendar context for the given zone identifier.
    fn open<'b>(
        &'b self,
        zone_id: &str,
    ) -> Result<Box<dyn CalendarContext + 'b>, Error>;
}

/// A calendar positioned in one zone at one instant.
///
/// A context is owned by a single query and dropped when the query
/// completes; dropping it releases whatever the backend allocated for it.
pub trait CalendarContext {
    /// Positions this context at the given instant.
    fn set_instant(&mut self, instant: Instant<Sys>) -> Result<(), Error>;

    /// Returns true if daylight saving time is in effect at the current
    /// instant.
    fn in_daylight_time(&mut self) -> Result<bool, Error>;

    /// Returns the standard (non-daylight) component of the zone's offset
    /// at the current instant.
    fn zone_offset(&mut self) -> Result<Offset, Error>;

    /// Returns the daylight saving component of the zone's offset at the
    /// current instant. Zero while standard time is in force.
    fn daylight_offset(&mut self) -> Result<Offset, Error>;

    /// Returns the instant of the closest transition in the given
    /// direction, or `None` if there is no transition that way.
    fn transition(
        &mut self,
        direction: TransitionDirection,
    ) -> Result<Option<Instant<Sys>>, Error>;

    /// Renders the zone's short display name for the given variant.
    fn display_name(
        &mut self,
        variant: DisplayVariant,
    ) -> Result<String, Error>;
}

/// Returns the platform backend, binding it on first use.
///
/// The result of the first bind attempt, success or failure, is cached for
/// the lifetime of the process.
#[allow(unreachable_code)]
pub(crate) fn platform() -> Result<std::sync::Arc<dyn Backend>, Error> {
    #[cfg(windows)]
    {
        icu::acquire()?;
        return Ok(std::sync::Arc::new(icu::IcuBackend));
    }
    debug!("no platform time zone backend on this target");
    Err(Error::backend_unavailable())
}

/// The states of a [`Binding`]. `Failed` and `Ready` are terminal for the
/// process lifetime.
const NOT_SET: u8 = 0;
const DETECTING: u8 = 1;
const FAILED: u8 = 2;
const READY: u8 = 3;

/// A process-wide, write-once cell for a backend's function table.
///
/// Exactly one caller wins the `NotSet -> Detecting` transition and runs
/// the load; concurrent losers spin until the winner publishes `Failed` or
/// `Ready`. The busy wait is acceptable because the window is bounded by a
/// single library-load-and-symbol-resolution pass. Once published, the
/// state never changes: a failed load is never retried, and a loaded table
/// is immutable, so readers need only an acquire load of the state flag.
pub(crate) struct Binding<T> {
    state: AtomicU8,
    slot: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: the slot is written exactly once, before the `READY` publish,
// and only read after observing `READY` with acquire ordering.
unsafe impl<T: Send + Sync> Sync for Binding<T> {}

impl<T> Binding<T> {
    pub(crate) const fn new() -> Binding<T> {
        Binding {
            state: AtomicU8::new(NOT_SET),
            slot: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Returns the bound table, running `load` to produce it if this is
    /// the first acquisition process-wide.
    ///
    /// If `load` fails (now or on any previous acquisition), this returns
    /// a `BackendUnavailable` error without ever re-running `load`.
    pub(crate) fn acquire(
        &self,
        load: impl FnOnce() -> Result<T, Error>,
    ) -> Result<&T, Error> {
        let mut state = self.state.load(Ordering::Acquire);
        if state == NOT_SET {
            state = match self.state.compare_exchange(
                NOT_SET,
                DETECTING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => self.bind(load),
                Err(observed) => observed,
            };
        }
        while state == DETECTING {
            core::hint::spin_loop();
            state = self.state.load(Ordering::Acquire);
        }
        if state == READY {
            // SAFETY: `READY` is published with release ordering after the
            // one and only write to the slot.
            Ok(unsafe { (*self.slot.get()).assume_init_ref() })
        } else {
            Err(Error::backend_unavailable())
        }
    }

    /// Runs the load on behalf of the winning caller and publishes the
    /// terminal state.
    fn bind(&self, load: impl FnOnce() -> Result<T, Error>) -> u8 {
        let state = match load() {
            Ok(table) => {
                // SAFETY: we won the CAS, so no other thread writes the
                // slot, and no thread reads it before `READY` is stored.
                unsafe { (*self.slot.get()).write(table) };
                READY
            }
            Err(_err) => {
                warn!("failed to bind time zone backend: {_err}");
                FAILED
            }
        };
        self.state.store(state, Ordering::Release);
        state
    }
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == READY {
            // SAFETY: `READY` implies the slot was initialized, and `&mut
            // self` implies no outstanding borrows.
            unsafe { (*self.slot.get()).assume_init_drop() };
        }
    }
}

impl<T> core::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let state = match self.state.load(Ordering::Acquire) {
            NOT_SET => "not-set",
            DETECTING => "detecting",
            FAILED => "failed",
            READY => "ready",
            _ => unreachable!(),
        };
        f.debug_struct("Binding").field("state", &state).finish()
    }
}
