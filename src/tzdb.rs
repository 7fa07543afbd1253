use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::{
    backend::{self, Backend, ZoneIdScope},
    error::Error,
    leap::{self, LeapFetch, LeapSecond, LeapSecondSource},
    tz::TimeZone,
};

/// Known cases where the backend's canonical zone list disagrees with the
/// IANA database: the backend enumerates these names as canonical zones,
/// but the database defines them as links to another zone's rules, so the
/// registry emits them as links instead.
///
/// Checked against tzdata 2021a. This list is incomplete by nature; when
/// another divergence turns up, extend the data, not the resolution
/// logic. A correction whose target the backend does not enumerate is
/// ignored (see the snapshot build), so a stale entry degrades to the
/// backend's own classification rather than a dangling link.
const CORRECTED_LINKS: &[(&str, &str)] = &[
    ("Africa/Addis_Ababa", "Africa/Nairobi"),
    ("Africa/Asmara", "Africa/Nairobi"),
    ("Africa/Djibouti", "Africa/Nairobi"),
    ("America/Godthab", "America/Nuuk"),
    ("Asia/Muscat", "Asia/Dubai"),
    ("Pacific/Saipan", "Pacific/Guam"),
];

fn corrected_target(name: &str) -> Option<&'static str> {
    CORRECTED_LINKS
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map(|&(_, target)| target)
}

/// A name that maps to another zone's rules rather than owning rules
/// itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Link {
    name: String,
    target: String,
}

impl Link {
    /// The alias name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the zone whose rules this alias resolves to.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// One immutable, fully built view of the zone registry.
///
/// A snapshot is built atomically: either every zone, link and leap
/// second entry is in place, or the build fails and no snapshot exists.
/// After construction nothing mutates it, so lookups are pure in-memory
/// searches with no backend round trips, and a snapshot can be shared
/// freely across threads.
pub struct TzdbSnapshot {
    /// Sorted by name.
    zones: Vec<TimeZone>,
    /// Sorted by alias name.
    links: Vec<Link>,
    leap_seconds: Vec<LeapSecond>,
    /// The platform's default zone id, captured at build time. Resolved
    /// through `locate_zone` on demand since the backend's default is not
    /// guaranteed to be a name the registry knows.
    current_zone_name: String,
}

impl TzdbSnapshot {
    fn build(
        backend: &Arc<dyn Backend>,
        leap_source: &Arc<dyn LeapSecondSource>,
        prev: Option<&TzdbSnapshot>,
    ) -> Result<TzdbSnapshot, Error> {
        let ids = backend
            .enumerate_zone_ids(ZoneIdScope::Canonical)
            .map_err(|e| e.context("failed to enumerate time zones"))?;

        let mut zones = Vec::with_capacity(ids.len());
        let mut links = Vec::new();
        for id in &ids {
            match corrected_target(id) {
                Some(target)
                    if ids.iter().any(|other| other == target) =>
                {
                    links.push(Link {
                        name: id.clone(),
                        target: target.to_string(),
                    });
                }
                Some(_target) => {
                    // The backend doesn't know the correction's target,
                    // so a link would dangle. Keep the backend's own
                    // classification.
                    debug!(
                        "correction target {_target} for {id} is not \
                         enumerated, keeping {id} as a zone",
                    );
                    zones.push(TimeZone::new(id, backend.clone()));
                }
                None => zones.push(TimeZone::new(id, backend.clone())),
            }
        }
        zones.sort();
        links.sort_by(|l1, l2| l1.name.cmp(&l2.name));

        let known = prev.map_or(0, |snap| snap.leap_seconds.len());
        let leap_seconds = match leap_source
            .fetch(known)
            .map_err(|e| e.context("failed to refresh leap second data"))?
        {
            LeapFetch::UpToDate => {
                prev.map(|snap| snap.leap_seconds.clone()).unwrap_or_default()
            }
            LeapFetch::Refreshed(mut entries) => {
                entries.sort();
                entries
            }
        };

        let current_zone_name = backend
            .default_zone_id()
            .map_err(|e| e.context("failed to resolve the default zone"))?;

        debug!(
            "built tzdb snapshot with {} zones, {} links, {} leap seconds",
            zones.len(),
            links.len(),
            leap_seconds.len(),
        );
        Ok(TzdbSnapshot { zones, links, leap_seconds, current_zone_name })
    }

    /// Looks up a zone by exact, case sensitive name.
    ///
    /// A link alias resolves to its target zone, so the returned handle's
    /// [`TimeZone::name`] may differ from `name`. Within one snapshot,
    /// repeated lookups of the same name return handles sharing one
    /// allocation.
    pub fn locate_zone(&self, name: &str) -> Option<TimeZone> {
        if let Ok(i) =
            self.zones.binary_search_by(|zone| zone.name().cmp(name))
        {
            return Some(self.zones[i].clone());
        }
        let i = self
            .links
            .binary_search_by(|link| link.name.as_str().cmp(name))
            .ok()?;
        let target = self.links[i].target.as_str();
        let i = self
            .zones
            .binary_search_by(|zone| zone.name().cmp(target))
            .ok()?;
        Some(self.zones[i].clone())
    }

    /// Returns the zone the platform was configured to use when this
    /// snapshot was built.
    ///
    /// Fails with a [zone-not-found](Error::is_zone_not_found) error if
    /// the platform reported a default this registry doesn't know. That
    /// is not supposed to happen, but a misconfigured platform must not
    /// take the process down.
    pub fn current_zone(&self) -> Result<TimeZone, Error> {
        self.locate_zone(&self.current_zone_name).ok_or_else(|| {
            Error::zone_not_found(&*self.current_zone_name)
        })
    }

    /// The zones of this snapshot, sorted by name.
    pub fn zones(&self) -> &[TimeZone] {
        &self.zones
    }

    /// The link aliases of this snapshot, sorted by name.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The leap second table of this snapshot, in effect order.
    pub fn leap_seconds(&self) -> &[LeapSecond] {
        &self.leap_seconds
    }
}

impl core::fmt::Debug for TzdbSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        // Dumping thousands of zone handles is noise; counts tell the
        // story.
        f.debug_struct("TzdbSnapshot")
            .field("zones", &self.zones.len())
            .field("links", &self.links.len())
            .field("leap_seconds", &self.leap_seconds.len())
            .field("current_zone_name", &self.current_zone_name)
            .finish()
    }
}

/// The entry point: a backend paired with a history of registry
/// snapshots.
///
/// The most recent snapshot is the "current" one and is what the
/// convenience lookups on this type use. [`Tzdb::reload`] builds a whole
/// new snapshot and publishes it with a single atomic swap; readers
/// observe either the old snapshot or the new one, never a partially
/// built one, and snapshots already handed out remain valid and unchanged
/// for as long as they are held.
///
/// # Example
///
/// ```no_run
/// use tzbind::Tzdb;
///
/// let db = Tzdb::from_platform()?;
/// let tz = db.current_zone()?;
/// println!("local zone is {}", tz.name());
/// # Ok::<(), tzbind::Error>(())
/// ```
pub struct Tzdb {
    backend: Arc<dyn Backend>,
    leap_source: Arc<dyn LeapSecondSource>,
    current: ArcSwap<TzdbSnapshot>,
    /// Most recent first. The lock serializes reloads; readers go through
    /// `current` and never take it.
    history: Mutex<Vec<Arc<TzdbSnapshot>>>,
}

impl Tzdb {
    /// Opens the platform's time zone database: the platform calendar
    /// backend plus the platform leap second source.
    ///
    /// The first snapshot is built eagerly, so this fails loudly when the
    /// backend is unavailable rather than deferring the error to every
    /// lookup.
    pub fn from_platform() -> Result<Tzdb, Error> {
        Tzdb::new(backend::platform()?, leap::platform_source())
    }

    /// Opens a database over the given backend and leap second source and
    /// builds its first snapshot.
    pub fn new(
        backend: Arc<dyn Backend>,
        leap_source: Arc<dyn LeapSecondSource>,
    ) -> Result<Tzdb, Error> {
        let snapshot =
            Arc::new(TzdbSnapshot::build(&backend, &leap_source, None)?);
        Ok(Tzdb {
            backend,
            leap_source,
            current: ArcSwap::new(Arc::clone(&snapshot)),
            history: Mutex::new(vec![snapshot]),
        })
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Arc<TzdbSnapshot> {
        self.current.load_full()
    }

    /// Builds a fresh snapshot from the backend and publishes it as the
    /// current one.
    ///
    /// On failure the previous snapshot stays current; a partially built
    /// snapshot is never observable. Existing snapshot handles are
    /// unaffected either way.
    pub fn reload(&self) -> Result<Arc<TzdbSnapshot>, Error> {
        let mut history = self.history.lock().unwrap();
        let prev = self.current.load_full();
        let snapshot = Arc::new(TzdbSnapshot::build(
            &self.backend,
            &self.leap_source,
            Some(&prev),
        )?);
        history.insert(0, Arc::clone(&snapshot));
        self.current.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Returns every snapshot built so far, most recent first.
    pub fn snapshots(&self) -> Vec<Arc<TzdbSnapshot>> {
        self.history.lock().unwrap().clone()
    }

    /// Looks up a zone in the current snapshot. See
    /// [`TzdbSnapshot::locate_zone`].
    pub fn locate_zone(&self, name: &str) -> Option<TimeZone> {
        self.current.load().locate_zone(name)
    }

    /// Returns the platform's configured zone per the current snapshot.
    /// See [`TzdbSnapshot::current_zone`].
    pub fn current_zone(&self) -> Result<TimeZone, Error> {
        self.current.load().current_zone()
    }
}

impl core::fmt::Debug for Tzdb {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Tzdb")
            .field("current", &self.current.load_full())
            .field("snapshots", &self.history.lock().unwrap().len())
            .finish()
    }
}
