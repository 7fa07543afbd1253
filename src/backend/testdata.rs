/*!
A deterministic in-memory [`Backend`] for tests.

The transition tables below are transcribed from real IANA data for the
2019-2021 window the tests exercise: `Australia/Sydney` (a positive offset
zone whose DST boundaries disambiguate via the *previous* rule) and
`America/Los_Angeles` (a negative offset zone which disambiguates via the
*next* rule). The zone list is behind a mutex so reload tests can grow it
between snapshots.
*/

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use crate::{
    backend::{
        Backend, CalendarContext, DisplayVariant, TransitionDirection,
        ZoneIdScope,
    },
    error::Error,
    instant::{Instant, Sys},
    tz::Offset,
};

/// One contiguous run of a single rule: from `begin` (or forever, when
/// `None`) until the next era's `begin`.
#[derive(Clone, Debug)]
struct Era {
    begin: Option<Instant<Sys>>,
    offset: Offset,
    save: Offset,
}

#[derive(Clone, Debug)]
pub(crate) struct TestZone {
    name: String,
    std_abbrev: String,
    dst_abbrev: String,
    /// Sorted by `begin`; the first era always has `begin: None`.
    eras: Vec<Era>,
    /// When set, opening the zone succeeds but every context query fails.
    broken: bool,
}

impl TestZone {
    /// A zone with a single rule for all time.
    pub(crate) fn fixed(
        name: &str,
        offset: Offset,
        abbrev: &str,
    ) -> TestZone {
        TestZone {
            name: name.to_string(),
            std_abbrev: abbrev.to_string(),
            dst_abbrev: abbrev.to_string(),
            eras: vec![Era { begin: None, offset, save: Offset::ZERO }],
            broken: false,
        }
    }

    /// `Australia/Sydney`, 2019-2021: AEST (+10) with AEDT (+11)
    /// daylight time beginning 02:00 local in October and ending 03:00
    /// local in April.
    pub(crate) fn sydney() -> TestZone {
        let std = Offset::constant(10);
        let day = Offset::constant(11);
        let hour = Offset::constant(1);
        TestZone {
            name: "Australia/Sydney".to_string(),
            std_abbrev: "AEST".to_string(),
            dst_abbrev: "AEDT".to_string(),
            eras: vec![
                Era { begin: None, offset: std, save: Offset::ZERO },
                // 2019-10-06T02:00+10:00
                Era {
                    begin: Some(Instant::from_datetime(2019, 10, 5, 16, 0, 0)),
                    offset: day,
                    save: hour,
                },
                // 2020-04-05T03:00+11:00
                Era {
                    begin: Some(Instant::from_datetime(2020, 4, 4, 16, 0, 0)),
                    offset: std,
                    save: Offset::ZERO,
                },
                // 2020-10-04T02:00+10:00
                Era {
                    begin: Some(Instant::from_datetime(2020, 10, 3, 16, 0, 0)),
                    offset: day,
                    save: hour,
                },
                // 2021-04-04T03:00+11:00
                Era {
                    begin: Some(Instant::from_datetime(2021, 4, 3, 16, 0, 0)),
                    offset: std,
                    save: Offset::ZERO,
                },
            ],
            broken: false,
        }
    }

    /// `America/Los_Angeles`, 2020-2021: PST (-8) with PDT (-7) daylight
    /// time beginning and ending 02:00 local.
    pub(crate) fn los_angeles() -> TestZone {
        let std = Offset::constant(-8);
        let day = Offset::constant(-7);
        let hour = Offset::constant(1);
        TestZone {
            name: "America/Los_Angeles".to_string(),
            std_abbrev: "PST".to_string(),
            dst_abbrev: "PDT".to_string(),
            eras: vec![
                Era { begin: None, offset: std, save: Offset::ZERO },
                // 2020-03-08T02:00-08:00
                Era {
                    begin: Some(Instant::from_datetime(2020, 3, 8, 10, 0, 0)),
                    offset: day,
                    save: hour,
                },
                // 2020-11-01T02:00-07:00
                Era {
                    begin: Some(Instant::from_datetime(2020, 11, 1, 9, 0, 0)),
                    offset: std,
                    save: Offset::ZERO,
                },
                // 2021-03-14T02:00-08:00
                Era {
                    begin: Some(Instant::from_datetime(2021, 3, 14, 10, 0, 0)),
                    offset: day,
                    save: hour,
                },
                // 2021-11-07T02:00-07:00
                Era {
                    begin: Some(Instant::from_datetime(2021, 11, 7, 9, 0, 0)),
                    offset: std,
                    save: Offset::ZERO,
                },
            ],
            broken: false,
        }
    }

    /// A zone whose contexts fail every query.
    pub(crate) fn broken(name: &str) -> TestZone {
        let mut zone = TestZone::fixed(name, Offset::ZERO, "???");
        zone.broken = true;
        zone
    }
}

/// The fake backend. All state is behind locks so tests can mutate the
/// zone list between snapshot builds.
#[derive(Debug)]
pub(crate) struct TestBackend {
    zones: Mutex<Vec<TestZone>>,
    default_zone: Mutex<String>,
    fail_enumeration: AtomicBool,
}

impl TestBackend {
    /// A backend with the standard fixtures: Sydney, Los Angeles, UTC and
    /// the correction table cases (`Africa/Addis_Ababa` with its target
    /// `Africa/Nairobi` present, `America/Godthab` with its target
    /// absent).
    pub(crate) fn new() -> TestBackend {
        let eat = Offset::constant(3);
        TestBackend {
            zones: Mutex::new(vec![
                TestZone::sydney(),
                TestZone::los_angeles(),
                TestZone::fixed("Etc/UTC", Offset::UTC, "UTC"),
                TestZone::fixed("Africa/Nairobi", eat, "EAT"),
                TestZone::fixed("Africa/Addis_Ababa", eat, "EAT"),
                TestZone::fixed(
                    "America/Godthab",
                    Offset::constant(-3),
                    "WGT",
                ),
            ]),
            default_zone: Mutex::new("Australia/Sydney".to_string()),
            fail_enumeration: AtomicBool::new(false),
        }
    }

    pub(crate) fn add_zone(&self, zone: TestZone) {
        self.zones.lock().unwrap().push(zone);
    }

    pub(crate) fn set_default_zone(&self, name: &str) {
        *self.default_zone.lock().unwrap() = name.to_string();
    }

    pub(crate) fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }
}

impl Backend for TestBackend {
    fn enumerate_zone_ids(
        &self,
        _scope: ZoneIdScope,
    ) -> Result<Vec<String>, Error> {
        // The fake has no aliases of its own, so the canonical and full
        // listings coincide.
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(Error::backend_query("zone id enumeration"));
        }
        let zones = self.zones.lock().unwrap();
        Ok(zones.iter().map(|zone| zone.name.clone()).collect())
    }

    fn default_zone_id(&self) -> Result<String, Error> {
        Ok(self.default_zone.lock().unwrap().clone())
    }

    fn open<'b>(
        &'b self,
        zone_id: &str,
    ) -> Result<Box<dyn CalendarContext + 'b>, Error> {
        let zones = self.zones.lock().unwrap();
        let zone = zones
            .iter()
            .find(|zone| zone.name == zone_id)
            .ok_or_else(|| {
                Error::backend_query(format!(
                    "open calendar context for `{zone_id}`"
                ))
            })?;
        Ok(Box::new(TestContext { zone: zone.clone(), at: None }))
    }
}

/// A context over a snapshot of one zone's era table.
#[derive(Debug)]
struct TestContext {
    zone: TestZone,
    at: Option<Instant<Sys>>,
}

impl TestContext {
    /// Returns the index of the era in force at the current instant.
    fn era_index(&self) -> Result<usize, Error> {
        if self.zone.broken {
            return Err(Error::backend_query(format!(
                "query zone `{}`",
                self.zone.name
            )));
        }
        let at = self.at.ok_or_else(|| {
            Error::backend_query("context instant was never set")
        })?;
        // The first era has no begin, so there is always a match.
        Ok(self
            .zone
            .eras
            .iter()
            .rposition(|era| era.begin.map_or(true, |begin| begin <= at))
            .unwrap())
    }
}

impl CalendarContext for TestContext {
    fn set_instant(&mut self, instant: Instant<Sys>) -> Result<(), Error> {
        self.at = Some(instant);
        Ok(())
    }

    fn in_daylight_time(&mut self) -> Result<bool, Error> {
        Ok(!self.zone.eras[self.era_index()?].save.is_zero())
    }

    fn zone_offset(&mut self) -> Result<Offset, Error> {
        let era = &self.zone.eras[self.era_index()?];
        Ok(era.offset - era.save)
    }

    fn daylight_offset(&mut self) -> Result<Offset, Error> {
        Ok(self.zone.eras[self.era_index()?].save)
    }

    fn transition(
        &mut self,
        direction: TransitionDirection,
    ) -> Result<Option<Instant<Sys>>, Error> {
        let index = self.era_index()?;
        Ok(match direction {
            TransitionDirection::PreviousInclusive => {
                self.zone.eras[index].begin
            }
            TransitionDirection::Next => self
                .zone
                .eras
                .get(index + 1)
                .map(|era| era.begin.expect("only the first era lacks a begin")),
        })
    }

    fn display_name(
        &mut self,
        variant: DisplayVariant,
    ) -> Result<String, Error> {
        if self.zone.broken {
            return Err(Error::backend_query(format!(
                "query zone `{}`",
                self.zone.name
            )));
        }
        Ok(match variant {
            DisplayVariant::Standard => self.zone.std_abbrev.clone(),
            DisplayVariant::Daylight => self.zone.dst_abbrev.clone(),
        })
    }
}
