/*!
The production backend: the platform's ICU library, bound dynamically.

`icu.dll` ships with Windows (version 1903+) but is not an import library,
so every entry point used here is resolved at runtime with `libloading`.
The resolved function table lives in a process-wide [`Binding`]: the load
runs at most once, and a failed load (old Windows, missing export) is
cached so later calls fail fast instead of hitting the loader again.

ICU traffics in UTF-16 identifiers and floating point milliseconds
(`UDate`). Both conversions happen here and nowhere else; real transition
instants are integral at millisecond resolution, so the `f64 -> i64` cast
on the way out is exact.
*/

use core::ffi::c_char;

use libloading::os::windows::{Library, LOAD_LIBRARY_SEARCH_SYSTEM32};

use crate::{
    backend::{
        Backend, Binding, CalendarContext, DisplayVariant,
        TransitionDirection, ZoneIdScope,
    },
    error::{err, Error},
    instant::{Instant, Sys},
    tz::Offset,
};

type UErrorCode = i32;
type UBool = i8;
type UDate = f64;

/// Opaque ICU handle types.
enum UCalendar {}
enum UEnumeration {}

/// `USystemTimeZoneType`.
const UCAL_ZONE_TYPE_ANY: i32 = 0;
const UCAL_ZONE_TYPE_CANONICAL: i32 = 1;

/// `UCalendarType::UCAL_DEFAULT`.
const UCAL_DEFAULT: i32 = 0;

/// `UCalendarDateFields`.
const UCAL_ZONE_OFFSET: i32 = 15;
const UCAL_DST_OFFSET: i32 = 16;

/// `UTimeZoneTransitionType`.
const UCAL_TZ_TRANSITION_NEXT: i32 = 0;
const UCAL_TZ_TRANSITION_PREVIOUS_INCLUSIVE: i32 = 3;

/// `UCalendarDisplayNameType`.
const UCAL_SHORT_STANDARD: i32 = 1;
const UCAL_SHORT_DST: i32 = 3;

const fn failed(ec: UErrorCode) -> bool {
    // U_FAILURE: anything above U_ZERO_ERROR. Warning codes are negative.
    ec > 0
}

/// The resolved ICU entry points.
///
/// The table is immutable once built and the library handle is kept
/// alongside the pointers so they can never outlive the mapping.
pub(crate) struct IcuFns {
    _library: Library,
    ucal_open_time_zone_id_enumeration: unsafe extern "C" fn(
        i32,
        *const c_char,
        *const i32,
        *mut UErrorCode,
    ) -> *mut UEnumeration,
    uenum_unext: unsafe extern "C" fn(
        *mut UEnumeration,
        *mut i32,
        *mut UErrorCode,
    ) -> *const u16,
    uenum_close: unsafe extern "C" fn(*mut UEnumeration),
    ucal_get_default_time_zone:
        unsafe extern "C" fn(*mut u16, i32, *mut UErrorCode) -> i32,
    ucal_open: unsafe extern "C" fn(
        *const u16,
        i32,
        *const c_char,
        i32,
        *mut UErrorCode,
    ) -> *mut UCalendar,
    ucal_close: unsafe extern "C" fn(*mut UCalendar),
    ucal_set_millis:
        unsafe extern "C" fn(*mut UCalendar, UDate, *mut UErrorCode),
    ucal_in_daylight_time:
        unsafe extern "C" fn(*mut UCalendar, *mut UErrorCode) -> UBool,
    ucal_get:
        unsafe extern "C" fn(*mut UCalendar, i32, *mut UErrorCode) -> i32,
    ucal_get_time_zone_transition_date: unsafe extern "C" fn(
        *mut UCalendar,
        i32,
        *mut UDate,
        *mut UErrorCode,
    ) -> UBool,
    ucal_get_time_zone_display_name: unsafe extern "C" fn(
        *mut UCalendar,
        i32,
        *const c_char,
        *mut u16,
        i32,
        *mut UErrorCode,
    ) -> i32,
}

static ICU: Binding<IcuFns> = Binding::new();

/// Returns the process-wide ICU function table, loading it on first use.
pub(crate) fn acquire() -> Result<&'static IcuFns, Error> {
    ICU.acquire(load)
}

fn load() -> Result<IcuFns, Error> {
    // System32 only, like every other OS binding in the process. A DLL
    // named icu.dll on the library search path must not be picked up.
    let library = unsafe {
        Library::load_with_flags("icu.dll", LOAD_LIBRARY_SEARCH_SYSTEM32)
    }
    .map_err(|e| err!("failed to load icu.dll: {e}"))?;

    macro_rules! resolve {
        ($symbol:literal) => {{
            // SAFETY: the signatures below match the stable ICU C API.
            let symbol = unsafe { library.get(concat!($symbol, "\0").as_bytes()) }
                .map_err(|e| {
                    err!("failed to resolve icu.dll symbol {}: {e}", $symbol)
                })?;
            *symbol
        }};
    }

    Ok(IcuFns {
        ucal_open_time_zone_id_enumeration: resolve!(
            "ucal_openTimeZoneIDEnumeration"
        ),
        uenum_unext: resolve!("uenum_unext"),
        uenum_close: resolve!("uenum_close"),
        ucal_get_default_time_zone: resolve!("ucal_getDefaultTimeZone"),
        ucal_open: resolve!("ucal_open"),
        ucal_close: resolve!("ucal_close"),
        ucal_set_millis: resolve!("ucal_setMillis"),
        ucal_in_daylight_time: resolve!("ucal_inDaylightTime"),
        ucal_get: resolve!("ucal_get"),
        ucal_get_time_zone_transition_date: resolve!(
            "ucal_getTimeZoneTransitionDate"
        ),
        ucal_get_time_zone_display_name: resolve!(
            "ucal_getTimeZoneDisplayName"
        ),
        _library: library,
    })
}

impl core::fmt::Debug for IcuFns {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("IcuFns").finish_non_exhaustive()
    }
}

/// The [`Backend`] implementation backed by the platform's ICU library.
#[derive(Debug)]
pub(crate) struct IcuBackend;

impl Backend for IcuBackend {
    fn enumerate_zone_ids(
        &self,
        scope: ZoneIdScope,
    ) -> Result<Vec<String>, Error> {
        let fns = acquire()?;
        let zone_type = match scope {
            ZoneIdScope::Canonical => UCAL_ZONE_TYPE_CANONICAL,
            ZoneIdScope::All => UCAL_ZONE_TYPE_ANY,
        };
        let mut ec: UErrorCode = 0;
        // SAFETY: null region and null raw-offset filters are documented
        // to mean "no filter".
        let raw = unsafe {
            (fns.ucal_open_time_zone_id_enumeration)(
                zone_type,
                core::ptr::null(),
                core::ptr::null(),
                &mut ec,
            )
        };
        if failed(ec) || raw.is_null() {
            return Err(Error::backend_query(format!(
                "open zone id enumeration (status {ec})"
            )));
        }
        let iter = Enumeration { fns, raw };

        let mut ids = Vec::new();
        loop {
            let mut len: i32 = 0;
            ec = 0;
            // SAFETY: `raw` is a live enumeration handle owned by `iter`.
            let elem =
                unsafe { (fns.uenum_unext)(iter.raw, &mut len, &mut ec) };
            if failed(ec) {
                return Err(Error::backend_query(format!(
                    "advance zone id enumeration (status {ec})"
                )));
            }
            if elem.is_null() {
                break;
            }
            // SAFETY: ICU guarantees `elem` points at `len` UTF-16 units.
            let units =
                unsafe { core::slice::from_raw_parts(elem, len as usize) };
            let id = String::from_utf16(units).map_err(|_| {
                Error::backend_query("zone id is not valid UTF-16")
            })?;
            ids.push(id);
        }
        trace!("enumerated {} zone ids from icu", ids.len());
        Ok(ids)
    }

    fn default_zone_id(&self) -> Result<String, Error> {
        let fns = acquire()?;
        let mut buffer = [0u16; 256];
        let mut ec: UErrorCode = 0;
        // SAFETY: the buffer capacity passed matches the allocation.
        let len = unsafe {
            (fns.ucal_get_default_time_zone)(
                buffer.as_mut_ptr(),
                buffer.len() as i32,
                &mut ec,
            )
        };
        if failed(ec) || len <= 0 || len as usize > buffer.len() {
            return Err(Error::backend_query(format!(
                "resolve default zone id (status {ec})"
            )));
        }
        String::from_utf16(&buffer[..len as usize]).map_err(|_| {
            Error::backend_query("default zone id is not valid UTF-16")
        })
    }

    fn open<'b>(
        &'b self,
        zone_id: &str,
    ) -> Result<Box<dyn CalendarContext + 'b>, Error> {
        let fns = acquire()?;
        let id: Vec<u16> = zone_id.encode_utf16().collect();
        let mut ec: UErrorCode = 0;
        // SAFETY: the id pointer/length pair describes a live buffer; a
        // null locale selects the default locale.
        let cal = unsafe {
            (fns.ucal_open)(
                id.as_ptr(),
                id.len() as i32,
                core::ptr::null(),
                UCAL_DEFAULT,
                &mut ec,
            )
        };
        if failed(ec) || cal.is_null() {
            return Err(Error::backend_query(format!(
                "open calendar context for `{zone_id}` (status {ec})"
            )));
        }
        Ok(Box::new(IcuContext { fns, cal }))
    }
}

/// Owner of a `UEnumeration`, closing it on drop.
struct Enumeration {
    fns: &'static IcuFns,
    raw: *mut UEnumeration,
}

impl Drop for Enumeration {
    fn drop(&mut self) {
        // SAFETY: `raw` came from a successful open and is closed once.
        unsafe { (self.fns.uenum_close)(self.raw) };
    }
}

/// Owner of a `UCalendar`, closing it on drop.
struct IcuContext {
    fns: &'static IcuFns,
    cal: *mut UCalendar,
}

impl IcuContext {
    fn get_field(&mut self, field: i32, what: &str) -> Result<i32, Error> {
        let mut ec: UErrorCode = 0;
        // SAFETY: `cal` is a live calendar handle owned by self.
        let value = unsafe { (self.fns.ucal_get)(self.cal, field, &mut ec) };
        if failed(ec) {
            return Err(Error::backend_query(format!(
                "read {what} (status {ec})"
            )));
        }
        Ok(value)
    }
}

impl CalendarContext for IcuContext {
    fn set_instant(&mut self, instant: Instant<Sys>) -> Result<(), Error> {
        let mut ec: UErrorCode = 0;
        // SAFETY: `cal` is a live calendar handle owned by self.
        unsafe {
            (self.fns.ucal_set_millis)(
                self.cal,
                instant.millisecond() as UDate,
                &mut ec,
            )
        };
        if failed(ec) {
            return Err(Error::backend_query(format!(
                "set instant {instant} (status {ec})"
            )));
        }
        Ok(())
    }

    fn in_daylight_time(&mut self) -> Result<bool, Error> {
        let mut ec: UErrorCode = 0;
        // SAFETY: `cal` is a live calendar handle owned by self.
        let daylight =
            unsafe { (self.fns.ucal_in_daylight_time)(self.cal, &mut ec) };
        if failed(ec) {
            return Err(Error::backend_query(format!(
                "query daylight state (status {ec})"
            )));
        }
        Ok(daylight != 0)
    }

    fn zone_offset(&mut self) -> Result<Offset, Error> {
        let millis = self.get_field(UCAL_ZONE_OFFSET, "zone offset")?;
        Offset::from_seconds(millis / 1000)
            .map_err(|e| Error::backend_query(e.to_string()))
    }

    fn daylight_offset(&mut self) -> Result<Offset, Error> {
        let millis = self.get_field(UCAL_DST_OFFSET, "daylight offset")?;
        Offset::from_seconds(millis / 1000)
            .map_err(|e| Error::backend_query(e.to_string()))
    }

    fn transition(
        &mut self,
        direction: TransitionDirection,
    ) -> Result<Option<Instant<Sys>>, Error> {
        let transition_type = match direction {
            TransitionDirection::PreviousInclusive => {
                UCAL_TZ_TRANSITION_PREVIOUS_INCLUSIVE
            }
            TransitionDirection::Next => UCAL_TZ_TRANSITION_NEXT,
        };
        let mut when: UDate = 0.0;
        let mut ec: UErrorCode = 0;
        // SAFETY: `cal` is a live calendar handle owned by self.
        let found = unsafe {
            (self.fns.ucal_get_time_zone_transition_date)(
                self.cal,
                transition_type,
                &mut when,
                &mut ec,
            )
        };
        if failed(ec) {
            return Err(Error::backend_query(format!(
                "query {direction:?} transition (status {ec})"
            )));
        }
        if found == 0 {
            return Ok(None);
        }
        Ok(Some(Instant::from_millisecond(when as i64)))
    }

    fn display_name(
        &mut self,
        variant: DisplayVariant,
    ) -> Result<String, Error> {
        let name_type = match variant {
            DisplayVariant::Standard => UCAL_SHORT_STANDARD,
            DisplayVariant::Daylight => UCAL_SHORT_DST,
        };
        let mut buffer = [0u16; 256];
        let mut ec: UErrorCode = 0;
        // SAFETY: the buffer capacity passed matches the allocation; a
        // null locale selects the default locale.
        let len = unsafe {
            (self.fns.ucal_get_time_zone_display_name)(
                self.cal,
                name_type,
                core::ptr::null(),
                buffer.as_mut_ptr(),
                buffer.len() as i32,
                &mut ec,
            )
        };
        if failed(ec) || len < 0 || len as usize > buffer.len() {
            return Err(Error::backend_query(format!(
                "render {variant:?} display name (status {ec})"
            )));
        }
        String::from_utf16(&buffer[..len as usize]).map_err(|_| {
            Error::backend_query("display name is not valid UTF-16")
        })
    }
}

impl Drop for IcuContext {
    fn drop(&mut self) {
        // SAFETY: `cal` came from a successful open and is closed once.
        unsafe { (self.fns.ucal_close)(self.cal) };
    }
}
