/*!
Leap second records and the source they are fetched from.

Snapshots carry the platform's leap second table so that consumers
observing a snapshot see a consistent pairing of zone rules and leap
data. The table itself is opaque ordered data to this crate: it is
stored and exposed, not used for arithmetic.
*/

use crate::{
    error::Error,
    instant::{Instant, Sys},
};

/// The byte length of one leap second record in the platform's registry
/// format: six little-endian `u16` fields.
const RECORD_LEN: usize = 12;

/// A single leap second entry.
///
/// The fields mirror the platform record layout: the civil UTC date and
/// hour at whose end the leap second is applied, and whether the second is
/// inserted (positive) or removed (negative).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LeapSecond {
    /// The civil year of the leap second.
    pub year: i16,
    /// The civil month of the leap second, `1..=12`.
    pub month: i8,
    /// The civil day of the leap second.
    pub day: i8,
    /// The civil UTC hour at whose end the leap second is applied.
    pub hour: i8,
    /// True when a second is removed rather than inserted.
    pub negative: bool,
}

impl LeapSecond {
    /// Returns the start of the hour whose final second is this leap
    /// second. Used only for ordering entries.
    pub fn instant(&self) -> Instant<Sys> {
        Instant::from_datetime(
            self.year, self.month, self.day, self.hour, 0, 0,
        )
    }
}

impl PartialOrd for LeapSecond {
    fn partial_cmp(&self, rhs: &LeapSecond) -> Option<core::cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}

impl Ord for LeapSecond {
    fn cmp(&self, rhs: &LeapSecond) -> core::cmp::Ordering {
        self.instant().cmp(&rhs.instant())
    }
}

/// The outcome of asking a [`LeapSecondSource`] for new data.
#[derive(Clone, Debug)]
pub enum LeapFetch {
    /// The source has no entries beyond the `known_count` the caller
    /// already holds. This includes the platform having no leap second
    /// data at all.
    UpToDate,
    /// The source's full current table, strictly longer than
    /// `known_count`. Not guaranteed to be sorted.
    Refreshed(Vec<LeapSecond>),
}

/// Where leap second records come from.
///
/// The contract deliberately has three outcomes: up to date, refreshed,
/// and *failed to read data that exists*. The last one is an error
/// ([`Error::is_leap_second_read`]) and must never be collapsed into "zero
/// leap seconds" — a snapshot build that hits it is aborted.
pub trait LeapSecondSource: Send + Sync + core::fmt::Debug {
    /// Fetches the current table if it holds more than `known_count`
    /// entries.
    fn fetch(&self, known_count: usize) -> Result<LeapFetch, Error>;
}

/// Parses the platform's packed registry records.
///
/// A trailing partial record is ignored, matching the integer division the
/// platform itself performs on the value's byte size.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn parse_records(bytes: &[u8]) -> Vec<LeapSecond> {
    let mut entries = Vec::with_capacity(bytes.len() / RECORD_LEN);
    for record in bytes.chunks_exact(RECORD_LEN) {
        let field = |i: usize| {
            u16::from_le_bytes([record[2 * i], record[2 * i + 1]])
        };
        entries.push(LeapSecond {
            year: field(0) as i16,
            month: field(1) as i8,
            day: field(2) as i8,
            hour: field(3) as i8,
            negative: field(4) != 0,
        });
    }
    entries
}

/// Returns the platform leap second source.
pub(crate) fn platform_source(
) -> std::sync::Arc<dyn LeapSecondSource> {
    #[cfg(windows)]
    {
        std::sync::Arc::new(registry::RegistryLeapSource)
    }
    #[cfg(not(windows))]
    {
        // No platform source on this target; snapshots carry an empty
        // table.
        std::sync::Arc::new(NoLeapData)
    }
}

#[cfg(not(windows))]
#[derive(Debug)]
struct NoLeapData;

#[cfg(not(windows))]
impl LeapSecondSource for NoLeapData {
    fn fetch(&self, _known_count: usize) -> Result<LeapFetch, Error> {
        Ok(LeapFetch::UpToDate)
    }
}

#[cfg(windows)]
pub(crate) mod registry {
    use core::ptr;

    use windows_sys::Win32::{
        Foundation::{ERROR_MORE_DATA, ERROR_SUCCESS},
        System::Registry::{
            RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY,
            HKEY_LOCAL_MACHINE, KEY_READ,
        },
    };

    use super::{LeapFetch, LeapSecondSource, RECORD_LEN};
    use crate::error::Error;

    const KEY_NAME: &str =
        "SYSTEM\\CurrentControlSet\\Control\\LeapSecondInformation";
    const VALUE_NAME: &str = "LeapSeconds";

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(core::iter::once(0)).collect()
    }

    /// Reads leap second records from the platform registry.
    #[derive(Debug)]
    pub(crate) struct RegistryLeapSource;

    impl LeapSecondSource for RegistryLeapSource {
        fn fetch(&self, known_count: usize) -> Result<LeapFetch, Error> {
            let mut key: HKEY = ptr::null_mut();
            // SAFETY: the key name is a valid NUL-terminated wide string
            // and the out pointer is live.
            let status = unsafe {
                RegOpenKeyExW(
                    HKEY_LOCAL_MACHINE,
                    wide(KEY_NAME).as_ptr(),
                    0,
                    KEY_READ,
                    &mut key,
                )
            };
            if status != ERROR_SUCCESS {
                // The key does not exist on older systems. Equivalent to
                // the key existing with no data.
                debug!("no leap second registry key (status {status})");
                return Ok(LeapFetch::UpToDate);
            }
            let key = KeyGuard(key);

            let value_name = wide(VALUE_NAME);
            let mut byte_size: u32 = 0;
            // SAFETY: null data with a live size pointer queries the
            // value's size only.
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    value_name.as_ptr(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    &mut byte_size,
                )
            };
            let count = byte_size as usize / RECORD_LEN;
            if (status != ERROR_SUCCESS && status != ERROR_MORE_DATA)
                || count <= known_count
            {
                return Ok(LeapFetch::UpToDate);
            }

            let mut data = vec![0u8; byte_size as usize];
            // SAFETY: the data pointer and size describe a live buffer.
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    value_name.as_ptr(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    data.as_mut_ptr(),
                    &mut byte_size,
                )
            };
            if status != ERROR_SUCCESS {
                // Data exists (we just sized it) but reading it failed.
                // This must surface as its own condition, never as "no
                // leap seconds."
                return Err(Error::leap_second_read());
            }
            data.truncate(byte_size as usize);
            Ok(LeapFetch::Refreshed(super::parse_records(&data)))
        }
    }

    struct KeyGuard(HKEY);

    impl Drop for KeyGuard {
        fn drop(&mut self) {
            // SAFETY: the key was successfully opened and is closed once.
            unsafe { RegCloseKey(self.0) };
        }
    }
}
