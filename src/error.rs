use std::sync::Arc;

use crate::instant::{Instant, Local};

/// An error that can occur in this crate.
///
/// This crate follows the "one error type" pattern: every fallible
/// operation returns this type, and callers that need to react to a
/// specific condition use the `is_*` predicates rather than matching on an
/// exhaustive enum. The distinctions that matter to callers:
///
/// * [`Error::is_backend_unavailable`] - the platform backend could not be
/// bound. This is terminal for the process: the failure is cached and every
/// subsequent call fails the same way without retrying the load.
/// * [`Error::is_backend_query_failed`] - one specific call into the
/// backend failed. Recoverable per call; never retried automatically.
/// * [`Error::is_zone_not_found`] - the caller's zone name did not resolve.
/// * [`Error::is_ambiguous_local_time`] / [`Error::is_nonexistent_local_time`]
/// - strict conversion of a civil time that falls in a DST overlap or gap.
/// These are conditions first ([`crate::tz::LocalInfo`]) and only become
/// errors under [`crate::tz::Disambiguation::Reject`].
/// * [`Error::is_leap_second_read`] - the leap second source reported that
/// new data exists but could not be read. Never conflated with "no leap
/// seconds."
///
/// The `Display` implementation prints the error and its causes, most
/// recent context first, separated by `: `.
#[derive(Clone)]
pub struct Error {
    /// Boxed to keep the error one word; in an `Arc` so that `Error` stays
    /// cheaply cloneable even with a cause chain attached.
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    BackendUnavailable,
    BackendQuery(String),
    ZoneNotFound(String),
    AmbiguousLocalTime(Instant<Local>),
    NonexistentLocalTime(Instant<Local>),
    LeapSecondRead,
    Adhoc(String),
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Error {
        Error { inner: Arc::new(ErrorInner { kind, cause: None }) }
    }

    /// Creates an ad hoc error from a message.
    ///
    /// Use the `err!` macro instead of calling this directly.
    pub(crate) fn adhoc(message: String) -> Error {
        Error::from_kind(ErrorKind::Adhoc(message))
    }

    #[inline(never)]
    #[cold]
    pub(crate) fn backend_unavailable() -> Error {
        Error::from_kind(ErrorKind::BackendUnavailable)
    }

    /// Creates an error for one specific backend call that failed.
    ///
    /// `call` names the capability that failed (e.g. `"open context"`),
    /// possibly with backend specific detail appended.
    #[inline(never)]
    #[cold]
    pub(crate) fn backend_query(call: impl Into<String>) -> Error {
        Error::from_kind(ErrorKind::BackendQuery(call.into()))
    }

    #[inline(never)]
    #[cold]
    pub(crate) fn zone_not_found(name: impl Into<String>) -> Error {
        Error::from_kind(ErrorKind::ZoneNotFound(name.into()))
    }

    #[inline(never)]
    #[cold]
    pub(crate) fn ambiguous_local_time(civil: Instant<Local>) -> Error {
        Error::from_kind(ErrorKind::AmbiguousLocalTime(civil))
    }

    #[inline(never)]
    #[cold]
    pub(crate) fn nonexistent_local_time(civil: Instant<Local>) -> Error {
        Error::from_kind(ErrorKind::NonexistentLocalTime(civil))
    }

    #[inline(never)]
    #[cold]
    pub(crate) fn leap_second_read() -> Error {
        Error::from_kind(ErrorKind::LeapSecondRead)
    }

    /// Attaches this error as the cause of a new ad hoc error with the
    /// given message. The message becomes the outermost context printed by
    /// `Display`.
    pub(crate) fn context(self, message: impl Into<String>) -> Error {
        Error {
            inner: Arc::new(ErrorInner {
                kind: ErrorKind::Adhoc(message.into()),
                cause: Some(self),
            }),
        }
    }

    /// Returns true when the platform backend could not be bound at all.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::BackendUnavailable)
    }

    /// Returns true when one specific backend query failed.
    pub fn is_backend_query_failed(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::BackendQuery(_))
    }

    /// Returns true when a zone name failed to resolve.
    pub fn is_zone_not_found(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::ZoneNotFound(_))
    }

    /// Returns true when a strict conversion hit a DST overlap.
    pub fn is_ambiguous_local_time(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::AmbiguousLocalTime(_))
    }

    /// Returns true when a strict conversion hit a DST gap.
    pub fn is_nonexistent_local_time(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::NonexistentLocalTime(_))
    }

    /// Returns true when leap second data exists but could not be read.
    pub fn is_leap_second_read(&self) -> bool {
        matches!(self.root().inner.kind, ErrorKind::LeapSecondRead)
    }

    /// Returns the root error in this chain.
    fn root(&self) -> &Error {
        let mut err = self;
        while let Some(ref cause) = err.inner.cause {
            err = cause;
        }
        err
    }

    /// Returns a chain of error values, starting with the highest level
    /// context and ending with the root cause. Always non-empty.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = Some(self);
        core::iter::from_fn(move || {
            let this = err?;
            err = this.inner.cause.as_ref();
            Some(this)
        })
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(&err.inner.kind, f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            f.debug_struct("Error")
                .field("kind", &self.inner.kind)
                .field("cause", &self.inner.cause)
                .finish()
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::BackendUnavailable => {
                write!(f, "platform time zone backend is unavailable")
            }
            ErrorKind::BackendQuery(ref call) => {
                write!(f, "time zone backend query failed: {call}")
            }
            ErrorKind::ZoneNotFound(ref name) => {
                write!(f, "failed to find time zone `{name}`")
            }
            ErrorKind::AmbiguousLocalTime(civil) => {
                write!(f, "local time {civil} is ambiguous (clocks were rolled back over it)")
            }
            ErrorKind::NonexistentLocalTime(civil) => {
                write!(f, "local time {civil} is nonexistent (clocks jumped over it)")
            }
            ErrorKind::LeapSecondRead => {
                write!(f, "new leap second data exists but could not be read")
            }
            ErrorKind::Adhoc(ref message) => f.write_str(message),
        }
    }
}

/// A convenience macro for constructing an ad hoc `Error` from a format
/// string.
macro_rules! err {
    ($($tt:tt)*) => {
        crate::error::Error::adhoc(format!($($tt)*))
    }
}

pub(crate) use err;
