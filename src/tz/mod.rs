/*!
Time zone handles and the queries they answer.

A [`TimeZone`] is a cheap-to-clone handle to one zone in a
[`crate::TzdbSnapshot`]. It answers the two core queries:

* [`TimeZone::sys_info`]: which rule is in force at an absolute instant,
and over which interval.
* [`TimeZone::local_info`]: which rule(s) a civil clock reading could
belong to, classifying DST gaps and overlaps.

[`TimeZone::to_sys`] and [`TimeZone::to_local`] are the conversions built
on those queries, with [`Disambiguation`] selecting how gaps and overlaps
resolve.
*/

pub use self::{
    offset::{Dst, Offset},
    timezone::{Disambiguation, LocalInfo, SysInfo, TimeZone},
};

mod offset;
mod timezone;
