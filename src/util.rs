/*!
Small internal utilities, mostly proleptic Gregorian calendar math.

The conversions below are the standard era-based algorithms. They are used
to give [`crate::Instant`] a civil constructor and rendering, and to turn
leap second registry records into instants. They are deliberately `i64`
only: this crate never represents an instant with floating point.
*/

/// Days between 0000-03-01 and 1970-01-01.
const EPOCH_SHIFT: i64 = 719_468;

/// Days in one 400 year Gregorian era.
const DAYS_PER_ERA: i64 = 146_097;

/// Converts a proleptic Gregorian date to days since the Unix epoch.
///
/// `month` is `1..=12` and `day` is `1..=31`; the date is not otherwise
/// validated.
pub(crate) const fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = (if year >= 0 { year } else { year - 399 }) / 400;
    let year_of_era = year - era * 400;
    let shifted_month = if month > 2 { month - 3 } else { month + 9 };
    let day_of_year = (153 * shifted_month + 2) / 5 + day - 1;
    let day_of_era =
        year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * DAYS_PER_ERA + day_of_era - EPOCH_SHIFT
}

/// Converts days since the Unix epoch to a proleptic Gregorian date.
pub(crate) fn civil_from_days(days: i64) -> (i64, i8, i8) {
    let shifted = days + EPOCH_SHIFT;
    let era = (if shifted >= 0 { shifted } else { shifted - (DAYS_PER_ERA - 1) })
        / DAYS_PER_ERA;
    let day_of_era = shifted - era * DAYS_PER_ERA;
    let year_of_era = (day_of_era - day_of_era / 1460 + day_of_era / 36524
        - day_of_era / 146096)
        / 365;
    let year = year_of_era + era * 400;
    let day_of_year =
        day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month =
        if shifted_month < 10 { shifted_month + 3 } else { shifted_month - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year, month as i8, day as i8)
}
