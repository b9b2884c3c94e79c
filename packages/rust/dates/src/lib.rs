//! Due-date normalization: free-form Gradescope date text → absolute timestamp.
//!
//! Gradescope publishes no date-format contract and has been observed to emit
//! at least eight distinct shapes for the same logical field. Normalization is
//! an ordered fallback chain — most specific format first, a permissive
//! pattern match last — so a loose match can never swallow a well-formed
//! absolute date.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use gradesync_shared::DueDate;

/// Formats carrying an explicit UTC offset, e.g. the machine-readable
/// `datetime` attribute `"2026-01-22 12:30:00 -0800"`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Year-bearing formats without an offset. chrono treats a space in the
/// format as "any run of whitespace, including none", so one `%I:%M %p`
/// entry also covers the `11:59PM` spelling.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y at %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y at %I:%M %p",
    "%m/%d/%Y %I:%M %p",
];

/// Year-less formats ("January 24 at 4:00PM"); the caller's reference year
/// is spliced in before parsing.
const YEARLESS_FORMATS: &[&str] = &[
    "%B %d at %I:%M %p",
    "%b %d at %I:%M %p",
    "%B %d %I:%M %p",
];

/// Last-resort pattern: month-name, day, and a 12-hour clock time anywhere
/// in the string.
static LOOSE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\w+)\s+(\d+)\s+at\s+(\d+):(\d+)\s*([AP]M)").expect("valid regex")
});

const MONTHS_FULL: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTHS_ABBR: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Normalize a raw due-date string into an absolute timestamp.
///
/// Returns `None` for empty input (meaning "no due date") and for strings no
/// strategy can interpret ("could not schedule") — never an error. Year-less
/// inputs resolve into `reference_year`, the prevailing calendar year at
/// normalization time; a "December 31 at 11:59PM" parsed in January lands in
/// the wrong academic year, exactly as the source data leaves it ambiguous.
pub fn normalize(raw: &str, reference_year: i32) -> Option<DueDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(DueDate::Fixed(dt));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(DueDate::Local(dt));
        }
    }

    for fmt in YEARLESS_FORMATS {
        let with_year = format!("{reference_year} {raw}");
        let fmt_with_year = format!("%Y {fmt}");
        if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, &fmt_with_year) {
            return Some(DueDate::Local(dt));
        }
    }

    parse_loose(raw, reference_year)
}

/// Permissive extraction of `(month-name, day, hour, minute, am/pm)` from
/// anywhere in the string. Unknown month names and out-of-range components
/// fail the match rather than panic.
fn parse_loose(raw: &str, reference_year: i32) -> Option<DueDate> {
    let caps = LOOSE_DATE_RE.captures(raw)?;

    let month = month_from_name(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;
    let pm = caps[5].eq_ignore_ascii_case("pm");

    // Standard 12-hour clock rules: 12 AM is midnight, 12 PM is noon.
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    let dt = NaiveDate::from_ymd_opt(reference_year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(DueDate::Local(dt))
}

/// Resolve a month name against the full table, then the abbreviated table.
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS_FULL
        .iter()
        .position(|m| *m == lower)
        .or_else(|| MONTHS_ABBR.iter().position(|m| *m == lower))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn empty_and_whitespace_are_no_due_date() {
        assert_eq!(normalize("", 2026), None);
        assert_eq!(normalize("   \n ", 2026), None);
    }

    #[test]
    fn offset_bearing_formats_keep_their_offset() {
        let from_attr = normalize("2026-01-22 12:30:00 -0800", 2026).unwrap();
        let iso = normalize("2026-01-22T12:30:00-0800", 2026).unwrap();

        match (from_attr, iso) {
            (DueDate::Fixed(a), DueDate::Fixed(b)) => {
                assert_eq!(a, b);
                assert_eq!(a.offset().local_minus_utc(), -8 * 3600);
            }
            other => panic!("expected Fixed results, got {other:?}"),
        }
    }

    #[test]
    fn absolute_formats_agree_on_the_instant() {
        // Format-equivalence: every year-bearing shape of the same moment
        // normalizes to the same local timestamp.
        let expected = local(2026, 1, 15, 23, 59);
        for raw in [
            "2026-01-15T23:59:00",
            "Jan 15, 2026 11:59 PM",
            "Jan 15, 2026 at 11:59 PM",
            "January 15, 2026 11:59 PM",
            "January 15, 2026 at 11:59 PM",
            "01/15/2026 11:59 PM",
        ] {
            assert_eq!(
                normalize(raw, 2026).unwrap().naive_local(),
                expected,
                "format mismatch for {raw:?}"
            );
        }
    }

    #[test]
    fn yearless_formats_splice_in_the_reference_year() {
        for raw in [
            "January 24 at 4:00PM",
            "January 24 at 4:00 PM",
            "Jan 24 at 4:00PM",
            "Jan 24 at 4:00 PM",
            "January 24 4:00PM",
            "January 24 4:00 PM",
        ] {
            assert_eq!(
                normalize(raw, 2026),
                Some(DueDate::Local(local(2026, 1, 24, 16, 0))),
                "year splice failed for {raw:?}"
            );
        }

        // A different reference year lands in that year.
        assert_eq!(
            normalize("January 24 at 4:00PM", 2027),
            Some(DueDate::Local(local(2027, 1, 24, 16, 0)))
        );
    }

    #[test]
    fn loose_match_recovers_dates_with_surrounding_text() {
        assert_eq!(
            normalize("Late Due Date: March 3 at 11:59 PM PST", 2026),
            Some(DueDate::Local(local(2026, 3, 3, 23, 59)))
        );
        // Abbreviated month names resolve too.
        assert_eq!(
            normalize("due mar 3 at 9:05 am", 2026),
            Some(DueDate::Local(local(2026, 3, 3, 9, 5)))
        );
    }

    #[test]
    fn loose_match_twelve_hour_conversion() {
        assert_eq!(
            normalize("x January 1 at 12:00 AM", 2026),
            Some(DueDate::Local(local(2026, 1, 1, 0, 0)))
        );
        assert_eq!(
            normalize("x January 1 at 12:30 PM", 2026),
            Some(DueDate::Local(local(2026, 1, 1, 12, 30)))
        );
        assert_eq!(
            normalize("x January 1 at 1:00 PM", 2026),
            Some(DueDate::Local(local(2026, 1, 1, 13, 0)))
        );
    }

    #[test]
    fn unparseable_strings_are_not_errors() {
        assert_eq!(normalize("No due date", 2026), None);
        assert_eq!(normalize("Zorktober 3 at 4:00 PM", 2026), None);
        // Out-of-range day fails the match instead of panicking.
        assert_eq!(normalize("February 31 at 4:00 PM", 2026), None);
    }
}
