//! ICS file generation.

use chrono::Utc;
use icalendar::{Calendar, CalendarDateTime, Component, EventLike, Property};

use gradesync_shared::{CalendarEvent, DueDate};

/// Product identifier stamped on every generated calendar.
const PRODID: &str = "-//Gradescope Calendar Sync//EN";

/// Display name of the generated calendar.
const CALENDAR_NAME: &str = "Gradescope Assignments";

/// Generate `.ics` content with one VEVENT per calendar event.
///
/// `zone_label` is attached as X-WR-TIMEZONE verbatim; it is an opaque label,
/// never resolved against a timezone database.
pub fn generate_ics(events: &[CalendarEvent], zone_label: &str) -> String {
    let mut cal = Calendar::new();
    cal.name(CALENDAR_NAME);
    cal.timezone(zone_label);
    cal.append_property(Property::new("METHOD", "PUBLISH"));

    for event in events {
        cal.push(to_vevent(event));
    }

    set_prodid(&cal.done().to_string())
}

fn to_vevent(event: &CalendarEvent) -> icalendar::Event {
    let mut vevent = icalendar::Event::new();
    vevent.uid(&event.uid);
    vevent.summary(&event.title);

    // DTSTAMP - required by RFC 5545; records when this serialization ran.
    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    vevent.add_property("DTSTAMP", dtstamp.as_str());

    // The due instant is both start and end: a zero-duration marker, not an
    // interval. A bare UTC offset has no TZID to name, so offset-bearing
    // dues serialize as the same instant in UTC; naive dues stay floating.
    match event.due {
        DueDate::Fixed(dt) => {
            let utc = dt.with_timezone(&Utc);
            vevent.starts(utc);
            vevent.ends(utc);
        }
        DueDate::Local(dt) => {
            vevent.starts(CalendarDateTime::Floating(dt));
            vevent.ends(CalendarDateTime::Floating(dt));
        }
    }

    vevent.description(&event.description);

    if let Some(url) = &event.url {
        vevent.add_property("URL", url.as_str());
    }

    vevent.done()
}

/// Replace the icalendar crate's hardcoded PRODID with ours.
fn set_prodid(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }
    result
}
