//! Core domain types for gradesync extraction and projection.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CourseRecord
// ---------------------------------------------------------------------------

/// One course the account is enrolled in, scraped from the account page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Source-assigned identifier (trailing path segment of the course link).
    /// Stable across repeated extractions of the same course.
    pub id: String,
    /// Short display name (e.g. "CS 70").
    pub short_name: String,
    /// Full course name; may coincide with `short_name`.
    pub full_name: String,
    /// Absolute URL of the course page.
    pub url: String,
}

// ---------------------------------------------------------------------------
// AssignmentRecord
// ---------------------------------------------------------------------------

/// One gradeable item within a course.
///
/// Assignments belong to a course only by extraction-time association; the
/// (course, assignment) pairing is carried as a tuple during the run, never
/// as a stored back-pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Source-assigned identifier. Unsubmitted assignments may lack one.
    pub id: Option<String>,
    /// Assignment name. Rows without a resolvable name are dropped entirely.
    pub name: String,
    /// Raw due-date text as found in the markup. Absence is a valid terminal
    /// state ("no due date"), not an error.
    pub due_date: Option<String>,
    /// Absolute URL of the assignment, when one can be derived.
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// DueDate
// ---------------------------------------------------------------------------

/// A normalized due date: an absolute timestamp with an optional UTC offset.
///
/// If the source string carried an explicit offset the result keeps it;
/// otherwise the result is a naive local time in the caller's reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueDate {
    /// Offset-bearing timestamp (e.g. from a `datetime="...-0800"` attribute).
    Fixed(DateTime<FixedOffset>),
    /// Naive local time; the source gave no offset.
    Local(NaiveDateTime),
}

impl DueDate {
    /// The wall-clock time, ignoring any offset.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Fixed(dt) => dt.naive_local(),
            Self::Local(dt) => *dt,
        }
    }

    /// RFC 3339-style timestamp for the Google Calendar API.
    /// Offset-less values serialize without a suffix; the request's
    /// `timeZone` label disambiguates them.
    pub fn to_rfc3339(&self) -> String {
        match self {
            Self::Fixed(dt) => dt.to_rfc3339(),
            Self::Local(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// CalendarEvent
// ---------------------------------------------------------------------------

/// A calendar event projected from a (course, assignment) pair with a
/// successfully normalized due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Deterministic identity key: `"{course.id}-{assignment.id}@gradescope-sync"`,
    /// with the literal token `unknown` replacing an absent id. Re-running
    /// extraction on an unchanged assignment reproduces the same uid, which
    /// is what makes remote upserts idempotent.
    pub uid: String,
    /// Event summary: `"{assignment.name} - {course.short_name}"`.
    pub title: String,
    /// Due instant. Events are zero-duration markers: start == end == due.
    pub due: DueDate,
    /// Course full name plus an optional link line.
    pub description: String,
    /// Assignment URL, when known.
    pub url: Option<String>,
}
