//! Projection of (course, assignment) pairs into calendar events.

use gradesync_dates::normalize;
use gradesync_shared::{AssignmentRecord, CalendarEvent, CourseRecord};

/// Namespace suffix of every generated uid.
const UID_NAMESPACE: &str = "gradescope-sync";

/// The literal token standing in for an absent or empty identifier.
const UNKNOWN_ID: &str = "unknown";

/// Build a calendar event for an assignment, or `None` when the assignment
/// has no due date or its due date cannot be normalized (the caller counts
/// both as "skipped"). Pure and total — no I/O, no panics.
///
/// The uid is a pure function of `course.id` and `assignment.id`, so
/// re-running extraction on an unchanged assignment reproduces the same uid.
pub fn project(
    course: &CourseRecord,
    assignment: &AssignmentRecord,
    reference_year: i32,
) -> Option<CalendarEvent> {
    let raw = assignment.due_date.as_deref()?;
    let due = normalize(raw, reference_year)?;

    let uid = format!(
        "{}-{}@{UID_NAMESPACE}",
        uid_part(Some(course.id.as_str())),
        uid_part(assignment.id.as_deref()),
    );
    let title = format!("{} - {}", assignment.name, course.short_name);

    let mut description = format!("Course: {}", course.full_name);
    if let Some(url) = &assignment.url {
        description.push_str("\nLink: ");
        description.push_str(url);
    }

    Some(CalendarEvent {
        uid,
        title,
        due,
        description,
        url: assignment.url.clone(),
    })
}

fn uid_part(id: Option<&str>) -> &str {
    match id {
        Some(id) if !id.is_empty() => id,
        _ => UNKNOWN_ID,
    }
}
