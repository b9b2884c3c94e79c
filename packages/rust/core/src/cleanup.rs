//! One-time cleanup: remove previously-created assignment events from the
//! personal calendar (from before syncs targeted a dedicated calendar).

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use gradesync_client::GoogleCalendar;
use gradesync_shared::Result;

/// Course codes to look for in event titles.
const COURSE_PATTERNS: &[&str] = &[
    "COMPSCI 61B",
    "CS 70",
    "LS 22",
    "MATH 54",
    "Math 54",
    "ASTRON C10",
    "CS 198",
];

/// Outcome of a cleanup run.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Events inspected across all pages.
    pub scanned: usize,
    /// Events deleted.
    pub deleted: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Page through the primary calendar and delete events that look like synced
/// assignments: a known course code plus the `" - "` title separator.
///
/// Individual delete failures are logged and the pass continues.
#[instrument(skip_all)]
pub async fn run_cleanup(token_path: &Path) -> Result<CleanupReport> {
    let start = Instant::now();
    let gcal = GoogleCalendar::connect(token_path).await?;

    info!("searching for assignment events in primary calendar");

    let mut report = CleanupReport::default();
    let mut page_token: Option<String> = None;

    loop {
        let page = gcal.list_events("primary", page_token.as_deref()).await?;

        for event in page.items {
            report.scanned += 1;
            if !looks_like_assignment_event(&event.summary) {
                continue;
            }

            info!(title = %event.summary, "deleting");
            match gcal.delete_event("primary", &event.id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => warn!(title = %event.summary, error = %e, "delete failed"),
            }
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    report.elapsed = start.elapsed();
    info!(
        scanned = report.scanned,
        deleted = report.deleted,
        "cleanup completed"
    );

    Ok(report)
}

/// A synced assignment title carries a course code and the " - " separator
/// the projector puts between assignment and course name.
fn looks_like_assignment_event(title: &str) -> bool {
    title.contains(" - ") && COURSE_PATTERNS.iter().any(|p| title.contains(p))
}
