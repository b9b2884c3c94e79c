//! End-to-end sync pipeline: login → extract → project → upsert.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local};
use scraper::Html;
use tracing::{info, instrument, warn};
use url::Url;

use gradesync_calendar::project;
use gradesync_client::{GoogleCalendar, Session, UpsertAction};
use gradesync_extract::{extract_assignments, extract_courses};
use gradesync_shared::{
    AppConfig, AssignmentRecord, CourseRecord, Credentials, GradesyncError, Result,
};

/// Calendar id every account has, used when the configured calendar cannot
/// be resolved.
const PRIMARY_CALENDAR: &str = "primary";

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callbacks for long-running pipelines. The CLI renders these with
/// a spinner; tests use [`NullReporter`].
pub trait ProgressReporter {
    /// A new pipeline phase started.
    fn phase(&self, name: &str);

    /// A course's assignment table is about to be fetched.
    fn course_started(&self, short_name: &str, current: usize, total: usize);

    /// The pipeline finished.
    fn done(&self);
}

/// Reporter that swallows all progress (tests, non-interactive runs).
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn phase(&self, _name: &str) {}
    fn course_started(&self, _short_name: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}

// ---------------------------------------------------------------------------
// Sync configuration and report
// ---------------------------------------------------------------------------

/// Configuration for the `sync` pipeline.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Application config (base URL, calendar settings).
    pub app: AppConfig,
    /// Gradescope credentials, read from the environment at the entry point.
    pub credentials: Credentials,
    /// Resolved target calendar name.
    pub calendar_name: String,
    /// Path to the materialized Google OAuth token.
    pub token_path: PathBuf,
}

/// Outcome counts of a `sync` run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Courses found on the account page.
    pub courses: usize,
    /// Assignment rows extracted across all courses.
    pub assignments: usize,
    /// Events newly created in the calendar.
    pub created: usize,
    /// Events updated in place.
    pub updated: usize,
    /// Assignments skipped: no due date, or a date no strategy could parse.
    pub skipped: usize,
    /// Upserts that failed remotely (logged, batch continued).
    pub failed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Sync pipeline
// ---------------------------------------------------------------------------

/// Scrape Gradescope and upsert one calendar event per due assignment.
///
/// Assignments without a normalizable due date are counted as skipped, never
/// errors. A calendar-listing failure degrades to the primary calendar with
/// a warning. Only transport/auth failures abort the run.
#[instrument(skip_all, fields(calendar = %config.calendar_name))]
pub async fn run_sync(config: &SyncConfig, reporter: &dyn ProgressReporter) -> Result<SyncReport> {
    let start = Instant::now();
    let base = parse_base_url(&config.app)?;

    reporter.phase("Logging into Gradescope");
    let session = Session::login(base, &config.credentials).await?;

    reporter.phase("Connecting to Google Calendar");
    let gcal = GoogleCalendar::connect(&config.token_path).await?;

    let calendar_id = match gcal.calendar_id_by_name(&config.calendar_name).await {
        Ok(Some(id)) => {
            info!(name = %config.calendar_name, "using calendar");
            id
        }
        Ok(None) => {
            info!(name = %config.calendar_name, "calendar not found, using primary calendar");
            PRIMARY_CALENDAR.to_string()
        }
        Err(e) => {
            warn!(error = %e, "error listing calendars, using primary calendar");
            PRIMARY_CALENDAR.to_string()
        }
    };

    let by_course = collect_by_course(&session, reporter).await?;

    // Year-less due dates resolve into the current calendar year at
    // normalization time; near a year boundary this can land in the wrong
    // academic year, exactly as the source data leaves it ambiguous.
    let reference_year = Local::now().year();

    reporter.phase("Syncing events");
    let mut report = SyncReport {
        courses: by_course.len(),
        ..SyncReport::default()
    };

    for (course, assignments) in &by_course {
        for assignment in assignments {
            report.assignments += 1;

            let Some(event) = project(course, assignment, reference_year) else {
                info!(assignment = %assignment.name, "skipping - no usable due date");
                report.skipped += 1;
                continue;
            };

            match gcal
                .upsert_event(&event, &calendar_id, &config.app.calendar.timezone)
                .await
            {
                Ok(UpsertAction::Created) => report.created += 1,
                Ok(UpsertAction::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(title = %event.title, error = %e, "event upsert failed");
                    report.failed += 1;
                }
            }
        }
    }

    report.elapsed = start.elapsed();
    reporter.done();

    info!(
        courses = report.courses,
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "sync completed"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Shared extraction step
// ---------------------------------------------------------------------------

/// Fetch the account page and every course page, pairing each course with
/// its extracted assignments. The pairing is a per-run tuple; assignment
/// records never hold a back-pointer to their course.
///
/// Document order is preserved but downstream consumers only aggregate — the
/// produced event *set* does not depend on course order.
pub(crate) async fn collect_by_course(
    session: &Session,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<(CourseRecord, Vec<AssignmentRecord>)>> {
    reporter.phase("Fetching courses");

    let account_page = session.fetch("/account").await?;
    let courses = {
        let doc = Html::parse_document(&account_page);
        extract_courses(&doc, session.base())
    };
    info!(count = courses.len(), "found courses");

    let total = courses.len();
    let mut by_course = Vec::with_capacity(total);

    for (i, course) in courses.into_iter().enumerate() {
        reporter.course_started(&course.short_name, i + 1, total);

        let page = session.fetch(&format!("/courses/{}", course.id)).await?;
        let assignments = {
            let doc = Html::parse_document(&page);
            extract_assignments(&doc, &course.id, session.base())
        };
        info!(
            course = %course.short_name,
            count = assignments.len(),
            "found assignments"
        );

        by_course.push((course, assignments));
    }

    Ok(by_course)
}

pub(crate) fn parse_base_url(app: &AppConfig) -> Result<Url> {
    Url::parse(&app.gradescope.base_url).map_err(|e| {
        GradesyncError::config(format!(
            "invalid base URL '{}': {e}",
            app.gradescope.base_url
        ))
    })
}
