//! ICS generation pipeline: login → extract → project → write `.ics`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local};
use tracing::{info, instrument};

use gradesync_calendar::{generate_ics, project};
use gradesync_client::Session;
use gradesync_shared::{AppConfig, Credentials, GradesyncError, Result};

use crate::pipeline::{ProgressReporter, collect_by_course, parse_base_url};

/// Configuration for the `ical` pipeline.
#[derive(Debug, Clone)]
pub struct IcalConfig {
    /// Application config (base URL, zone label).
    pub app: AppConfig,
    /// Gradescope credentials, read from the environment at the entry point.
    pub credentials: Credentials,
    /// Where to write the `.ics` file.
    pub out_path: PathBuf,
}

/// Outcome of an `ical` run.
#[derive(Debug)]
pub struct IcalReport {
    /// Courses found on the account page.
    pub courses: usize,
    /// Assignment rows extracted across all courses.
    pub assignments: usize,
    /// Events written to the calendar file.
    pub events_written: usize,
    /// Assignments skipped: no due date, or a date no strategy could parse.
    pub skipped: usize,
    /// Path of the written file.
    pub out_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Scrape Gradescope and write a subscribable `.ics` file, one zero-duration
/// event per due assignment.
#[instrument(skip_all, fields(out = %config.out_path.display()))]
pub async fn run_ical(config: &IcalConfig, reporter: &dyn ProgressReporter) -> Result<IcalReport> {
    let start = Instant::now();
    let base = parse_base_url(&config.app)?;

    reporter.phase("Logging into Gradescope");
    let session = Session::login(base, &config.credentials).await?;

    let by_course = collect_by_course(&session, reporter).await?;
    let reference_year = Local::now().year();

    reporter.phase("Generating calendar");
    let mut events = Vec::new();
    let mut assignments_total = 0;
    let mut skipped = 0;

    for (course, assignments) in &by_course {
        for assignment in assignments {
            assignments_total += 1;
            match project(course, assignment, reference_year) {
                Some(event) => events.push(event),
                None => {
                    info!(assignment = %assignment.name, "skipping - no usable due date");
                    skipped += 1;
                }
            }
        }
    }

    let ics = generate_ics(&events, &config.app.calendar.timezone);

    if let Some(parent) = config.out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GradesyncError::io(parent, e))?;
        }
    }
    std::fs::write(&config.out_path, &ics)
        .map_err(|e| GradesyncError::io(&config.out_path, e))?;

    let report = IcalReport {
        courses: by_course.len(),
        assignments: assignments_total,
        events_written: events.len(),
        skipped,
        out_path: config.out_path.clone(),
        elapsed: start.elapsed(),
    };
    reporter.done();

    info!(
        events = report.events_written,
        skipped = report.skipped,
        "calendar file written"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::NullReporter;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    async fn mount_page(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Full pipeline against a mocked Gradescope: login, account page with
    /// two courses, one real assignment table, one empty course.
    #[tokio::test]
    async fn ical_pipeline_end_to_end() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/login",
            r#"<form><input name="authenticity_token" value="tok"></form>"#.into(),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("/courses"))
            .mount(&server)
            .await;

        mount_page(&server, "/account", load_fixture("account.html")).await;
        mount_page(&server, "/courses/871001", load_fixture("course.html")).await;
        mount_page(
            &server,
            "/courses/871002",
            "<html><body><table></table></body></html>".into(),
        )
        .await;

        let mut app = AppConfig::default();
        app.gradescope.base_url = server.uri();

        let out_dir = std::env::temp_dir().join(format!("gradesync-ical-{}", std::process::id()));
        let config = IcalConfig {
            app,
            credentials: Credentials {
                email: "student@berkeley.edu".into(),
                password: "hunter2".into(),
            },
            out_path: out_dir.join("gradescope.ics"),
        };

        let report = run_ical(&config, &NullReporter).await.unwrap();

        assert_eq!(report.courses, 2);
        assert_eq!(report.assignments, 3);
        assert_eq!(report.events_written, 2);
        assert_eq!(report.skipped, 1);

        let ics = std::fs::read_to_string(&report.out_path).unwrap();
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        // The offset-bearing due date serializes as a fixed UTC instant.
        assert!(ics.contains("DTSTART:20260201T170000Z"));
        assert!(ics.contains("UID:871001-4410001@gradescope-sync"));
        assert!(ics.contains("SUMMARY:Homework 1 - COMPSCI 61B"));

        let _ = std::fs::remove_dir_all(&out_dir);
    }
}
