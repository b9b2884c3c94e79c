//! Course extraction from the Gradescope account page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use gradesync_shared::CourseRecord;

/// Links whose target contains a course identifier path.
static COURSE_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/courses/\d+").expect("valid regex"));

/// Class attribute marking the full-course-name node.
static COURSE_NAME_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"courseBox--name|name").expect("valid regex"));

/// Fallback when a course link carries no heading.
const PLACEHOLDER_COURSE_NAME: &str = "Unknown Course";

/// Extract every course linked from the account page, in document order.
///
/// Pure over an already-parsed tree; unresolvable links are skipped, never an
/// error. `id` is the trailing path segment of the course link and is stable
/// across repeated extractions of the same course.
pub fn extract_courses(doc: &Html, base: &Url) -> Vec<CourseRecord> {
    let anchor_sel = Selector::parse("a[href]").unwrap();
    let heading_sel = Selector::parse("h3, h4").unwrap();
    let div_sel = Selector::parse("div[class]").unwrap();

    let mut courses = Vec::new();

    for link in doc.select(&anchor_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !COURSE_HREF_RE.is_match(href) {
            continue;
        }

        let id = href.rsplit('/').next().unwrap_or_default().to_string();
        let Ok(url) = base.join(href) else {
            continue;
        };

        let short_name = link
            .select(&heading_sel)
            .next()
            .map(element_text)
            .unwrap_or_else(|| PLACEHOLDER_COURSE_NAME.to_string());

        let full_name = link
            .select(&div_sel)
            .find(|el| {
                el.value()
                    .attr("class")
                    .is_some_and(|c| COURSE_NAME_CLASS_RE.is_match(c))
            })
            .map(element_text)
            .unwrap_or_else(|| short_name.clone());

        courses.push(CourseRecord {
            id,
            short_name,
            full_name,
            url: url.to_string(),
        });
    }

    courses
}

/// Collected, trimmed text of an element's descendants.
pub(crate) fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
