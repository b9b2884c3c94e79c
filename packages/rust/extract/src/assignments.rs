//! Assignment extraction from a course page's assignment table.
//!
//! Gradescope renders the same logical fields in several markup shapes
//! depending on submission state. Each field is resolved by an ordered chain
//! of pure extraction strategies, evaluated until one succeeds; a row no
//! strategy can name is dropped, never an error.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use gradesync_shared::AssignmentRecord;

use crate::courses::element_text;

/// Links whose target contains an assignment identifier path.
static ASSIGNMENT_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/assignments/(\d+)").expect("valid regex"));

/// Name/id/href for one row, resolved by the first strategy that succeeds.
struct NameHit {
    name: String,
    id: Option<String>,
    href: Option<String>,
}

/// Name strategies, in priority order: the submission link for assignments
/// that have one, then the submit button's data attributes for assignments
/// without a submission yet.
const NAME_STRATEGIES: &[fn(&ElementRef) -> Option<NameHit>] =
    &[name_from_link, name_from_submit_button];

/// Due-date strategies, in priority order: the machine-readable `datetime`
/// attribute, the hidden due-date column, then any time node labeled "Due at".
const DUE_DATE_STRATEGIES: &[fn(&ElementRef) -> Option<String>] =
    &[due_from_time_element, due_from_hidden_column, due_from_aria_label];

/// Extract every assignment row of a course page, in document order.
///
/// Header rows are skipped. A row without a resolvable name is absent from
/// the output; a row without a resolvable due date keeps `due_date: None`
/// ("no due date" is a valid terminal state).
pub fn extract_assignments(doc: &Html, course_id: &str, base: &Url) -> Vec<AssignmentRecord> {
    let row_sel = Selector::parse(r#"tr[role="row"]"#).unwrap();
    let header_sel = Selector::parse(r#"[role="columnheader"]"#).unwrap();

    let mut assignments = Vec::new();

    for row in doc.select(&row_sel) {
        if row.select(&header_sel).next().is_some() {
            continue;
        }

        let Some(hit) = NAME_STRATEGIES.iter().find_map(|strategy| strategy(&row)) else {
            continue;
        };

        let due_date = DUE_DATE_STRATEGIES.iter().find_map(|strategy| strategy(&row));
        let url = resolve_url(&hit, course_id, base);

        assignments.push(AssignmentRecord {
            id: hit.id,
            name: hit.name,
            due_date,
            url,
        });
    }

    assignments
}

// ---------------------------------------------------------------------------
// Name strategies
// ---------------------------------------------------------------------------

fn name_from_link(row: &ElementRef) -> Option<NameHit> {
    let anchor_sel = Selector::parse("a[href]").unwrap();

    row.select(&anchor_sel).find_map(|link| {
        let href = link.value().attr("href")?;
        let caps = ASSIGNMENT_HREF_RE.captures(href)?;
        let name = element_text(link);
        if name.is_empty() {
            return None;
        }
        Some(NameHit {
            name,
            id: Some(caps[1].to_string()),
            href: Some(href.to_string()),
        })
    })
}

fn name_from_submit_button(row: &ElementRef) -> Option<NameHit> {
    let button_sel = Selector::parse("button[data-assignment-title]").unwrap();
    let button = row.select(&button_sel).next()?;

    let name = button.value().attr("data-assignment-title")?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(NameHit {
        name,
        id: button
            .value()
            .attr("data-assignment-id")
            .map(str::to_string),
        href: None,
    })
}

// ---------------------------------------------------------------------------
// Due-date strategies
// ---------------------------------------------------------------------------

fn due_from_time_element(row: &ElementRef) -> Option<String> {
    let due_sel = Selector::parse("time.submissionTimeChart--dueDate").unwrap();
    let el = row.select(&due_sel).next()?;
    el.value()
        .attr("datetime")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn due_from_hidden_column(row: &ElementRef) -> Option<String> {
    let cell_sel = Selector::parse("td.hidden-column").unwrap();
    let cells: Vec<_> = row.select(&cell_sel).collect();

    // The first hidden column is the release date, the second the due date.
    let text = element_text(*cells.get(1)?);
    (!text.is_empty()).then_some(text)
}

fn due_from_aria_label(row: &ElementRef) -> Option<String> {
    let time_sel = Selector::parse("time").unwrap();

    row.select(&time_sel).find_map(|el| {
        let label = el.value().attr("aria-label").unwrap_or_default();
        if !label.contains("Due at") {
            return None;
        }
        el.value()
            .attr("datetime")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let text = element_text(el);
                (!text.is_empty()).then_some(text)
            })
    })
}

// ---------------------------------------------------------------------------
// URL resolution
// ---------------------------------------------------------------------------

fn resolve_url(hit: &NameHit, course_id: &str, base: &Url) -> Option<String> {
    if let Some(href) = &hit.href {
        return base.join(href).ok().map(|u| u.to_string());
    }
    let id = hit.id.as_ref()?;
    base.join(&format!("/courses/{course_id}/assignments/{id}"))
        .ok()
        .map(|u| u.to_string())
}
