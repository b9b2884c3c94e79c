//! Google Calendar REST collaborator.
//!
//! Works from a stored OAuth token (`token.json`, the layout the Google
//! client libraries write), refreshing it through the token endpoint when
//! expired. Idempotency is driven by the projector's stable titles: upsert
//! searches the target calendar by title and updates the match instead of
//! inserting a duplicate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gradesync_shared::{CalendarEvent, GradesyncError, Result};

/// Google Calendar v3 REST endpoint.
const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// OAuth token endpoint used when `token.json` does not name one.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_LEEWAY_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Stored token
// ---------------------------------------------------------------------------

/// Contents of `token.json`, as written by Google's client libraries
/// (the access token is stored under the key `token`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    fn needs_refresh(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= Utc::now() + chrono::Duration::seconds(EXPIRY_LEEWAY_SECS),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

// ---------------------------------------------------------------------------
// API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CalendarList {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: String,
}

/// One page of an events listing.
#[derive(Debug, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<RemoteEvent>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// The slice of a remote event gradesync cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated Google Calendar client.
pub struct GoogleCalendar {
    client: Client,
    api_base: String,
    token_path: PathBuf,
    token: StoredToken,
}

impl GoogleCalendar {
    /// Load the stored token and refresh it when expired, persisting the
    /// refreshed token back to disk.
    pub async fn connect(token_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(token_path)
            .map_err(|e| GradesyncError::io(token_path, e))?;
        let token: StoredToken = serde_json::from_str(&content).map_err(|e| {
            GradesyncError::config(format!("invalid {}: {e}", token_path.display()))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GradesyncError::Network(format!("failed to build HTTP client: {e}")))?;

        let mut gcal = Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token_path: token_path.to_path_buf(),
            token,
        };

        if gcal.token.needs_refresh() {
            gcal.refresh().await?;
        }

        Ok(gcal)
    }

    /// Point the client at a different API base (for tests with mock servers).
    #[cfg(test)]
    fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self.token.refresh_token.clone().ok_or_else(|| {
            GradesyncError::Calendar("access token expired and no refresh token stored".into())
        })?;
        let client_id = self.token.client_id.clone().unwrap_or_default();
        let client_secret = self.token.client_secret.clone().unwrap_or_default();
        let token_uri = self
            .token
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        info!("access token expired, refreshing");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GradesyncError::Calendar(format!("token refresh failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GradesyncError::Calendar(format!(
                "token refresh failed with {status}: {body}"
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| GradesyncError::Calendar(format!("bad token refresh response: {e}")))?;

        self.token.token = refreshed.access_token;
        if refreshed.expires_in > 0 {
            self.token.expiry = Some(Utc::now() + chrono::Duration::seconds(refreshed.expires_in));
        }
        // Google usually omits the refresh token on refresh; keep the old one.
        if let Some(new_refresh) = refreshed.refresh_token {
            self.token.refresh_token = Some(new_refresh);
        }

        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.token)
            .map_err(|e| GradesyncError::Calendar(format!("cannot serialize token: {e}")))?;
        std::fs::write(&self.token_path, json)
            .map_err(|e| GradesyncError::io(&self.token_path, e))
    }

    // -----------------------------------------------------------------------
    // Calendar operations
    // -----------------------------------------------------------------------

    /// Find a calendar's id by its display name.
    pub async fn calendar_id_by_name(&self, name: &str) -> Result<Option<String>> {
        let url = format!("{}/users/me/calendarList", self.api_base);
        let list: CalendarList = self.get_json(&url, &[]).await?;

        Ok(list
            .items
            .into_iter()
            .find(|c| c.summary == name)
            .map(|c| c.id))
    }

    /// Find an existing event by exact title in the given calendar.
    pub async fn find_event(&self, title: &str, calendar_id: &str) -> Result<Option<RemoteEvent>> {
        let url = format!("{}/calendars/{}/events", self.api_base, calendar_id);
        let page: EventsPage = self
            .get_json(
                &url,
                &[("q", title), ("maxResults", "10"), ("singleEvents", "true")],
            )
            .await?;

        Ok(page.items.into_iter().find(|e| e.summary == title))
    }

    /// Create the event, or update it in place when one with the same title
    /// already exists.
    pub async fn upsert_event(
        &self,
        event: &CalendarEvent,
        calendar_id: &str,
        zone_label: &str,
    ) -> Result<UpsertAction> {
        let when = serde_json::json!({
            "dateTime": event.due.to_rfc3339(),
            "timeZone": zone_label,
        });
        let body = serde_json::json!({
            "summary": event.title,
            "description": event.description,
            "start": when.clone(),
            "end": when,
            "reminders": {
                "useDefault": false,
                "overrides": [
                    {"method": "popup", "minutes": 60},
                    {"method": "popup", "minutes": 1440},
                ],
            },
        });

        match self.find_event(&event.title, calendar_id).await? {
            Some(existing) => {
                let url = format!(
                    "{}/calendars/{}/events/{}",
                    self.api_base, calendar_id, existing.id
                );
                let response = self
                    .client
                    .put(&url)
                    .bearer_auth(&self.token.token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| GradesyncError::Calendar(format!("event update failed: {e}")))?;
                check_status(response).await?;

                debug!(title = %event.title, "updated event");
                Ok(UpsertAction::Updated)
            }
            None => {
                let url = format!("{}/calendars/{}/events", self.api_base, calendar_id);
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token.token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| GradesyncError::Calendar(format!("event insert failed: {e}")))?;
                check_status(response).await?;

                debug!(title = %event.title, "created event");
                Ok(UpsertAction::Created)
            }
        }
    }

    /// One page of the calendar's events (for cleanup).
    pub async fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> Result<EventsPage> {
        let url = format!("{}/calendars/{}/events", self.api_base, calendar_id);

        let mut query = vec![("maxResults", "100"), ("singleEvents", "true")];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        self.get_json(&url, &query).await
    }

    /// Delete an event by id.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.api_base, calendar_id, event_id
        );
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| GradesyncError::Calendar(format!("event delete failed: {e}")))?;
        check_status(response).await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|e| GradesyncError::Calendar(format!("{url}: {e}")))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| GradesyncError::Calendar(format!("{url}: bad response: {e}")))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    Err(GradesyncError::Calendar(format!(
        "Google API error {status} at {url}: {body}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradesync_shared::DueDate;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_token(dir: &Path, expiry: DateTime<Utc>, token_uri: Option<&str>) -> PathBuf {
        let token = StoredToken {
            token: "access-123".into(),
            refresh_token: Some("refresh-456".into()),
            token_uri: token_uri.map(str::to_string),
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            expiry: Some(expiry),
        };
        let path = dir.join("token.json");
        std::fs::write(&path, serde_json::to_string_pretty(&token).unwrap()).unwrap();
        path
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gradesync-gcal-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn connected(server: &MockServer, tag: &str) -> GoogleCalendar {
        let dir = temp_dir(tag);
        let token_path = write_token(&dir, Utc::now() + chrono::Duration::hours(1), None);
        GoogleCalendar::connect(&token_path)
            .await
            .unwrap()
            .with_api_base(server.uri())
    }

    fn sample_event() -> CalendarEvent {
        CalendarEvent {
            uid: "871001-4410001@gradescope-sync".into(),
            title: "Homework 1 - COMPSCI 61B".into(),
            due: DueDate::Local(
                chrono::NaiveDate::from_ymd_opt(2026, 2, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            ),
            description: "Course: Data Structures".into(),
            url: None,
        }
    }

    #[tokio::test]
    async fn expired_token_refreshes_and_persists() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-789",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir("refresh");
        let token_uri = format!("{}/token", server.uri());
        let token_path = write_token(
            &dir,
            Utc::now() - chrono::Duration::hours(1),
            Some(&token_uri),
        );

        let gcal = GoogleCalendar::connect(&token_path).await.unwrap();
        assert_eq!(gcal.token.token, "fresh-789");
        // The old refresh token survives a response that omits one.
        assert_eq!(gcal.token.refresh_token.as_deref(), Some("refresh-456"));

        // Refreshed token was written back to disk.
        let on_disk: StoredToken =
            serde_json::from_str(&std::fs::read_to_string(&token_path).unwrap()).unwrap();
        assert_eq!(on_disk.token, "fresh-789");
    }

    #[tokio::test]
    async fn calendar_lookup_matches_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "primary-id", "summary": "student@berkeley.edu", "primary": true},
                    {"id": "berkeley-id", "summary": "Berkeley Calendar"},
                ]
            })))
            .mount(&server)
            .await;

        let gcal = connected(&server, "lookup").await;

        let id = gcal.calendar_id_by_name("Berkeley Calendar").await.unwrap();
        assert_eq!(id.as_deref(), Some("berkeley-id"));

        let missing = gcal.calendar_id_by_name("No Such Calendar").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn upsert_creates_when_no_title_matches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/cal-1/events"))
            .and(query_param("q", "Homework 1 - COMPSCI 61B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/calendars/cal-1/events"))
            .and(body_partial_json(serde_json::json!({
                "summary": "Homework 1 - COMPSCI 61B",
                "start": {"dateTime": "2026-02-01T09:00:00", "timeZone": "America/Los_Angeles"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new-event-id"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gcal = connected(&server, "create").await;
        let action = gcal
            .upsert_event(&sample_event(), "cal-1", "America/Los_Angeles")
            .await
            .unwrap();
        assert_eq!(action, UpsertAction::Created);
    }

    #[tokio::test]
    async fn upsert_updates_the_exact_title_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/cal-1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "close-match", "summary": "Homework 1 - COMPSCI 61B (old)"},
                    {"id": "exact-match", "summary": "Homework 1 - COMPSCI 61B"},
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/calendars/cal-1/events/exact-match"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "exact-match"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gcal = connected(&server, "update").await;
        let action = gcal
            .upsert_event(&sample_event(), "cal-1", "America/Los_Angeles")
            .await
            .unwrap();
        assert_eq!(action, UpsertAction::Updated);
    }

    #[tokio::test]
    async fn listing_pages_through_tokens_and_deletes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "b", "summary": "Lab 2 - CS 70 "}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "a", "summary": "Homework 1 - COMPSCI 61B"}],
                "nextPageToken": "page-2",
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/a"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let gcal = connected(&server, "list").await;

        let first = gcal.list_events("primary", None).await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.next_page_token.as_deref(), Some("page-2"));

        let second = gcal
            .list_events("primary", first.next_page_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.items[0].id, "b");
        assert_eq!(second.next_page_token, None);

        gcal.delete_event("primary", "a").await.unwrap();
    }

    #[tokio::test]
    async fn api_errors_surface_as_calendar_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient scope"))
            .mount(&server)
            .await;

        let gcal = connected(&server, "error").await;
        let err = gcal.calendar_id_by_name("Berkeley Calendar").await.unwrap_err();
        assert!(matches!(err, GradesyncError::Calendar(_)));
        assert!(err.to_string().contains("403"));
    }
}
