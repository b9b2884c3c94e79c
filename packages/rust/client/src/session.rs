//! Authenticated Gradescope session.
//!
//! Gradescope has no API; login is the HTML form flow — fetch the login page,
//! lift the CSRF token out of it, post the form, keep the session cookie.
//! Only transport and auth failures are errors here; page *content* problems
//! belong to the extractor, which degrades per-row.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use gradesync_shared::{Credentials, GradesyncError, Result};

/// User-Agent string for Gradescope requests.
const USER_AGENT: &str = concat!("gradesync/", env!("CARGO_PKG_VERSION"));

/// Marker Gradescope renders on a rejected login.
const INVALID_LOGIN_MARKER: &str = "Invalid email/password combination";

/// An authenticated Gradescope session.
///
/// The narrow interface the core depends on: [`Session::fetch`] returns page
/// text for a path; parsing is the caller's concern.
#[derive(Debug)]
pub struct Session {
    client: Client,
    base: Url,
}

impl Session {
    /// Log into Gradescope, retaining the session cookie.
    ///
    /// Fatal failures: a login page without an `authenticity_token` input
    /// (unrecoverable precondition), rejected credentials, or a post-login
    /// response that is neither the account page nor course-bearing.
    pub async fn login(base: Url, credentials: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GradesyncError::Network(format!("failed to build HTTP client: {e}")))?;

        let session = Self { client, base };

        let login_url = session.join("/login")?;
        let login_page = session.get_text(login_url.clone()).await?;

        let csrf_token = {
            let doc = Html::parse_document(&login_page);
            extract_csrf_token(&doc)
        }
        .ok_or_else(|| GradesyncError::auth("could not find CSRF token on login page"))?;

        debug!(email = %credentials.email, "posting login form");

        let form = [
            ("authenticity_token", csrf_token.as_str()),
            ("session[email]", credentials.email.as_str()),
            ("session[password]", credentials.password.as_str()),
            ("session[remember_me]", "0"),
            ("commit", "Log In"),
            ("session[remember_me_sso]", "0"),
        ];

        let response = session
            .client
            .post(login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GradesyncError::Network(format!("login request failed: {e}")))?;

        let landed = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| GradesyncError::Network(format!("login response read failed: {e}")))?;

        if body.contains(INVALID_LOGIN_MARKER) {
            return Err(GradesyncError::auth("invalid email/password combination"));
        }
        if !landed.path().contains("/account") && !body.contains("/courses") {
            return Err(GradesyncError::auth("login failed - unexpected redirect"));
        }

        info!(email = %credentials.email, "logged into Gradescope");
        Ok(session)
    }

    /// Fetch a page relative to the base URL, returning its text.
    pub async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.join(path)?;
        self.get_text(url).await
    }

    /// The base URL this session talks to.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| GradesyncError::Network(format!("invalid path '{path}': {e}")))
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| GradesyncError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GradesyncError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| GradesyncError::Network(format!("{url}: body read failed: {e}")))
    }
}

/// Pull the CSRF token out of the login form.
fn extract_csrf_token(doc: &Html) -> Option<String> {
    let input_sel = Selector::parse(r#"input[name="authenticity_token"]"#).unwrap();
    doc.select(&input_sel)
        .next()?
        .value()
        .attr("value")
        .map(str::to_string)
}
