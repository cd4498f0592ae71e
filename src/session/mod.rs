// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Portal session handling.
//!
//! [`PortalSession`] owns the credentials, the HTTP client with its cookie
//! jar, and the login rate gate. Everything above it (discovery, devices)
//! talks to the portal through this module's request primitives, which
//! apply the same cookie mending and failure classification to every call.
//!
//! The portal throttles accounts that fail authentication repeatedly, so
//! after three consecutive failures the session refuses further login and
//! refresh attempts locally until a ten-minute window has passed.
//!
//! # Examples
//!
//! ```no_run
//! use comfortr_lib::session::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> comfortr_lib::Result<()> {
//!     let session = SessionBuilder::new("user@example.com", "hunter2").build()?;
//!     session.login().await?;
//!     session.logoff().await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::command::{ControlScreenChanges, HumidityEquipment};
use crate::data::{HumidifierData, LiveData, MenuData};
use crate::error::{Error, Result};
use crate::types::DeviceId;

mod cookie;

/// Consecutive auth failures tolerated before the rate gate closes.
const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// How long the rate gate stays closed once tripped.
const MIN_LOGIN_WAIT_MINUTES: i64 = 10;

/// Seed for the cache-busting `_` query parameter on live-data polls.
const POLL_SEQUENCE_SEED: u64 = 1_700_000_000_000;

/// Number of location-list pages the portal serves.
const LOCATION_PAGE_COUNT: u32 = 4;

/// `timeOffset` form value the portal expects on login.
const LOGIN_TIME_OFFSET: &str = "480";

// ============================================================================
// SessionBuilder
// ============================================================================

/// Configuration for a [`PortalSession`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use comfortr_lib::session::SessionBuilder;
///
/// let builder = SessionBuilder::new("user@example.com", "hunter2")
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(builder.base_url(), SessionBuilder::DEFAULT_BASE_URL);
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    username: String,
    password: String,
    base_url: String,
    timeout: Duration,
}

impl SessionBuilder {
    /// The production portal.
    pub const DEFAULT_BASE_URL: &'static str = "https://www.mytotalconnectcomfort.com";
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a builder with the given portal account credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the portal base URL. Trailing slashes are stripped.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the portal base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the session.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the HTTP client cannot be created.
    pub fn build(self) -> Result<PortalSession> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let http = Client::builder()
            .timeout(self.timeout)
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .build()?;

        Ok(PortalSession {
            http,
            jar,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            gate: Mutex::new(LoginGate {
                consecutive_failures: 0,
                next_login: Utc::now(),
            }),
            poll_sequence: AtomicU64::new(POLL_SEQUENCE_SEED),
        })
    }
}

// ============================================================================
// PortalSession
// ============================================================================

/// Login rate-gate state. Failure counting and the earliest next login
/// share one lock so they always move together.
#[derive(Debug, Clone, Copy)]
struct LoginGate {
    consecutive_failures: u32,
    next_login: DateTime<Utc>,
}

/// An authenticated session against the vendor portal.
///
/// The session is cheap to share behind an [`Arc`]; all methods take
/// `&self`. Headers are assembled per request, the cookie jar is
/// internally synchronized, and the rate gate sits behind its own mutex,
/// so concurrent calls from multiple devices are safe.
pub struct PortalSession {
    http: Client,
    jar: Arc<Jar>,
    base_url: String,
    username: String,
    password: String,
    gate: Mutex<LoginGate>,
    poll_sequence: AtomicU64,
}

impl fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalSession")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl PortalSession {
    /// Returns the portal base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Earliest instant at which the next login attempt is allowed.
    #[must_use]
    pub fn next_login(&self) -> DateTime<Utc> {
        self.gate.lock().next_login
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Authenticates against the portal.
    ///
    /// Posts the credentials, then confirms the session with a second
    /// request and inspects the cookie the portal hands back; the portal
    /// answers a bad password with 200 plus an empty cookie often enough
    /// that the confirmation is not optional.
    ///
    /// # Errors
    ///
    /// [`Error::RateLimited`] before any network call when the gate is
    /// closed; [`Error::Auth`] when the portal rejects the credentials or
    /// returns an empty session cookie.
    pub async fn login(&self) -> Result<()> {
        self.check_rate_gate()?;

        let url = format!("{}/portal?{}", self.base_url, self.login_query());
        tracing::debug!(username = %self.username, "logging in to portal");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?;
        self.mend_cookies(&response);

        if response.status() != StatusCode::OK {
            self.record_auth_failure();
            tracing::error!(status = %response.status(), "login request rejected");
            return Err(Error::Auth(format!("login as {} failed", self.username)));
        }

        // A 200 on the credential post proves nothing by itself.
        let confirm_url = format!("{}/portal", self.base_url);
        let response = self
            .http
            .get(&confirm_url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        self.mend_cookies(&response);

        // An emptied session cookie is a rejection no matter which status
        // accompanies it.
        let empty_cookie = cookie::auth_cookie_value(response.headers())
            .is_some_and(|value| value.is_empty());
        if empty_cookie {
            self.record_auth_failure();
            tracing::error!(status = %response.status(), "portal returned an empty session cookie");
            return Err(Error::Auth(format!("login as {} failed", self.username)));
        }

        match response.status() {
            StatusCode::OK => {
                self.reset_auth_failures();
                tracing::debug!("login confirmed");
                Ok(())
            }
            StatusCode::UNAUTHORIZED => {
                self.record_auth_failure();
                Err(Error::Auth(format!("login as {} failed", self.username)))
            }
            status => Err(Error::ServiceUnavailable(format!(
                "HTTP {status} confirming login"
            ))),
        }
    }

    /// Ends the portal session.
    ///
    /// Best effort: the response status is not inspected.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the request cannot be sent.
    pub async fn logoff(&self) -> Result<()> {
        let url = format!("{}/portal/Account/LogOff", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        self.mend_cookies(&response);
        tracing::debug!(status = %response.status(), "logged off");
        Ok(())
    }

    /// Touches the portal root to keep an idle session alive.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] when the session has expired;
    /// [`Error::ServiceUnavailable`] when the portal is down or bounced
    /// the request to the login page.
    pub async fn keepalive(&self) -> Result<()> {
        let url = format!("{}/portal", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        self.mend_cookies(&response);

        let status = response.status();
        let redirected = response.url().as_str() != url;
        if status == StatusCode::OK && !redirected {
            self.reset_auth_failures();
            tracing::debug!("session keepalive ok");
            return Ok(());
        }
        Err(Self::classify_failure(status, redirected, "/portal"))
    }

    // ------------------------------------------------------------------
    // Request primitives
    // ------------------------------------------------------------------

    pub(crate) async fn get_json(&self, path: &str) -> Result<Value> {
        self.request_json(Method::GET, path, None).await
    }

    pub(crate) async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.request_json(Method::POST, path, body).await
    }

    /// Sends one authenticated request and classifies the outcome.
    ///
    /// A 200 with a JSON (or octet-stream, another portal quirk) body is
    /// success and resets the auth failure counter. 401/403 mean the
    /// session key expired. 5xx and redirected responses mean the portal
    /// is unavailable. Everything else is unexpected.
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(method = %method, path, "portal request");

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.mend_cookies(&response);

        let status = response.status();
        let redirected = response.url().as_str() != url;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        if status == StatusCode::OK
            && (content_type.starts_with("application/json")
                || content_type.starts_with("application/octet-stream"))
        {
            self.reset_auth_failures();
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes).map_err(|err| {
                tracing::error!(path, error = %err, "undecodable portal response body");
                Error::UnexpectedResponse {
                    status: status.as_u16(),
                    path: report_path(path),
                }
            });
        }

        tracing::debug!(status = %status, redirected, path, "portal request failed");
        Err(Self::classify_failure(status, redirected, path))
    }

    fn classify_failure(status: StatusCode, redirected: bool, path: &str) -> Error {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Error::Unauthorized {
                status: status.as_u16(),
            };
        }
        if matches!(status.as_u16(), 500 | 502 | 503) {
            return Error::ServiceUnavailable(format!("HTTP {status}"));
        }
        if redirected {
            return Error::ServiceUnavailable(format!("redirected away from {}", report_path(path)));
        }
        Error::UnexpectedResponse {
            status: status.as_u16(),
            path: report_path(path),
        }
    }

    // ------------------------------------------------------------------
    // Portal endpoints
    // ------------------------------------------------------------------

    /// Fetches all location-list pages and concatenates their entries.
    ///
    /// The portal serves a fixed set of pages and answers the unused ones
    /// with non-JSON filler; those are skipped, not errors.
    ///
    /// # Errors
    ///
    /// Propagates authentication and availability failures from any page.
    pub async fn get_location_list(&self) -> Result<Vec<Value>> {
        let mut entries = Vec::new();
        for page in 1..=LOCATION_PAGE_COUNT {
            let path = format!("/portal/Location/GetLocationListData/?page={page}&filter=");
            match self.post_json(&path, None).await {
                Ok(Value::Array(page_entries)) => entries.extend(page_entries),
                Ok(_) => tracing::debug!(page, "location page carried no list"),
                Err(Error::UnexpectedResponse { status: 200, .. }) => {
                    tracing::debug!(page, "skipping non-JSON location page");
                }
                Err(err) => return Err(err),
            }
        }
        tracing::debug!(count = entries.len(), "fetched location list");
        Ok(entries)
    }

    /// Fetches a device's live data.
    ///
    /// Subject to the same rate gate as [`login`](Self::login): polling a
    /// dead session would only extend the portal's throttle.
    ///
    /// # Errors
    ///
    /// [`Error::RateLimited`] when the gate is closed; [`Error::Api`] when
    /// the payload does not carry the expected blocks.
    pub async fn get_thermostat_data(&self, device_id: &DeviceId) -> Result<LiveData> {
        self.check_rate_gate()?;
        let sequence = self.next_poll_sequence();
        let path = format!("/portal/Device/CheckDataSession/{device_id}?_={sequence}");
        let value = self.get_json(&path).await?;
        serde_json::from_value(value)
            .map_err(|err| Error::Api(format!("malformed live data for device {device_id}: {err}")))
    }

    /// Fetches a device's extended menu block.
    ///
    /// # Errors
    ///
    /// Propagates request failures; [`Error::Api`] on a malformed payload.
    pub async fn get_menu_data(&self, device_id: &DeviceId) -> Result<MenuData> {
        let path = format!("/portal/Device/Menu/GetData?deviceID={device_id}");
        let value = self.post_json(&path, None).await?;
        serde_json::from_value(value)
            .map_err(|err| Error::Api(format!("malformed menu data for device {device_id}: {err}")))
    }

    /// Submits a thermostat change set.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal does not acknowledge the changes
    /// with `success: 1`; a missing acknowledgement counts as rejection.
    pub async fn submit_control_changes(&self, changes: &ControlScreenChanges) -> Result<()> {
        let body = serde_json::to_value(changes)
            .map_err(|err| Error::Api(format!("unserializable change set: {err}")))?;
        let response = self
            .post_json("/portal/Device/SubmitControlScreenChanges", Some(body))
            .await?;
        if !submission_accepted(&response) {
            tracing::error!(device_id = %changes.device_id(), "portal rejected thermostat settings");
            return Err(Error::Api("API rejected thermostat settings".to_string()));
        }
        Ok(())
    }

    /// Submits a humidifier or dehumidifier state.
    ///
    /// The portal expects the full sub-object every time, so `state` is
    /// sent whole with the device id added.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the portal does not acknowledge the changes.
    pub async fn submit_menu_changes(
        &self,
        device_id: &DeviceId,
        equipment: HumidityEquipment,
        state: &HumidifierData,
    ) -> Result<()> {
        let path = format!("/portal/Device/Menu/{}", equipment.endpoint_segment());
        let mut body = serde_json::to_value(state)
            .map_err(|err| Error::Api(format!("unserializable {} state: {err}", equipment.label())))?;
        if let Value::Object(map) = &mut body {
            map.insert(
                "DeviceID".to_string(),
                Value::String(device_id.to_string()),
            );
        }
        let response = self.post_json(&path, Some(body)).await?;
        if !submission_accepted(&response) {
            tracing::error!(device_id = %device_id, equipment = equipment.label(), "portal rejected settings");
            return Err(Error::Api(format!(
                "API rejected {} settings",
                equipment.label()
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rate gate and bookkeeping
    // ------------------------------------------------------------------

    /// Fails with [`Error::RateLimited`] while the gate is closed.
    pub(crate) fn check_rate_gate(&self) -> Result<()> {
        let gate = self.gate.lock();
        if Utc::now() < gate.next_login {
            return Err(Error::RateLimited {
                until: gate.next_login,
            });
        }
        Ok(())
    }

    fn record_auth_failure(&self) {
        let mut gate = self.gate.lock();
        gate.consecutive_failures += 1;
        if gate.consecutive_failures >= MAX_LOGIN_ATTEMPTS {
            let delayed = Utc::now() + chrono::Duration::minutes(MIN_LOGIN_WAIT_MINUTES);
            // The gate never reopens earlier than already promised.
            gate.next_login = gate.next_login.max(delayed);
            tracing::warn!(
                failures = gate.consecutive_failures,
                until = %gate.next_login,
                "repeated auth failures, delaying next login"
            );
        }
    }

    fn reset_auth_failures(&self) {
        self.gate.lock().consecutive_failures = 0;
    }

    fn next_poll_sequence(&self) -> u64 {
        self.poll_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Builds the login query string.
    ///
    /// The portal insists on strict form encoding: an unencoded `@` in
    /// the username is enough to fail authentication.
    fn login_query(&self) -> String {
        format!(
            "timeOffset={LOGIN_TIME_OFFSET}&UserName={}&Password={}&RememberMe=false",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
        )
    }

    fn mend_cookies(&self, response: &reqwest::Response) {
        cookie::mend_response_cookies(&self.jar, response.url(), response.headers());
    }
}

/// Whether a submit response acknowledges the change.
///
/// The portal answers `{"success": 1}`; tolerate a bool, and treat a
/// missing or unreadable flag as rejection.
fn submission_accepted(body: &Value) -> bool {
    match body.get("success") {
        Some(Value::Number(num)) => num.as_i64() == Some(1),
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    }
}

/// Strips the query from a path for error reports.
fn report_path(path: &str) -> String {
    path.split_once('?').map_or(path, |(bare, _)| bare).to_string()
}
