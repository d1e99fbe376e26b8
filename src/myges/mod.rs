pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode, redirect};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::Course;

const AUTH_URL: &str =
    "https://authentication.kordis.fr/oauth/authorize?response_type=token&client_id=skolae-app";
const AGENDA_URL: &str = "https://api.kordis.fr/me/agenda";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct MyGesConfig {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait AgendaClient: Send + Sync {
    /// Raw agenda entries for the [start, end] range in epoch milliseconds.
    /// Transport failures are errors, never an empty list.
    async fn fetch_agenda(&self, start_ms: i64, end_ms: i64) -> Result<Vec<Course>, AppError>;
}

/// Millisecond range covering one local day in `tz`, 00:00:00.000 through
/// 23:59:59.999, the span the agenda API expects. `None` when the local
/// midnight does not exist (DST edge).
pub fn day_span_millis(date: NaiveDate, tz: Tz) -> Option<(i64, i64)> {
    let start = tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()?;
    let end = tz
        .from_local_datetime(&date.and_hms_milli_opt(23, 59, 59, 999)?)
        .latest()?;
    Some((start.timestamp_millis(), end.timestamp_millis()))
}

pub struct MyGesHttpClient {
    client: Client,
    config: MyGesConfig,
    token: Mutex<Option<String>>,
}

impl MyGesHttpClient {
    pub fn new(config: MyGesConfig) -> Result<Self, AppError> {
        // The token arrives in the Location header of a 302, so redirects
        // must not be followed.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AppError::Agenda)?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    /// OAuth implicit-grant login: basic-auth against the authorize endpoint
    /// and pull `access_token` out of the redirect fragment.
    async fn login(&self) -> Result<String, AppError> {
        let response = self
            .client
            .get(AUTH_URL)
            .basic_auth(&self.config.email, Some(&self.config.password))
            .send()
            .await?;

        if response.status() != StatusCode::FOUND {
            return Err(AppError::Auth(format!(
                "unexpected status {} from authorize endpoint (bad credentials?)",
                response.status()
            )));
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Auth("redirect without Location header".to_string()))?;

        let token = extract_access_token(location)
            .ok_or_else(|| AppError::Auth("no access_token in redirect URL".to_string()))?;

        info!("MyGES login successful");
        Ok(token.to_string())
    }

    async fn bearer_token(&self, force_refresh: bool) -> Result<String, AppError> {
        let mut slot = self.token.lock().await;
        if !force_refresh {
            if let Some(token) = slot.as_ref() {
                return Ok(token.clone());
            }
        }
        let token = self.login().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn get_agenda(
        &self,
        start_ms: i64,
        end_ms: i64,
        token: &str,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{AGENDA_URL}?start={start_ms}&end={end_ms}");
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }
}

/// `Location` looks like `...#access_token=<token>&token_type=bearer...`.
fn extract_access_token(location: &str) -> Option<&str> {
    let start = location.find("access_token=")? + "access_token=".len();
    let rest = &location[start..];
    let token = &rest[..rest.find('&').unwrap_or(rest.len())];
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl AgendaClient for MyGesHttpClient {
    async fn fetch_agenda(&self, start_ms: i64, end_ms: i64) -> Result<Vec<Course>, AppError> {
        let token = self.bearer_token(false).await?;
        let mut response = self.get_agenda(start_ms, end_ms, &token).await?;

        // Expired token: re-authenticate once and retry.
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Agenda request returned 401, refreshing token");
            let token = self.bearer_token(true).await?;
            response = self.get_agenda(start_ms, end_ms, &token).await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Malformed(format!(
                "agenda API error {status}: {body}"
            )));
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: dto::AgendaResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Malformed(format!("failed to parse agenda response: {e}")))?;

        Ok(parsed.result.into_iter().map(Course::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Paris;

    #[test]
    fn extracts_token_from_redirect_fragment() {
        let location =
            "https://www.myges.fr/#access_token=abc123.def&token_type=bearer&expires_in=7200";
        assert_eq!(extract_access_token(location), Some("abc123.def"));
    }

    #[test]
    fn extracts_token_without_trailing_params() {
        assert_eq!(
            extract_access_token("https://www.myges.fr/#access_token=tok"),
            Some("tok")
        );
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        assert_eq!(extract_access_token("https://www.myges.fr/#error=denied"), None);
        assert_eq!(
            extract_access_token("https://www.myges.fr/#access_token=&token_type=bearer"),
            None
        );
    }

    #[test]
    fn day_span_covers_a_full_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
        let (start, end) = day_span_millis(date, Paris).expect("span");
        assert_eq!(end - start, 86_399_999);
    }

    #[test]
    fn day_span_honors_dst_transitions() {
        // Paris springs forward on 2025-03-30: a 23-hour day.
        let date = NaiveDate::from_ymd_opt(2025, 3, 30).expect("valid date");
        let (start, end) = day_span_millis(date, Paris).expect("span");
        assert_eq!(end - start, 82_799_999);
    }
}
