//! # Tide Extremes Provider
//!
//! This module handles network operations for fetching predicted high and low
//! waters from the WorldTides v3 API. Every call costs provider credits, so
//! callers are expected to cache the result (see [`crate::refresh`]).
//!
//! ## Data Source
//! - **URL**: `https://www.worldtides.info/api/v3?extremes=true&lat=..&lon=..&key=..`
//! - **Format**: JSON, one record per extreme with a Unix timestamp (`dt`),
//!   a height in meters and a `"High"`/`"Low"` type
//!
//! ## Processing Pipeline
//! 1. **Fetch**: HTTP GET with the port coordinates
//! 2. **Decode**: map provider records onto [`TideExtreme`]
//! 3. **Window**: keep extremes between `now - lookback` and `now + lookahead`
//! 4. **Sort**: chronological order, as the tide engine expects
//!
//! ## Error Handling
//! Network failures, API-level errors and empty windows all surface as
//! [`FetchError`]; the batch refresh records them per port and carries on.

use crate::config::{Port, ProviderConfig};
use crate::{TideExtreme, TideKind};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur while fetching tide extremes.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not the expected JSON
    #[error("invalid provider response: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider answered with an error message or an unexpected record
    #[error("provider error: {0}")]
    Api(String),

    /// No extreme falls inside the requested window
    #[error("no tide data returned for {0}")]
    NoData(String),

    /// No API key configured
    #[error("missing provider API key")]
    MissingApiKey,
}

/// Anything able to produce the extremes window of a port.
pub trait ExtremeSource {
    fn fetch_extremes(
        &self,
        port: &Port,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TideExtreme>, FetchError>> + Send;
}

/// WorldTides v3 HTTP client.
pub struct WorldTidesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    lookback: Duration,
    lookahead: Duration,
}

impl WorldTidesClient {
    /// Build a client from the provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(FetchError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(WorldTidesClient {
            client,
            base_url: config.base_url.clone(),
            api_key,
            lookback: Duration::hours(config.lookback_hours),
            lookahead: Duration::hours(config.lookahead_hours),
        })
    }
}

impl ExtremeSource for WorldTidesClient {
    async fn fetch_extremes(
        &self,
        port: &Port,
        now: DateTime<Utc>,
    ) -> Result<Vec<TideExtreme>, FetchError> {
        let from = now - self.lookback;
        let until = now + self.lookahead;
        let days = (until - from).num_hours().div_euclid(24) + 1;

        log::info!("Fetching tides for {}...", port.name);

        let body = self
            .client
            .get(&self.base_url)
            .query(&[
                ("extremes", "true".to_string()),
                ("lat", port.latitude.to_string()),
                ("lon", port.longitude.to_string()),
                ("start", from.timestamp().to_string()),
                ("days", days.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let extremes = parse_extremes(&body, from, until)
            .map_err(|e| match e {
                FetchError::NoData(_) => FetchError::NoData(port.name.clone()),
                other => other,
            })?;
        log::info!("Received {} tide extremes for {}", extremes.len(), port.name);
        Ok(extremes)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldTidesResponse {
    #[serde(default)]
    call_count: Option<u64>,
    #[serde(default)]
    extremes: Vec<WorldTidesExtreme>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct WorldTidesExtreme {
    dt: i64,
    height: f64,
    #[serde(rename = "type")]
    kind: String,
}

/// Decode a WorldTides response, keeping extremes in `[from, until]`.
///
/// The result is sorted by time.
pub fn parse_extremes(
    body: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<TideExtreme>, FetchError> {
    let response: WorldTidesResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(FetchError::Api(error));
    }
    if let Some(count) = response.call_count {
        log::debug!("Provider call count: {count}");
    }

    let mut extremes = Vec::with_capacity(response.extremes.len());
    for raw in response.extremes {
        let time = DateTime::from_timestamp(raw.dt, 0)
            .ok_or_else(|| FetchError::Api(format!("timestamp out of range: {}", raw.dt)))?;
        if time < from || time > until {
            continue;
        }
        let kind = match raw.kind.as_str() {
            "High" | "high" => TideKind::High,
            "Low" | "low" => TideKind::Low,
            other => return Err(FetchError::Api(format!("unknown extreme type {other:?}"))),
        };
        extremes.push(TideExtreme {
            time,
            height: raw.height,
            kind,
        });
    }

    if extremes.is_empty() {
        return Err(FetchError::NoData("requested window".into()));
    }
    extremes.sort_by_key(|e| e.time);
    Ok(extremes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2025-07-24T00:00:00Z
    const T0: i64 = 1_753_315_200;

    fn body() -> String {
        format!(
            r#"{{
                "status": 200,
                "callCount": 17,
                "extremes": [
                    {{ "dt": {}, "date": "2025-07-24T06:12+0000", "height": 1.42, "type": "Low" }},
                    {{ "dt": {}, "date": "2025-07-24T00:00+0000", "height": 5.87, "type": "High" }},
                    {{ "dt": {}, "date": "2025-07-26T12:00+0000", "height": 5.90, "type": "High" }}
                ]
            }}"#,
            T0 + 22_320,
            T0,
            T0 + 60 * 3600
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(T0, 0).unwrap()
    }

    #[test]
    fn test_parse_sorts_and_windows() {
        let extremes = parse_extremes(&body(), t0(), t0() + Duration::hours(48)).unwrap();
        assert_eq!(extremes.len(), 2);
        assert_eq!(extremes[0].kind, TideKind::High);
        assert_eq!(extremes[0].height, 5.87);
        assert_eq!(extremes[1].kind, TideKind::Low);
        assert_eq!(extremes[1].time, t0() + Duration::seconds(22_320));
    }

    #[test]
    fn test_parse_provider_error() {
        let err = parse_extremes(
            r#"{ "status": 400, "error": "Invalid key" }"#,
            t0(),
            t0() + Duration::hours(48),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Api(ref msg) if msg == "Invalid key"));
    }

    #[test]
    fn test_parse_empty_window() {
        let err = parse_extremes(
            &body(),
            t0() + Duration::hours(70),
            t0() + Duration::hours(80),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::NoData(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let body =
            format!(r#"{{ "extremes": [ {{ "dt": {T0}, "height": 1.0, "type": "Slack" }} ] }}"#);
        assert!(matches!(
            parse_extremes(&body, t0(), t0() + Duration::hours(1)),
            Err(FetchError::Api(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_extremes("<html>", t0(), t0()),
            Err(FetchError::Json(_))
        ));
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = ProviderConfig::default();
        assert!(matches!(
            WorldTidesClient::new(&config),
            Err(FetchError::MissingApiKey)
        ));
    }
}
