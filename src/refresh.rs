//! # Batch Refresh
//!
//! Scheduled job (run twice a day in production) that pre-loads every
//! reference port and publishes the national coefficient:
//!
//! 1. Fetch the extremes window of each configured port, one after another
//! 2. Cache each window under `port:{id}:static`
//! 3. Aggregate all successful windows into a [`NationalCoefficient`]
//! 4. Cache the record under the national key
//!
//! A failing port is logged and reported but never aborts the run; only a
//! run where nothing can be aggregated leaves the national record untouched.

use crate::aggregate::aggregate;
use crate::cache::{get_json, port_key, set_json, KeyValueStore};
use crate::config::{Config, Port};
use crate::provider::{ExtremeSource, FetchError};
use crate::{LocationExtremes, NationalCoefficient, TideError, TideExtreme};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// A port whose extremes could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortFailure {
    pub port_id: String,
    pub error: String,
}

/// Outcome of one [`refresh_all`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failures: Vec<PortFailure>,
    pub national: Option<NationalCoefficient>,
    pub aggregation_error: Option<String>,
    pub duration_ms: u128,
}

/// Fetch and cache every configured port, then publish the national coefficient.
pub async fn refresh_all<S, K>(
    source: &S,
    store: &K,
    config: &Config,
    now: DateTime<Utc>,
) -> RefreshReport
where
    S: ExtremeSource,
    K: KeyValueStore + ?Sized,
{
    let started = Instant::now();
    let mut report = RefreshReport::default();
    let mut rows = Vec::with_capacity(config.ports.len());

    log::info!("Starting refresh of {} ports", config.ports.len());

    for port in &config.ports {
        match source.fetch_extremes(port, now).await {
            Ok(extremes) => {
                let key = port_key(&port.id);
                if let Err(e) = set_json(store, &key, &extremes, config.cache.port_ttl()) {
                    log::warn!("Could not cache {}: {}", port.id, e);
                }
                log::info!("{} cached ({} tides)", port.name, extremes.len());
                report.refreshed.push(port.id.clone());
                rows.push(LocationExtremes::new(port.id.clone(), extremes));
            }
            Err(e) => {
                log::error!("{} failed: {}", port.id, e);
                report.failures.push(PortFailure {
                    port_id: port.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    match aggregate(&rows, &config.aggregation_settings()) {
        Ok(national) => {
            log::info!(
                "National coefficient {} ({:?}), {}/{} ports used, outliers: [{}]",
                national.value,
                national.phase,
                national.detail.used_count,
                national.detail.total_count,
                national.detail.excluded_location_ids.join(", ")
            );
            if let Err(e) = set_json(
                store,
                &config.cache.national_key,
                &national,
                config.cache.national_ttl(),
            ) {
                log::warn!("Could not cache national coefficient: {}", e);
            }
            report.national = Some(national);
        }
        Err(e) => {
            log::error!("Coefficient calculation failed: {}", e);
            report.aggregation_error = Some(e.to_string());
        }
    }

    report.duration_ms = started.elapsed().as_millis();
    log::info!(
        "Refresh complete in {}ms: {} ok, {} failed",
        report.duration_ms,
        report.refreshed.len(),
        report.failures.len()
    );
    report
}

/// Extremes of one port from the cache, fetching and caching them on a miss.
///
/// `source` is only consulted on a miss; without one a miss is
/// [`FetchError::MissingApiKey`].
pub async fn cached_or_fetch<S, K>(
    source: Option<&S>,
    store: &K,
    config: &Config,
    port: &Port,
    now: DateTime<Utc>,
) -> Result<Vec<TideExtreme>, FetchError>
where
    S: ExtremeSource,
    K: KeyValueStore + ?Sized,
{
    let key = port_key(&port.id);
    match get_json::<Vec<TideExtreme>, K>(store, &key) {
        Ok(Some(extremes)) => {
            log::debug!("Cache hit for {}", port.id);
            return Ok(extremes);
        }
        Ok(None) => log::debug!("Cache miss for {}", port.id),
        Err(e) => log::warn!("Ignoring unreadable cache entry {}: {}", key, e),
    }

    let source = source.ok_or(FetchError::MissingApiKey)?;
    let extremes = source.fetch_extremes(port, now).await?;
    if let Err(e) = set_json(store, &key, &extremes, config.cache.port_ttl()) {
        log::warn!("Could not cache {}: {}", port.id, e);
    }
    Ok(extremes)
}

/// The cached national coefficient, running a full refresh on a miss.
///
/// A fresh record is served even when no `source` is available.
pub async fn national_coefficient<S, K>(
    source: Option<&S>,
    store: &K,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<NationalCoefficient, TideError>
where
    S: ExtremeSource,
    K: KeyValueStore + ?Sized,
{
    match get_json::<NationalCoefficient, K>(store, &config.cache.national_key) {
        Ok(Some(national)) => return Ok(national),
        Ok(None) => log::info!("No cached national coefficient, refreshing"),
        Err(e) => log::warn!("Ignoring unreadable national coefficient: {}", e),
    }

    let Some(source) = source else {
        return Err(TideError::InsufficientData(
            "no cached coefficient and no provider API key configured".to_string(),
        ));
    };
    let report = refresh_all(source, store, config, now).await;
    report.national.ok_or_else(|| {
        TideError::InsufficientData(
            report
                .aggregation_error
                .unwrap_or_else(|| "refresh produced no coefficient".to_string()),
        )
    })
}
