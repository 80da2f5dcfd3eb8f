//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-config.toml file. The configuration is resolved once at startup and
//! handed to the collaborators; the tide computations themselves only ever
//! receive the values they need (calibration, thresholds) as arguments.

use crate::aggregate::AggregationSettings;
use crate::coefficient::{Calibration, DEFAULT_MIN_AMPLITUDE_M};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Amplitude-to-coefficient calibration
    pub calibration: Calibration,
    /// National aggregation settings
    pub aggregation: AggregationConfig,
    /// Tide-data provider settings
    pub provider: ProviderConfig,
    /// Cache backend and lifetimes
    pub cache: CacheConfig,
    /// Reference ports used for the national coefficient
    pub ports: Vec<Port>,
}

/// National aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Ports with a smaller amplitude are rejected as outliers, meters
    pub min_amplitude_m: f64,
    /// Port whose extremes decide the rising/falling phase
    pub reference_port: Option<String>,
}

/// Tide-data provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint of the extremes API
    pub base_url: String,
    /// API key; filled from the environment by the binary when absent
    pub api_key: Option<String>,
    /// Extremes older than this are dropped, hours; 0 keeps only upcoming ones
    pub lookback_hours: i64,
    /// Extremes further ahead than this are dropped, hours
    pub lookahead_hours: i64,
    /// HTTP request timeout, seconds
    pub timeout_secs: u64,
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory of the file backend
    pub dir: PathBuf,
    /// Key of the national coefficient record
    pub national_key: String,
    /// Lifetime of the national coefficient record, hours
    pub national_ttl_hours: u64,
    /// Lifetime of cached per-port extremes, hours
    pub port_ttl_hours: u64,
}

/// A coastal reference port
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Port {
    /// Stable identifier, e.g. "brest"
    pub id: String,
    /// Human-readable name for reference
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub region: String,
}

impl Port {
    fn new(id: &str, name: &str, latitude: f64, longitude: f64, region: &str) -> Self {
        Port {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            region: region.to_string(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            min_amplitude_m: DEFAULT_MIN_AMPLITUDE_M,
            reference_port: Some("brest".to_string()),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://www.worldtides.info/api/v3".to_string(),
            api_key: None,
            lookback_hours: 0,
            lookahead_hours: 48,
            timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackend::File,
            dir: PathBuf::from("/tmp/tide-coefficient"),
            national_key: "country:coefficient".to_string(),
            national_ttl_hours: 12,
            port_ttl_hours: 6,
        }
    }
}

impl CacheConfig {
    pub fn national_ttl(&self) -> Duration {
        Duration::from_secs(self.national_ttl_hours * 3600)
    }

    pub fn port_ttl(&self) -> Duration {
        Duration::from_secs(self.port_ttl_hours * 3600)
    }
}

/// Oceanic French ports, Brest first as the national reference, Marseille
/// last as the micro-tidal port expected to be rejected.
pub fn default_ports() -> Vec<Port> {
    vec![
        Port::new("brest", "Brest", 48.383, -4.495, "Bretagne"),
        Port::new("dunkerque", "Dunkerque", 51.048, 2.367, "Hauts-de-France"),
        Port::new("calais", "Calais", 50.967, 1.850, "Hauts-de-France"),
        Port::new("boulogne", "Boulogne-sur-Mer", 50.727, 1.597, "Hauts-de-France"),
        Port::new("dieppe", "Dieppe", 49.933, 1.083, "Normandie"),
        Port::new("le-havre", "Le Havre", 49.483, 0.100, "Normandie"),
        Port::new("cherbourg", "Cherbourg", 49.650, -1.633, "Normandie"),
        Port::new("saint-malo", "Saint-Malo", 48.643, -2.025, "Bretagne"),
        Port::new("le-crouesty", "Le Crouesty", 47.543, -2.895, "Bretagne"),
        Port::new("la-rochelle", "La Rochelle", 46.155, -1.220, "Nouvelle-Aquitaine"),
        Port::new("royan", "Royan", 45.620, -1.030, "Nouvelle-Aquitaine"),
        Port::new("arcachon", "Arcachon", 44.660, -1.170, "Nouvelle-Aquitaine"),
        Port::new("biarritz", "Biarritz", 43.483, -1.560, "Nouvelle-Aquitaine"),
        Port::new("saint-jean-de-luz", "Saint-Jean-de-Luz", 43.390, -1.660, "Nouvelle-Aquitaine"),
        Port::new("marseille", "Marseille", 43.297, 5.360, "Provence-Alpes-Côte d'Azur"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            calibration: Calibration::default(),
            aggregation: AggregationConfig::default(),
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            ports: default_ports(),
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!(
                        "Loaded configuration with {} reference port(s)",
                        config.ports.len()
                    );
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config file format: {}", e);
                    log::warn!("Using default configuration (French reference ports)");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file at {}, using default configuration",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Settings handed to the aggregator
    pub fn aggregation_settings(&self) -> AggregationSettings {
        AggregationSettings {
            calibration: self.calibration,
            min_amplitude_m: self.aggregation.min_amplitude_m,
            reference_location: self.aggregation.reference_port.clone(),
        }
    }

    pub fn port(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.calibration.reference_amplitude_m, 1.78);
        assert_eq!(config.calibration.reference_coefficient, 70.0);
        assert_eq!(config.aggregation.min_amplitude_m, 0.5);
        assert_eq!(config.provider.lookahead_hours, 48);
        assert_eq!(config.cache.national_key, "country:coefficient");
        assert_eq!(config.cache.national_ttl(), Duration::from_secs(43_200));
        assert_eq!(config.ports.len(), 15);
        assert_eq!(config.ports[0].id, "brest");
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.aggregation.min_amplitude_m = 0.8;
        config.cache.backend = CacheBackend::Memory;
        config.ports.truncate(2);

        config.save(file.path()).unwrap();
        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded.ports, config.ports);
        assert_eq!(loaded.aggregation.min_amplitude_m, 0.8);
        assert_eq!(loaded.cache.backend, CacheBackend::Memory);
        assert_eq!(loaded.provider.api_key, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"
[calibration]
reference_amplitude_m = 2.313
reference_coefficient = 31.0

[cache]
backend = "memory"

[[ports]]
id = "brest"
name = "Brest"
latitude = 48.383
longitude = -4.495
"#,
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.calibration.reference_coefficient, 31.0);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.port_ttl_hours, 6);
        assert_eq!(config.ports.len(), 1);
        assert_eq!(config.provider.timeout_secs, 30);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.ports.len(), 15);
    }

    #[test]
    fn test_aggregation_settings() {
        let settings = Config::default().aggregation_settings();
        assert_eq!(settings.reference_location.as_deref(), Some("brest"));
        assert_eq!(settings.min_amplitude_m, 0.5);
    }
}
