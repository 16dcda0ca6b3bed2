//! Configuration loading and validation.
//!
//! Sources, highest precedence first:
//! 1. Environment variables prefixed with `TRAFFIC_WATCH_` (nested keys split
//!    on `__`, e.g. `TRAFFIC_WATCH_MAP__API_KEY`)
//! 2. TOML file at `~/.config/traffic-watch/config.toml` or `--config`
//! 3. Built-in defaults (the three Harare commute routes)

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::distance_matrix::{TrafficModel, TravelMode};
use crate::fetcher::QueryOptions;
use crate::error::{Error, Result};
use crate::map_surface::{LatLng, MapSurface};
use crate::traffic_models::RouteDescriptor;

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = "traffic-watch";
const ENV_PREFIX: &str = "TRAFFIC_WATCH_";

/// Highest zoom level the Maps JavaScript API accepts.
const MAX_ZOOM: u8 = 22;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub map: MapConfig,
    pub commute: CommuteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Maps platform key. Without it the page stays on the loading placeholder
    /// and no ETA requests are made.
    pub api_key: Option<String>,
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommuteConfig {
    /// Origin used by routes that don't name their own.
    pub origin: String,
    /// Time text shown until a real-time duration arrives.
    pub placeholder: String,
    pub travel_mode: TravelMode,
    pub traffic_model: TrafficModel,
    pub request_timeout_secs: u64,
    pub routes: Vec<RouteConfig>,
}

/// One commute row. `destination` wins over parsing it out of `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub id: u32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl RouteConfig {
    fn labelled(id: u32, label: &str) -> Self {
        RouteConfig {
            id,
            label: label.to_string(),
            origin: None,
            destination: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            center: LatLng::HARARE_CBD,
            zoom: 12,
        }
    }
}

impl Default for CommuteConfig {
    fn default() -> Self {
        Self {
            origin: "Harare CBD".to_string(),
            placeholder: "Loading...".to_string(),
            travel_mode: TravelMode::Driving,
            traffic_model: TrafficModel::BestGuess,
            request_timeout_secs: 30,
            routes: vec![
                RouteConfig::labelled(1, "CBD to Chitungwiza (Seke Rd)"),
                RouteConfig::labelled(2, "CBD to Norton (Bulawayo Rd)"),
                RouteConfig::labelled(3, "CBD to Ruwa (Mutare Rd)"),
            ],
        }
    }
}

impl Config {
    /// Load with an optional explicit config file. An explicit file must exist;
    /// the default one may be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = &config_path {
            if !path.exists() {
                return Err(Error::ConfigMissing { path: path.clone() });
            }
        }
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::invalid_config("server.port must be greater than 0"));
        }

        if self.map.zoom > MAX_ZOOM {
            return Err(Error::invalid_config(format!(
                "map.zoom ({}) must be between 0 and {}",
                self.map.zoom, MAX_ZOOM
            )));
        }

        if !self.map.center.is_valid() {
            return Err(Error::invalid_config(format!(
                "map.center ({}, {}) is not a valid coordinate",
                self.map.center.lat, self.map.center.lng
            )));
        }

        if self.commute.request_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "commute.request_timeout_secs must be greater than 0",
            ));
        }

        if self.commute.routes.is_empty() {
            return Err(Error::invalid_config("commute.routes must not be empty"));
        }

        let mut seen = HashSet::new();
        for route in &self.commute.routes {
            if !seen.insert(route.id) {
                return Err(Error::invalid_config(format!(
                    "duplicate route id {}",
                    route.id
                )));
            }
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.map
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            mode: self.commute.travel_mode,
            traffic_model: self.commute.traffic_model,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.commute.request_timeout_secs)
    }

    /// Resolve route configs into descriptors, in configured order.
    pub fn route_descriptors(&self) -> Vec<RouteDescriptor> {
        self.commute
            .routes
            .iter()
            .map(|route| {
                let origin = route
                    .origin
                    .clone()
                    .unwrap_or_else(|| self.commute.origin.clone());
                match &route.destination {
                    Some(destination) => {
                        RouteDescriptor::new(route.id, &route.label, origin, destination)
                    }
                    None => RouteDescriptor::from_label(route.id, &route.label, origin),
                }
            })
            .collect()
    }

    pub fn map_surface(&self) -> MapSurface {
        MapSurface::new(self.map.api_key.clone(), self.map.center, self.map.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.map.zoom, 12);
        assert_eq!(config.map.center, LatLng::HARARE_CBD);
        assert!(config.map.api_key.is_none());
        assert_eq!(config.commute.origin, "Harare CBD");
        assert_eq!(config.commute.placeholder, "Loading...");
        assert_eq!(config.commute.routes.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_routes_resolve_destinations() {
        let descriptors = Config::default().route_descriptors();
        let destinations: Vec<&str> = descriptors.iter().map(|d| d.destination.as_str()).collect();
        assert_eq!(
            destinations,
            vec![
                "Chitungwiza (Seke Rd)",
                "Norton (Bulawayo Rd)",
                "Ruwa (Mutare Rd)"
            ]
        );
        assert!(descriptors.iter().all(|d| d.origin == "Harare CBD"));
    }

    #[test]
    fn test_explicit_destination_wins() {
        let mut config = Config::default();
        config.commute.routes = vec![RouteConfig {
            id: 9,
            label: "Airport run".to_string(),
            origin: Some("Avondale".to_string()),
            destination: Some("Robert Gabriel Mugabe International Airport".to_string()),
        }];

        let d = &config.route_descriptors()[0];
        assert_eq!(d.origin, "Avondale");
        assert_eq!(d.destination, "Robert Gabriel Mugabe International Airport");
        assert_eq!(d.label, "Airport run");
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut config = Config::default();
        config.commute.routes.push(RouteConfig::labelled(2, "CBD to Epworth"));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate route id 2"));
    }

    #[test]
    fn test_validate_empty_routes() {
        let mut config = Config::default();
        config.commute.routes.clear();
        assert!(config.validate().unwrap_err().to_string().contains("routes"));
    }

    #[test]
    fn test_validate_zoom_and_center() {
        let mut config = Config::default();
        config.map.zoom = 30;
        assert!(config.validate().unwrap_err().to_string().contains("map.zoom"));

        let mut config = Config::default();
        config.map.center = LatLng { lat: -100.0, lng: 31.0 };
        assert!(config.validate().unwrap_err().to_string().contains("map.center"));
    }

    #[test]
    fn test_validate_zero_timeout_and_port() {
        let mut config = Config::default();
        config.commute.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_has_api_key() {
        let mut config = Config::default();
        assert!(!config.has_api_key());
        config.map.api_key = Some(" ".to_string());
        assert!(!config.has_api_key());
        config.map.api_key = Some("abc".to_string());
        assert!(config.has_api_key());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/traffic-watch.toml")));
        assert!(matches!(result, Err(Error::ConfigMissing { .. })));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tw.toml",
                r#"
                [server]
                port = 9090

                [map]
                zoom = 13

                [commute]
                origin = "Africa Unity Square"
                traffic_model = "pessimistic"

                [[commute.routes]]
                id = 1
                label = "CBD to Epworth"

                [[commute.routes]]
                id = 2
                label = "Airport"
                destination = "Harare Airport"
                "#,
            )?;
            jail.set_env("TRAFFIC_WATCH_MAP__API_KEY", "from-env");

            let config = Config::load_from(Some(PathBuf::from("tw.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9090);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.map.zoom, 13);
            assert_eq!(config.map.api_key.as_deref(), Some("from-env"));
            assert_eq!(config.query_options().traffic_model, TrafficModel::Pessimistic);
            assert_eq!(config.query_options().mode, TravelMode::Driving);

            let descriptors = config.route_descriptors();
            assert_eq!(descriptors.len(), 2);
            assert_eq!(descriptors[0].destination, "Epworth");
            assert_eq!(descriptors[0].origin, "Africa Unity Square");
            assert_eq!(descriptors[1].destination, "Harare Airport");
            Ok(())
        });
    }
}
