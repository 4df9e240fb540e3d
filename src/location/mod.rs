//! IP geolocation via cascading HTTP providers
//!
//! The resolver tries an ordered list of third-party geolocation
//! endpoints, normalizes their differing schemas into one shape, and
//! falls back to a device coordinate fix plus reverse geocoding, and
//! finally to an IP-only lookup. Resolution is best-effort telemetry:
//! `resolve` never returns an error, it degrades to a partial or
//! fully-"Unknown" result instead.

pub mod providers;

pub use providers::{ProviderKind, ProviderSpec};

use crate::config::ResolverConfig;
use crate::models::{GeoFix, LocationInfo, UNKNOWN};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a single provider attempt failed. Logged, never surfaced.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("response lacked a usable city/country pair")]
    Unusable,
}

/// Errors from a device geolocation capability.
#[derive(Error, Debug)]
pub enum GeoSourceError {
    #[error("permission denied")]
    Denied,

    #[error("position unavailable")]
    Unavailable,

    #[error("timed out waiting for a fix")]
    Timeout,
}

/// Parameters passed to a [`CoordinateSource`] request.
#[derive(Debug, Clone, Copy)]
pub struct GeoOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A cached fix no older than this is acceptable.
    pub maximum_age: Duration,
}

/// A device geolocation capability (GPS, platform location service).
///
/// Supplied by the embedding application; the resolver treats its
/// absence the same as an unavailable capability.
pub trait CoordinateSource: Send + Sync {
    fn current_position(&self, options: &GeoOptions) -> Result<GeoFix, GeoSourceError>;
}

/// A resolved location together with its display-only labeling.
#[derive(Debug, Clone)]
pub struct DetailedLocation {
    pub info: LocationInfo,
    /// "High" with coordinates, "Medium" with city/country only, else "Low".
    pub accuracy_tier: &'static str,
    /// "GPS + IP" when a coordinate fix contributed, else "IP-based".
    pub method: &'static str,
}

/// Resolves the caller's public IP and location via a provider cascade.
pub struct LocationResolver {
    client: Client,
    providers: Vec<ProviderSpec>,
    reverse_geocode_url: String,
    ip_lookup_url: String,
    geo_options: GeoOptions,
    overall_deadline: Duration,
}

impl LocationResolver {
    /// Build a resolver from configuration.
    pub fn new(config: &ResolverConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|p| ProviderSpec {
                kind: p.kind,
                url: p.url.clone(),
                timeout: Duration::from_millis(p.timeout_ms),
            })
            .collect();

        LocationResolver {
            client: Client::builder().build().unwrap_or_default(),
            providers,
            reverse_geocode_url: config.reverse_geocode_url.clone(),
            ip_lookup_url: config.ip_lookup_url.clone(),
            geo_options: GeoOptions {
                high_accuracy: config.geolocation.high_accuracy,
                timeout: Duration::from_millis(config.geolocation.timeout_ms),
                maximum_age: Duration::from_millis(config.geolocation.maximum_age_ms),
            },
            overall_deadline: Duration::from_millis(config.overall_deadline_ms),
        }
    }

    /// Resolve the current location, best effort.
    ///
    /// Tries each configured provider in order under one overall
    /// deadline, then the device coordinate fallback, then the IP-only
    /// fallback. Never returns an error; every failure path terminates
    /// in a record whose unresolved fields carry the `"Unknown"`
    /// sentinel.
    pub async fn resolve(&self, coords: Option<&dyn CoordinateSource>) -> LocationInfo {
        match tokio::time::timeout(self.overall_deadline, self.provider_cascade()).await {
            Ok(Some(info)) => return info,
            Ok(None) => {}
            Err(_) => log::warn!(
                "provider cascade exceeded the {}ms deadline",
                self.overall_deadline.as_millis()
            ),
        }
        self.fallback_location(coords).await
    }

    /// Resolve and label the result with an accuracy tier and method.
    ///
    /// The labeling is for observability and display only; it has no
    /// effect on resolution.
    pub async fn resolve_detailed(
        &self,
        coords: Option<&dyn CoordinateSource>,
    ) -> DetailedLocation {
        let info = self.resolve(coords).await;
        let (accuracy_tier, method) = label(&info);
        DetailedLocation {
            info,
            accuracy_tier,
            method,
        }
    }

    /// First usable provider result wins; exhausting the list yields None.
    async fn provider_cascade(&self) -> Option<LocationInfo> {
        for spec in &self.providers {
            match self.try_provider(spec).await {
                Ok(info) => {
                    log::info!("location resolved via {}", spec.name());
                    return Some(info);
                }
                Err(e) => log::warn!("location provider {} failed: {}", spec.name(), e),
            }
        }
        None
    }

    async fn try_provider(&self, spec: &ProviderSpec) -> Result<LocationInfo, ProviderError> {
        let response = self
            .client
            .get(&spec.url)
            .header(ACCEPT, "application/json")
            .timeout(spec.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        let info = spec.kind.normalize(&body);
        if providers::usable(&info) {
            Ok(info)
        } else {
            Err(ProviderError::Unusable)
        }
    }

    /// Device-coordinate fallback, then the IP-only final fallback.
    async fn fallback_location(&self, coords: Option<&dyn CoordinateSource>) -> LocationInfo {
        if let Some(source) = coords {
            match source.current_position(&self.geo_options) {
                Ok(fix) => return self.location_from_fix(fix).await,
                Err(e) => log::warn!("device geolocation failed: {}", e),
            }
        }

        LocationInfo {
            ip: self.lookup_ip().await,
            timezone: local_timezone(),
            ..LocationInfo::default()
        }
    }

    async fn location_from_fix(&self, fix: GeoFix) -> LocationInfo {
        let geocoded = self.reverse_geocode(fix.latitude, fix.longitude).await;
        LocationInfo {
            ip: self.lookup_ip().await,
            country: geocoded.country,
            city: geocoded.city,
            region: geocoded.region,
            timezone: local_timezone(),
            latitude: Some(fix.latitude),
            longitude: Some(fix.longitude),
            accuracy: Some(format!("{}m", fix.accuracy_meters.round() as i64)),
        }
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ReverseGeocoded {
        match self.try_reverse_geocode(latitude, longitude).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("reverse geocoding failed: {}", e);
                ReverseGeocoded::default()
            }
        }
    }

    async fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocoded, ProviderError> {
        let url = format!(
            "{}?latitude={}&longitude={}&localityLanguage=en",
            self.reverse_geocode_url, latitude, longitude
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        let city = match providers::text(&body, "city") {
            city if providers::is_resolved(&city) => city,
            _ => providers::text(&body, "locality"),
        };
        Ok(ReverseGeocoded {
            city,
            country: providers::text(&body, "countryName"),
            region: providers::text(&body, "principalSubdivision"),
        })
    }

    /// Minimal IP-only lookup; defaults to `"Unknown"` on any failure.
    async fn lookup_ip(&self) -> String {
        match self.try_lookup_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                log::warn!("ip lookup failed: {}", e);
                UNKNOWN.to_string()
            }
        }
    }

    async fn try_lookup_ip(&self) -> Result<String, ProviderError> {
        let response = self.client.get(&self.ip_lookup_url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }
        let body: serde_json::Value = response.json().await?;
        Ok(providers::text(&body, "ip"))
    }
}

/// City/country/region triple from the reverse-geocoding endpoint.
#[derive(Debug)]
struct ReverseGeocoded {
    city: String,
    country: String,
    region: String,
}

impl Default for ReverseGeocoded {
    fn default() -> Self {
        ReverseGeocoded {
            city: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
        }
    }
}

/// Accuracy tier and method labels for a resolved location.
fn label(info: &LocationInfo) -> (&'static str, &'static str) {
    if info.latitude.is_some() && info.longitude.is_some() {
        ("High", "GPS + IP")
    } else if providers::is_resolved(&info.city) && providers::is_resolved(&info.country) {
        ("Medium", "IP-based")
    } else {
        ("Low", "IP-based")
    }
}

/// The local runtime's IANA timezone, resolvable without network access.
fn local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| UNKNOWN.to_string())
}
