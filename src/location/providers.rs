//! Provider descriptors and response normalization
//!
//! Each geolocation provider returns a distinct JSON layout. Normalization
//! maps every layout into the common [`LocationInfo`] shape before the
//! cascade's usability check runs, so the cascade itself stays
//! provider-agnostic. Adding or reordering providers is a data change in
//! the configuration, not a control-flow change here.

use crate::models::{LocationInfo, UNKNOWN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Known provider response schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// ipapi.co: `country_name`, `region`, numeric `latitude`/`longitude`
    IpapiCo,
    /// ipinfo.io: `country` code, combined `loc` = "lat,lon"
    Ipinfo,
    /// ipgeolocation.io: `state_prov`, nested `time_zone.name`,
    /// latitude/longitude delivered as strings
    Ipgeolocation,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::IpapiCo => "ipapi.co",
            ProviderKind::Ipinfo => "ipinfo.io",
            ProviderKind::Ipgeolocation => "ipgeolocation.io",
        }
    }

    /// Map a raw provider response into the common shape.
    ///
    /// Missing or empty fields degrade to the `"Unknown"` sentinel;
    /// missing coordinates stay `None`.
    pub fn normalize(&self, body: &Value) -> LocationInfo {
        match self {
            ProviderKind::IpapiCo => LocationInfo {
                ip: text(body, "ip"),
                country: text(body, "country_name"),
                city: text(body, "city"),
                region: text(body, "region"),
                timezone: text(body, "timezone"),
                latitude: number(body, "latitude"),
                longitude: number(body, "longitude"),
                accuracy: None,
            },
            ProviderKind::Ipinfo => {
                let (latitude, longitude) = split_loc(body.get("loc").and_then(Value::as_str));
                LocationInfo {
                    ip: text(body, "ip"),
                    country: text(body, "country"),
                    city: text(body, "city"),
                    region: text(body, "region"),
                    timezone: text(body, "timezone"),
                    latitude,
                    longitude,
                    accuracy: None,
                }
            }
            ProviderKind::Ipgeolocation => LocationInfo {
                ip: text(body, "ip"),
                country: text(body, "country_name"),
                city: text(body, "city"),
                region: text(body, "state_prov"),
                timezone: body
                    .pointer("/time_zone/name")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                latitude: number(body, "latitude"),
                longitude: number(body, "longitude"),
                accuracy: None,
            },
        }
    }
}

/// One entry of the ordered provider cascade.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub url: String,
    pub timeout: Duration,
}

impl ProviderSpec {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// A provider result is usable only when both city and country resolved.
pub fn usable(info: &LocationInfo) -> bool {
    is_resolved(&info.city) && is_resolved(&info.country)
}

pub(crate) fn is_resolved(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN
}

pub(crate) fn text(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Numeric field that some providers deliver as a JSON string.
pub(crate) fn number(body: &Value, key: &str) -> Option<f64> {
    body.get(key)
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
}

fn split_loc(loc: Option<&str>) -> (Option<f64>, Option<f64>) {
    let Some(loc) = loc else {
        return (None, None);
    };
    let mut parts = loc.splitn(2, ',');
    let latitude = parts.next().and_then(|s| s.trim().parse().ok());
    let longitude = parts.next().and_then(|s| s.trim().parse().ok());
    (latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_ipapi_co() {
        let body = json!({
            "ip": "203.0.113.9",
            "country_name": "Germany",
            "city": "Berlin",
            "region": "Berlin",
            "timezone": "Europe/Berlin",
            "latitude": 52.52,
            "longitude": 13.405
        });
        let info = ProviderKind::IpapiCo.normalize(&body);
        assert_eq!(info.ip, "203.0.113.9");
        assert_eq!(info.country, "Germany");
        assert_eq!(info.city, "Berlin");
        assert_eq!(info.latitude, Some(52.52));
        assert_eq!(info.longitude, Some(13.405));
        assert!(usable(&info));
    }

    #[test]
    fn test_normalize_ipinfo_loc_split() {
        let body = json!({
            "ip": "198.51.100.4",
            "country": "JP",
            "city": "Tokyo",
            "region": "Tokyo",
            "timezone": "Asia/Tokyo",
            "loc": "35.6762,139.6503"
        });
        let info = ProviderKind::Ipinfo.normalize(&body);
        assert_eq!(info.latitude, Some(35.6762));
        assert_eq!(info.longitude, Some(139.6503));
        assert!(usable(&info));
    }

    #[test]
    fn test_normalize_ipinfo_missing_loc() {
        let body = json!({ "ip": "198.51.100.4", "country": "JP", "city": "Tokyo" });
        let info = ProviderKind::Ipinfo.normalize(&body);
        assert!(info.latitude.is_none());
        assert!(info.longitude.is_none());
        assert_eq!(info.timezone, UNKNOWN);
    }

    #[test]
    fn test_normalize_ipgeolocation_string_coordinates() {
        let body = json!({
            "ip": "192.0.2.1",
            "country_name": "Brazil",
            "city": "São Paulo",
            "state_prov": "São Paulo",
            "time_zone": { "name": "America/Sao_Paulo" },
            "latitude": "-23.5505",
            "longitude": "-46.6333"
        });
        let info = ProviderKind::Ipgeolocation.normalize(&body);
        assert_eq!(info.region, "São Paulo");
        assert_eq!(info.timezone, "America/Sao_Paulo");
        assert_eq!(info.latitude, Some(-23.5505));
        assert_eq!(info.longitude, Some(-46.6333));
    }

    #[test]
    fn test_missing_city_is_unusable() {
        // Country alone is not enough; usability requires both.
        let body = json!({ "ip": "192.0.2.1", "country_name": "France" });
        let info = ProviderKind::IpapiCo.normalize(&body);
        assert_eq!(info.city, UNKNOWN);
        assert!(!usable(&info));
    }

    #[test]
    fn test_missing_country_is_unusable() {
        let body = json!({ "ip": "192.0.2.1", "city": "Paris" });
        let info = ProviderKind::IpapiCo.normalize(&body);
        assert!(!usable(&info));
    }

    #[test]
    fn test_empty_strings_degrade_to_unknown() {
        let body = json!({ "ip": "", "country_name": "", "city": "" });
        let info = ProviderKind::IpapiCo.normalize(&body);
        assert_eq!(info.ip, UNKNOWN);
        assert_eq!(info.country, UNKNOWN);
        assert!(!usable(&info));
    }

    #[test]
    fn test_normalize_arbitrary_body_never_panics() {
        for body in [json!(null), json!([]), json!("text"), json!({})] {
            for kind in [
                ProviderKind::IpapiCo,
                ProviderKind::Ipinfo,
                ProviderKind::Ipgeolocation,
            ] {
                let info = kind.normalize(&body);
                assert!(!usable(&info));
            }
        }
    }
}
