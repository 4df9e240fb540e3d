use crate::location::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the telemetry pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Activity log storage configuration
    pub storage: StorageConfig,
    /// Location resolution configuration
    pub resolver: ResolverConfig,
    /// Statistics configuration
    pub stats: StatsConfig,
}

/// Activity log storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
}

/// Location resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Overall deadline for the provider cascade, in milliseconds
    pub overall_deadline_ms: u64,
    /// Reverse-geocoding endpoint (takes latitude/longitude query params)
    pub reverse_geocode_url: String,
    /// Minimal IP-only lookup endpoint
    pub ip_lookup_url: String,
    /// Ordered provider cascade; first usable result wins
    pub providers: Vec<ProviderConfig>,
    /// Device geolocation fallback parameters
    pub geolocation: GeolocationConfig,
}

/// One geolocation provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Response schema to normalize from
    pub kind: ProviderKind,
    /// Endpoint URL
    pub url: String,
    /// Per-provider request timeout, in milliseconds
    pub timeout_ms: u64,
}

/// Device geolocation fallback parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Request a high-accuracy fix
    pub high_accuracy: bool,
    /// Time to wait for a fix, in milliseconds
    pub timeout_ms: u64,
    /// Maximum acceptable age of a cached fix, in milliseconds
    pub maximum_age_ms: u64,
}

/// Statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// How many recent records the aggregate snapshot samples
    pub sample_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                db_path: PathBuf::from("login_activities.db"),
            },
            resolver: ResolverConfig {
                overall_deadline_ms: 12_000,
                reverse_geocode_url: "https://api.bigdatacloud.net/data/reverse-geocode-client"
                    .to_string(),
                ip_lookup_url: "https://api.ipify.org?format=json".to_string(),
                providers: vec![
                    ProviderConfig {
                        kind: ProviderKind::IpapiCo,
                        url: "https://ipapi.co/json/".to_string(),
                        timeout_ms: 5000,
                    },
                    ProviderConfig {
                        kind: ProviderKind::Ipinfo,
                        url: "https://ipinfo.io/json".to_string(),
                        timeout_ms: 5000,
                    },
                    ProviderConfig {
                        kind: ProviderKind::Ipgeolocation,
                        url: "https://api.ipgeolocation.io/ipgeo?apiKey=free".to_string(),
                        timeout_ms: 5000,
                    },
                ],
                geolocation: GeolocationConfig {
                    high_accuracy: true,
                    timeout_ms: 10_000,
                    maximum_age_ms: 300_000,
                },
            },
            stats: StatsConfig { sample_size: 1000 },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.resolver.providers.len(), 3);
        assert_eq!(parsed.resolver.providers[0].kind, ProviderKind::IpapiCo);
        assert_eq!(parsed.stats.sample_size, 1000);
    }

    #[test]
    fn test_provider_kind_kebab_case() {
        let config = ProviderConfig {
            kind: ProviderKind::Ipgeolocation,
            url: "https://example.com".to_string(),
            timeout_ms: 1000,
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("ipgeolocation"));
    }
}
