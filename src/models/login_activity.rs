use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel used wherever a string field could not be resolved.
///
/// Display consumers rely on every resolvable field being a string,
/// so unresolved values degrade to this sentinel instead of being
/// omitted. Numeric geo fields are the exception: they stay `None`
/// when unavailable to keep "no data" distinct from "0,0".
pub const UNKNOWN: &str = "Unknown";

/// Best-effort location information for a login attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Free-form accuracy descriptor, e.g. "25m" for a device fix.
    pub accuracy: Option<String>,
}

impl Default for LocationInfo {
    fn default() -> Self {
        LocationInfo {
            ip: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            timezone: UNKNOWN.to_string(),
            latitude: None,
            longitude: None,
            accuracy: None,
        }
    }
}

impl LocationInfo {
    /// Human-readable "City, Country" label for display.
    pub fn display_location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// Coarse platform/browser/version triple derived from a user-agent string.
///
/// Computed fresh per login attempt; never stored independently of a
/// [`LoginActivity`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    pub browser: String,
    pub version: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            platform: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        }
    }
}

/// A raw coordinate fix from a device geolocation capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty around the fix, in meters.
    pub accuracy_meters: f64,
}

/// Authentication method used for a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Email,
    Google,
    Facebook,
    Twitter,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Email => "email",
            LoginMethod::Google => "google",
            LoginMethod::Facebook => "facebook",
            LoginMethod::Twitter => "twitter",
        }
    }

    /// All recognized methods, in display order.
    pub fn all() -> [LoginMethod; 4] {
        [
            LoginMethod::Email,
            LoginMethod::Google,
            LoginMethod::Facebook,
            LoginMethod::Twitter,
        ]
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unrecognized login method: {0}")]
pub struct ParseMethodError(String);

impl FromStr for LoginMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(LoginMethod::Email),
            "google" => Ok(LoginMethod::Google),
            "facebook" => Ok(LoginMethod::Facebook),
            "twitter" => Ok(LoginMethod::Twitter),
            other => Err(ParseMethodError(other.to_string())),
        }
    }
}

/// One persisted login/registration attempt.
///
/// Append-only audit record: created exactly once per attempt (success
/// or failure), immutable thereafter. `id` and `timestamp` are assigned
/// by the storage layer, never by the caller. Optional fields serialize
/// as explicit `null` rather than being skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginActivity {
    pub id: Option<String>,
    /// Empty string for failed attempts where no account was resolved.
    pub user_id: String,
    pub email: String,
    pub login_method: LoginMethod,
    pub success: bool,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub device_info: Option<DeviceInfo>,
    pub location: Option<LocationInfo>,
    /// Epoch milliseconds, assigned at write time by the store.
    pub timestamp: i64,
}

/// Write-side input for a login activity record.
///
/// Everything in [`LoginActivity`] minus the store-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoginActivity {
    pub user_id: String,
    pub email: String,
    pub login_method: LoginMethod,
    pub success: bool,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub device_info: Option<DeviceInfo>,
    pub location: Option<LocationInfo>,
}

/// Per-method login counts across the recognized methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCounts {
    pub email: usize,
    pub google: usize,
    pub facebook: usize,
    pub twitter: usize,
}

impl MethodCounts {
    /// Count for one method.
    pub fn count_for(&self, method: LoginMethod) -> usize {
        match method {
            LoginMethod::Email => self.email,
            LoginMethod::Google => self.google,
            LoginMethod::Facebook => self.facebook,
            LoginMethod::Twitter => self.twitter,
        }
    }
}

/// Aggregate login statistics over a bounded recent window.
///
/// Derived on demand from stored records; never persisted itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStats {
    pub total_logins: usize,
    pub successful_logins: usize,
    pub failed_logins: usize,
    /// Count of distinct non-empty user ids in the sample.
    pub unique_users: usize,
    pub login_methods: MethodCounts,
    /// First 10 records of the sampled batch, most recent first.
    pub recent_activities: Vec<LoginActivity>,
}
