//! Device fingerprinting from user-agent strings
//!
//! Derives a coarse platform/browser/version triple for login telemetry.
//! Classification is substring containment against fixed ordered token
//! lists; the first matching token wins. The ordering is load-bearing for
//! ambiguous user-agent strings (e.g. iPhone agents contain "Mac"), so it
//! must not be reordered without accepting changed classifications.

use crate::models::{DeviceInfo, UNKNOWN};
use chrono::Utc;
use rand::Rng;
use regex::Regex;

/// Ordered (token, label) pairs for platform classification.
const PLATFORM_TOKENS: [(&str, &str); 5] = [
    ("Windows", "Windows"),
    ("Mac", "macOS"),
    ("Linux", "Linux"),
    ("Android", "Android"),
    ("iOS", "iOS"),
];

/// Ordered browser tokens; token and label coincide.
const BROWSER_TOKENS: [&str; 5] = ["Chrome", "Firefox", "Safari", "Edge", "Opera"];

/// Version capture patterns, tried in order.
const VERSION_PATTERNS: [&str; 3] = [
    r"Chrome/(\d+\.\d+)",
    r"Firefox/(\d+\.\d+)",
    r"Version/(\d+\.\d+)",
];

/// Classify a user-agent string into a [`DeviceInfo`].
///
/// Total over all inputs: empty or malformed strings yield a record
/// with every field at the `"Unknown"` sentinel rather than an error.
pub fn classify(user_agent: &str) -> DeviceInfo {
    DeviceInfo {
        platform: platform(user_agent),
        browser: browser(user_agent),
        version: version(user_agent),
    }
}

fn platform(user_agent: &str) -> String {
    for (token, label) in PLATFORM_TOKENS {
        if user_agent.contains(token) {
            return label.to_string();
        }
    }
    UNKNOWN.to_string()
}

fn browser(user_agent: &str) -> String {
    for token in BROWSER_TOKENS {
        if user_agent.contains(token) {
            return token.to_string();
        }
    }
    UNKNOWN.to_string()
}

fn version(user_agent: &str) -> String {
    for pattern in VERSION_PATTERNS {
        if let Some(v) = capture_first(user_agent, pattern) {
            return v;
        }
    }
    UNKNOWN.to_string()
}

fn capture_first(user_agent: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(user_agent)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Generate an opaque session identifier.
///
/// Composed from the current time plus a random base-36 suffix, which is
/// unique with overwhelming probability within a process lifetime. Used
/// only for correlating records of the same browser session; this is not
/// a security token.
pub fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}
