//! The login observation pipeline
//!
//! Ties the pieces together for callers of an auth flow: fingerprint
//! the user agent, resolve the location best-effort, and append the
//! audit record. Login success or failure is decided by the auth
//! provider alone; this pipeline only observes the outcome.

use crate::device;
use crate::location::{CoordinateSource, LocationResolver};
use crate::models::{LoginMethod, NewLoginActivity};
use crate::persistence::StoreError;
use crate::recorder::LoginActivityRecorder;

/// The outcome of one authentication attempt, as reported by the caller.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    /// Empty when no account was resolved for a failed attempt.
    pub user_id: String,
    pub email: String,
    pub method: LoginMethod,
    pub success: bool,
    pub error_message: Option<String>,
    pub user_agent: Option<String>,
}

/// Observe one login attempt: fingerprint, resolve, record.
///
/// Fingerprinting is synchronous and runs before resolution; the two
/// stages are sequential within one attempt. Location resolution never
/// fails the pipeline. Persistence errors propagate; callers should
/// log and continue rather than let a telemetry failure block the auth
/// flow being recorded.
pub async fn observe_login(
    recorder: &LoginActivityRecorder,
    resolver: &LocationResolver,
    coords: Option<&dyn CoordinateSource>,
    attempt: LoginAttempt,
) -> Result<String, StoreError> {
    let device_info = attempt.user_agent.as_deref().map(device::classify);
    let session_id = device::generate_session_id();

    let location = resolver.resolve(coords).await;

    let activity = NewLoginActivity {
        user_id: attempt.user_id,
        email: attempt.email,
        login_method: attempt.method,
        success: attempt.success,
        error_message: attempt.error_message,
        ip_address: Some(location.ip.clone()),
        user_agent: attempt.user_agent,
        session_id: Some(session_id),
        device_info,
        location: Some(location),
    };

    recorder.record(&activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeolocationConfig, ProviderConfig, ResolverConfig};
    use crate::location::ProviderKind;
    use crate::models::UNKNOWN;
    use crate::persistence::SqliteActivityStore;
    use std::sync::Arc;

    fn offline_resolver() -> LocationResolver {
        LocationResolver::new(&ResolverConfig {
            overall_deadline_ms: 5000,
            reverse_geocode_url: "http://127.0.0.1:9/reverse".to_string(),
            ip_lookup_url: "http://127.0.0.1:9/ip".to_string(),
            providers: vec![ProviderConfig {
                kind: ProviderKind::IpapiCo,
                url: "http://127.0.0.1:9/a".to_string(),
                timeout_ms: 500,
            }],
            geolocation: GeolocationConfig {
                high_accuracy: true,
                timeout_ms: 500,
                maximum_age_ms: 300_000,
            },
        })
    }

    #[tokio::test]
    async fn test_observe_login_records_full_attempt() {
        let store = Arc::new(SqliteActivityStore::in_memory().unwrap());
        let recorder = LoginActivityRecorder::new(store);
        let resolver = offline_resolver();

        let id = observe_login(
            &recorder,
            &resolver,
            None,
            LoginAttempt {
                user_id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                method: LoginMethod::Google,
                success: true,
                error_message: None,
                user_agent: Some(
                    "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0.0.0 Safari/537.36".to_string(),
                ),
            },
        )
        .await
        .unwrap();
        assert!(!id.is_empty());

        let recorded = recorder.recent(10).unwrap();
        assert_eq!(recorded.len(), 1);
        let activity = &recorded[0];

        assert_eq!(activity.user_id, "u1");
        assert_eq!(activity.login_method, LoginMethod::Google);
        assert!(activity.success);
        assert!(activity
            .session_id
            .as_deref()
            .unwrap()
            .starts_with("session_"));

        let device = activity.device_info.as_ref().unwrap();
        assert_eq!(device.platform, "Windows");
        assert_eq!(device.browser, "Chrome");

        // Resolution was offline; location degrades, never blocks.
        let location = activity.location.as_ref().unwrap();
        assert_eq!(location.ip, UNKNOWN);
        assert_eq!(activity.ip_address.as_deref(), Some(UNKNOWN));
    }

    #[tokio::test]
    async fn test_observe_failed_login_without_account() {
        let store = Arc::new(SqliteActivityStore::in_memory().unwrap());
        let recorder = LoginActivityRecorder::new(store);
        let resolver = offline_resolver();

        observe_login(
            &recorder,
            &resolver,
            None,
            LoginAttempt {
                user_id: String::new(),
                email: "unknown@example.com".to_string(),
                method: LoginMethod::Email,
                success: false,
                error_message: Some("user not found".to_string()),
                user_agent: None,
            },
        )
        .await
        .unwrap();

        let recorded = recorder.recent(10).unwrap();
        let activity = &recorded[0];
        assert!(activity.user_id.is_empty());
        assert!(!activity.success);
        assert_eq!(activity.error_message.as_deref(), Some("user not found"));
        assert!(activity.device_info.is_none());
        assert!(activity.user_agent.is_none());
    }
}
