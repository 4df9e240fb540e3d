//! Aggregate login statistics for dashboard consumption

use crate::models::{LoginMethod, LoginStats, MethodCounts};
use crate::persistence::StoreError;
use crate::recorder::LoginActivityRecorder;
use std::collections::HashSet;

/// How many of the sampled records the snapshot carries for display.
const RECENT_DISPLAY_COUNT: usize = 10;

/// Computes summary statistics over a bounded recent window of records.
pub struct ActivityAggregator {
    recorder: LoginActivityRecorder,
}

impl ActivityAggregator {
    pub fn new(recorder: LoginActivityRecorder) -> Self {
        ActivityAggregator { recorder }
    }

    /// Point-in-time snapshot over up to `sample_size` recent records.
    ///
    /// Staleness is bounded only by how often the caller re-invokes
    /// this; there is no live subscription. Read failures propagate so
    /// the consumer can render an error state and retry.
    pub fn stats(&self, sample_size: usize) -> Result<LoginStats, StoreError> {
        let activities = self.recorder.recent(sample_size)?;

        let mut successful = 0;
        let mut methods = MethodCounts::default();
        let mut users: HashSet<&str> = HashSet::new();

        for activity in &activities {
            if activity.success {
                successful += 1;
            }
            match activity.login_method {
                LoginMethod::Email => methods.email += 1,
                LoginMethod::Google => methods.google += 1,
                LoginMethod::Facebook => methods.facebook += 1,
                LoginMethod::Twitter => methods.twitter += 1,
            }
            if !activity.user_id.is_empty() {
                users.insert(activity.user_id.as_str());
            }
        }

        Ok(LoginStats {
            total_logins: activities.len(),
            successful_logins: successful,
            failed_logins: activities.len() - successful,
            unique_users: users.len(),
            login_methods: methods,
            recent_activities: activities
                .iter()
                .take(RECENT_DISPLAY_COUNT)
                .cloned()
                .collect(),
        })
    }
}
