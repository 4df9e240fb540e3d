//! Login activity recording and read paths
//!
//! Thin layer over an [`ActivityStore`] handle. Holds no state beyond
//! the handle itself, so it is safe to clone freely or construct per
//! call. Recency ordering happens here, in-process after fetch, because
//! the store's read queries deliberately carry no storage-side sort.

use crate::models::{LoginActivity, NewLoginActivity};
use crate::persistence::{ActivityStore, StoreError};
use std::sync::Arc;

/// Records and reads login activity through an explicit store handle.
#[derive(Clone)]
pub struct LoginActivityRecorder {
    store: Arc<dyn ActivityStore>,
}

impl LoginActivityRecorder {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        LoginActivityRecorder { store }
    }

    /// Append one activity record; returns the store-assigned id.
    ///
    /// Store errors propagate unchanged. Callers recording as a side
    /// effect of an auth flow are expected to catch and log at the call
    /// site so a logging failure never blocks the login itself.
    pub fn record(&self, activity: &NewLoginActivity) -> Result<String, StoreError> {
        self.store.record(activity)
    }

    /// Per-user history, most recent first.
    pub fn by_user(&self, user_id: &str, limit: usize) -> Result<Vec<LoginActivity>, StoreError> {
        let mut activities = self.store.by_user(user_id, limit)?;
        sort_recent_first(&mut activities);
        Ok(activities)
    }

    /// Global history for administrative review, most recent first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LoginActivity>, StoreError> {
        let mut activities = self.store.recent(limit)?;
        sort_recent_first(&mut activities);
        Ok(activities)
    }
}

fn sort_recent_first(activities: &mut [LoginActivity]) {
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
