pub mod config;
pub mod device;
pub mod location;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod recorder;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use location::{CoordinateSource, DetailedLocation, GeoOptions, LocationResolver};
pub use models::{
    DeviceInfo, LocationInfo, LoginActivity, LoginMethod, LoginStats, NewLoginActivity,
};
pub use persistence::{ActivityStore, SqliteActivityStore, StoreError};
pub use pipeline::{observe_login, LoginAttempt};
pub use recorder::LoginActivityRecorder;
pub use stats::ActivityAggregator;
