pub mod login_activity;

pub use login_activity::{
    DeviceInfo, GeoFix, LocationInfo, LoginActivity, LoginMethod, LoginStats, MethodCounts,
    NewLoginActivity, ParseMethodError, UNKNOWN,
};
