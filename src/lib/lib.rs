//! Roll/pitch estimation for wearable inertial sensors.
//!
//! Raw LSM6DSM counts are converted to physical units, optionally band-limited
//! with zero-phase Butterworth filters, and fused by a complementary filter into
//! per-sample roll and pitch angles.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod pipeline;

pub mod drivers {
    pub mod imu {
        pub mod lsm6dsm;
        pub mod lsm6dsm_constants;
    }
}

pub mod filtering {
    pub mod ahrs {
        pub mod ahrs_filter;
        pub mod complementary;
    }
    pub mod butterworth;
    pub mod filter_bank;
    pub mod spectrum;
    pub mod zero_phase;
}

pub use config::AttitudeEstimatorConfig;
pub use error::{AttitudeError, Result};
