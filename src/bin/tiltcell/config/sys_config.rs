use tiltcell::drivers::imu::lsm6dsm::{AccelFullScaleSel, GyroFullScaleSel};
use tiltcell::filtering::ahrs::complementary::AttitudeState;

// Range the wrist prototype recorded with; see SensorScale for why
pub const ACCEL_FULL_SCALE: AccelFullScaleSel = AccelFullScaleSel::Gpm2;
pub const GYRO_FULL_SCALE: GyroFullScaleSel = GyroFullScaleSel::Dps125;

// Column names written by the per-subject table exporter
pub const ACCEL_COLUMNS: [&str; 3] = ["sigAcc_1", "sigAcc_2", "sigAcc_3"];
pub const GYRO_COLUMNS: [&str; 3] = ["sigGyro_1", "sigGyro_2", "sigGyro_3"];

pub const INITIAL_ATTITUDE: AttitudeState = AttitudeState::LEVEL;

pub const LOG_LEVEL_ENV: &str = "TILTCELL_LOG";
pub const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;
