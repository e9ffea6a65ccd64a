use crate::error::Result;

/// One tick of converted IMU data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicalSample {
    pub accel: (f64, f64, f64), // (ax, ay, az) in m/s^2
    pub gyro: (f64, f64, f64),  // (p, q, r) in rad/s
}

pub trait AttitudeFilter {
    // accel in m/s^2
    // gyro in rad/s
    // deltat (time delta between update calls) in seconds
    // a rejected sample leaves the filter state untouched
    fn update(&mut self, imu_data: &PhysicalSample, deltat: f64) -> Result<()>;

    // (roll, pitch) in degrees
    fn get_euler_angles(&self) -> (f64, f64);

    // reset the filter to initial conditions
    fn reset(&mut self);
}
