// Complementary roll/pitch filter
// Gyro rates are rotated into Euler angle rates using the accelerometer tilt
// of the same tick, integrated over one timestep and blended with the
// accelerometer tilt itself.
// Background: https://www.youtube.com/watch?v=BUW2OdAtzBw

pub use crate::filtering::ahrs::ahrs_filter::*;

use crate::error::{AttitudeError, Channel, InstabilityReason, Result};
use alloc::vec::Vec;
use core::f64::consts::PI;
use libm::{atan, cos, sin, tan};

const RAD_TO_DEG: f64 = 180.0 / PI;
pub const GRAVITY_MPS2: f64 = 9.81;
pub const DEFAULT_ALPHA: f64 = 0.05; // 5% accelerometer, 95% gyro integration

/// Readings with `|az|` below this (m/s^2) are rejected; the roll tilt
/// `atan(ay / az)` is meaningless for a device in free fall or edge-on.
pub const AZ_MIN_MAGNITUDE: f64 = 1e-6;

/// Roll (phi) and pitch (theta) estimate in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeState {
    pub phi_rad: f64,
    pub theta_rad: f64,
}

impl AttitudeState {
    pub const LEVEL: AttitudeState = AttitudeState {
        phi_rad: 0.0,
        theta_rad: 0.0,
    };

    pub fn new(phi_rad: f64, theta_rad: f64) -> Self {
        Self { phi_rad, theta_rad }
    }

    // (roll, pitch) in degrees
    pub fn to_degrees(self) -> (f64, f64) {
        (self.phi_rad * RAD_TO_DEG, self.theta_rad * RAD_TO_DEG)
    }
}

/// Per-tick `(roll_deg, pitch_deg)`, index aligned with the input samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttitudeSeries(Vec<(f64, f64)>);

impl AttitudeSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, angles: (f64, f64)) {
        self.0.push(angles);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, (f64, f64)> {
        self.0.iter()
    }

    pub fn roll_deg(&self) -> Vec<f64> {
        self.0.iter().map(|a| a.0).collect()
    }

    pub fn pitch_deg(&self) -> Vec<f64> {
        self.0.iter().map(|a| a.1).collect()
    }

    pub fn into_inner(self) -> Vec<(f64, f64)> {
        self.0
    }
}

impl core::ops::Index<usize> for AttitudeSeries {
    type Output = (f64, f64);

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a AttitudeSeries {
    type Item = &'a (f64, f64);
    type IntoIter = core::slice::Iter<'a, (f64, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub struct ComplementaryFilter {
    state: AttitudeState,
    initial: AttitudeState,
    alpha: f64, // accelerometer weight
}

impl ComplementaryFilter {
    /// `alpha` is the accelerometer share of each blended estimate, in [0, 1].
    /// There is no generally correct starting attitude; seed with
    /// [`AttitudeState::LEVEL`] when nothing is known about the placement.
    pub fn new(alpha: f64, initial: AttitudeState) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AttitudeError::InvalidConfig {
                option: "fusion_weight",
                reason: "must be within [0, 1]",
            });
        }
        Ok(Self {
            state: initial,
            initial,
            alpha,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn state(&self) -> AttitudeState {
        self.state
    }

    /// Runs the filter over six equal-length channels.
    ///
    /// The timestep and all samples are checked before the state is touched,
    /// so an error means no output and an unchanged filter.
    pub fn estimate(
        &mut self,
        accel: (&[f64], &[f64], &[f64]),
        gyro: (&[f64], &[f64], &[f64]),
        deltat: f64,
    ) -> Result<AttitudeSeries> {
        check_timestep(deltat)?;
        let len = accel.0.len();
        let channels = [
            (Channel::AccelX, accel.0),
            (Channel::AccelY, accel.1),
            (Channel::AccelZ, accel.2),
            (Channel::GyroX, gyro.0),
            (Channel::GyroY, gyro.1),
            (Channel::GyroZ, gyro.2),
        ];
        for (channel, values) in channels {
            if values.len() != len {
                return Err(AttitudeError::LengthMismatch {
                    channel,
                    expected: len,
                    found: values.len(),
                });
            }
        }

        let sample = |i: usize| PhysicalSample {
            accel: (accel.0[i], accel.1[i], accel.2[i]),
            gyro: (gyro.0[i], gyro.1[i], gyro.2[i]),
        };
        for index in 0..len {
            check_sample(&sample(index)).map_err(|reason| {
                AttitudeError::NumericalInstability { index, reason }
            })?;
        }

        log::debug!(
            "complementary filter over {} samples, alpha {}, dt {}",
            len,
            self.alpha,
            deltat
        );
        let mut series = AttitudeSeries::with_capacity(len);
        for index in 0..len {
            self.state = self.step(&sample(index), deltat);
            series.push(self.state.to_degrees());
        }
        Ok(series)
    }

    fn step(&self, imu_data: &PhysicalSample, deltat: f64) -> AttitudeState {
        let (ax, ay, az) = imu_data.accel;
        let (p, q, r) = imu_data.gyro;

        // Tilt from gravity alone
        let phi_acc = atan(ay / az);
        let theta_acc = atan(ax / GRAVITY_MPS2);

        // Body rates to Euler rates, linearised around the accelerometer tilt
        let (sin_phi, cos_phi) = (sin(phi_acc), cos(phi_acc));
        let phi_dot = p + tan(theta_acc) * (sin_phi * q + cos_phi * r);
        let theta_dot = cos_phi * q - sin_phi * r;

        let blend = |acc: f64, prev: f64, rate: f64| {
            self.alpha * acc + (1.0 - self.alpha) * (prev + rate * deltat)
        };
        AttitudeState {
            phi_rad: blend(phi_acc, self.state.phi_rad, phi_dot),
            theta_rad: blend(theta_acc, self.state.theta_rad, theta_dot),
        }
    }
}

impl AttitudeFilter for ComplementaryFilter {
    fn update(&mut self, imu_data: &PhysicalSample, deltat: f64) -> Result<()> {
        check_timestep(deltat)?;
        check_sample(imu_data).map_err(AttitudeError::RejectedSample)?;
        self.state = self.step(imu_data, deltat);
        Ok(())
    }

    fn get_euler_angles(&self) -> (f64, f64) {
        self.state.to_degrees()
    }

    fn reset(&mut self) {
        self.state = self.initial;
    }
}

fn check_timestep(deltat: f64) -> Result<()> {
    if deltat.is_finite() && deltat > 0.0 {
        Ok(())
    } else {
        Err(AttitudeError::InvalidTimestep(deltat))
    }
}

fn check_sample(imu_data: &PhysicalSample) -> core::result::Result<(), InstabilityReason> {
    let (ax, ay, az) = imu_data.accel;
    let (p, q, r) = imu_data.gyro;
    if [ax, ay, az, p, q, r].iter().any(|v| !v.is_finite()) {
        return Err(InstabilityReason::NonFinite);
    }
    if az.abs() < AZ_MIN_MAGNITUDE {
        return Err(InstabilityReason::AccelZNearZero);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 50.0;

    fn at_rest() -> PhysicalSample {
        PhysicalSample {
            accel: (0.0, 0.0, GRAVITY_MPS2),
            gyro: (0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn motionless_two_tick_stream_stays_level() {
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::LEVEL).unwrap();
        let zeros = [0.0, 0.0];
        let az = [9.81, 9.81];
        let series = filter
            .estimate((&zeros, &zeros, &az), (&zeros, &zeros, &zeros), DT)
            .unwrap();
        assert_eq!(series.into_inner(), vec![(0.0, 0.0), (0.0, 0.0)]);
    }

    #[test]
    fn error_decays_by_one_minus_alpha_per_tick() {
        let alpha = 0.05;
        let initial = AttitudeState::new(0.5, -0.3);
        let mut filter = ComplementaryFilter::new(alpha, initial).unwrap();
        let mut expected = initial;
        for _ in 0..200 {
            filter.update(&at_rest(), DT).unwrap();
            expected.phi_rad *= 1.0 - alpha;
            expected.theta_rad *= 1.0 - alpha;
            let state = filter.state();
            assert!((state.phi_rad - expected.phi_rad).abs() < 1e-12);
            assert!((state.theta_rad - expected.theta_rad).abs() < 1e-12);
        }
        let (roll, pitch) = filter.get_euler_angles();
        assert!(roll.abs() < 0.01 && pitch.abs() < 0.01, "({}, {})", roll, pitch);
    }

    #[test]
    fn pure_roll_rate_integrates_once_per_timestep() {
        // alpha = 0 trusts the gyro alone: phi grows by p * dt every tick
        let mut filter = ComplementaryFilter::new(0.0, AttitudeState::LEVEL).unwrap();
        let sample = PhysicalSample {
            accel: (0.0, 0.0, GRAVITY_MPS2),
            gyro: (0.5, 0.0, 0.0),
        };
        for _ in 0..10 {
            filter.update(&sample, DT).unwrap();
        }
        assert!((filter.state().phi_rad - 0.1).abs() < 1e-12);
        assert_eq!(filter.state().theta_rad, 0.0);
    }

    #[test]
    fn alpha_one_follows_accelerometer() {
        let mut filter = ComplementaryFilter::new(1.0, AttitudeState::new(1.0, 1.0)).unwrap();
        let sample = PhysicalSample {
            accel: (GRAVITY_MPS2, 1.0, 1.0),
            gyro: (3.0, -2.0, 1.0),
        };
        filter.update(&sample, DT).unwrap();
        let (roll, pitch) = filter.get_euler_angles();
        assert!((roll - 45.0).abs() < 1e-9, "roll {}", roll);
        assert!((pitch - 45.0).abs() < 1e-9, "pitch {}", pitch);
    }

    #[test]
    fn mismatched_channels_are_rejected_without_output() {
        let mut filter =
            ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::new(0.2, 0.1)).unwrap();
        let three = [0.0; 3];
        let two = [0.0; 2];
        let az = [9.81; 3];
        let err = filter
            .estimate((&three, &three, &az), (&three, &two, &three), DT)
            .unwrap_err();
        assert_eq!(
            err,
            AttitudeError::LengthMismatch {
                channel: Channel::GyroY,
                expected: 3,
                found: 2
            }
        );
        assert_eq!(filter.state(), AttitudeState::new(0.2, 0.1));
    }

    #[test]
    fn zero_az_is_reported_before_any_tick_runs() {
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::LEVEL).unwrap();
        let zeros = [0.0; 3];
        let az = [9.81, 0.0, 9.81];
        let err = filter
            .estimate((&zeros, &zeros, &az), (&zeros, &zeros, &zeros), DT)
            .unwrap_err();
        assert_eq!(
            err,
            AttitudeError::NumericalInstability {
                index: 1,
                reason: InstabilityReason::AccelZNearZero
            }
        );
        assert_eq!(filter.state(), AttitudeState::LEVEL);
    }

    #[test]
    fn non_finite_update_leaves_state_alone() {
        let mut filter =
            ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::new(0.3, 0.0)).unwrap();
        let bad = PhysicalSample {
            accel: (0.0, f64::NAN, 9.81),
            gyro: (0.0, 0.0, 0.0),
        };
        assert_eq!(
            filter.update(&bad, DT),
            Err(AttitudeError::RejectedSample(InstabilityReason::NonFinite))
        );
        assert_eq!(filter.state(), AttitudeState::new(0.3, 0.0));
    }

    #[test]
    fn streamed_zero_az_is_rejected_without_an_index() {
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::LEVEL).unwrap();
        filter.update(&at_rest(), DT).unwrap();
        let edge_on = PhysicalSample {
            accel: (0.0, 9.81, 0.0),
            gyro: (0.0, 0.0, 0.0),
        };
        assert_eq!(
            filter.update(&edge_on, DT),
            Err(AttitudeError::RejectedSample(
                InstabilityReason::AccelZNearZero
            ))
        );
    }

    #[test]
    fn alpha_outside_unit_interval_is_refused() {
        for alpha in [-0.1, 1.5, f64::NAN] {
            assert!(
                matches!(
                    ComplementaryFilter::new(alpha, AttitudeState::LEVEL),
                    Err(AttitudeError::InvalidConfig {
                        option: "fusion_weight",
                        ..
                    })
                ),
                "alpha {}",
                alpha
            );
        }
        assert!(ComplementaryFilter::new(0.0, AttitudeState::LEVEL).is_ok());
        assert!(ComplementaryFilter::new(1.0, AttitudeState::LEVEL).is_ok());
    }

    #[test]
    fn bad_timestep_is_refused_before_any_tick() {
        let seed = AttitudeState::new(0.2, -0.1);
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, seed).unwrap();
        let zeros = [0.0; 2];
        let az = [9.81; 2];
        for dt in [0.0, -DT, f64::NAN, f64::INFINITY] {
            let result = filter.estimate((&zeros, &zeros, &az), (&zeros, &zeros, &zeros), dt);
            assert!(
                matches!(result, Err(AttitudeError::InvalidTimestep(_))),
                "dt {}",
                dt
            );
            assert!(matches!(
                filter.update(&at_rest(), dt),
                Err(AttitudeError::InvalidTimestep(_))
            ));
        }
        assert_eq!(filter.state(), seed);
    }

    #[test]
    fn reset_restores_seed() {
        let seed = AttitudeState::new(0.4, -0.2);
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, seed).unwrap();
        filter.update(&at_rest(), DT).unwrap();
        assert_ne!(filter.state(), seed);
        filter.reset();
        assert_eq!(filter.state(), seed);
    }

    #[test]
    fn empty_stream_gives_empty_series() {
        let mut filter = ComplementaryFilter::new(DEFAULT_ALPHA, AttitudeState::LEVEL).unwrap();
        let empty: [f64; 0] = [];
        let series = filter
            .estimate((&empty, &empty, &empty), (&empty, &empty, &empty), DT)
            .unwrap();
        assert!(series.is_empty());
    }
}
