//! Raw counts to roll/pitch in one call.
//!
//! Every stage is a pure function of its inputs, so separate recordings can be
//! processed on separate threads without sharing anything.

use crate::config::AttitudeEstimatorConfig;
use crate::drivers::imu::lsm6dsm::{SensorKind, UnitConverter};
use crate::error::{AttitudeError, Channel, Result};
use crate::filtering::ahrs::complementary::{AttitudeSeries, AttitudeState, ComplementaryFilter};
use crate::filtering::butterworth::FilterSpec;
use crate::filtering::filter_bank::DigitalFilterBank;
use alloc::vec::Vec;

/// Column-oriented raw counts, `(ax, ay, az)` and `(p, q, r)`.
#[derive(Debug, Clone, Copy)]
pub struct RawChannels<'a> {
    pub accel: (&'a [i32], &'a [i32], &'a [i32]),
    pub gyro: (&'a [i32], &'a [i32], &'a [i32]),
}

impl<'a> RawChannels<'a> {
    pub fn len(&self) -> usize {
        self.accel.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accel.0.is_empty()
    }

    fn check_lengths(&self) -> Result<()> {
        let len = self.len();
        let channels = [
            (Channel::AccelY, self.accel.1.len()),
            (Channel::AccelZ, self.accel.2.len()),
            (Channel::GyroX, self.gyro.0.len()),
            (Channel::GyroY, self.gyro.1.len()),
            (Channel::GyroZ, self.gyro.2.len()),
        ];
        match channels.iter().find(|(_, found)| *found != len) {
            Some(&(channel, found)) => Err(AttitudeError::LengthMismatch {
                channel,
                expected: len,
                found,
            }),
            None => Ok(()),
        }
    }
}

/// Channels in m/s^2 and rad/s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicalChannels {
    pub accel: (Vec<f64>, Vec<f64>, Vec<f64>),
    pub gyro: (Vec<f64>, Vec<f64>, Vec<f64>),
}

impl PhysicalChannels {
    pub fn len(&self) -> usize {
        self.accel.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accel.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditioning {
    None,
    /// Gyro channels through the configured filter, accelerometer channels
    /// through a low-pass at the configured low-pass cutoff so gravity is kept.
    Filtered,
}

pub fn convert_channels(
    raw: &RawChannels<'_>,
    converter: &UnitConverter,
    zero_corrected: bool,
) -> Result<PhysicalChannels> {
    raw.check_lengths()?;
    let accel = |c: &[i32]| converter.convert_channel(c, SensorKind::Accel, zero_corrected);
    let gyro = |c: &[i32]| converter.convert_channel(c, SensorKind::Gyro, zero_corrected);
    Ok(PhysicalChannels {
        accel: (accel(raw.accel.0), accel(raw.accel.1), accel(raw.accel.2)),
        gyro: (gyro(raw.gyro.0), gyro(raw.gyro.1), gyro(raw.gyro.2)),
    })
}

pub fn condition_channels(
    channels: &PhysicalChannels,
    config: &AttitudeEstimatorConfig,
) -> Result<PhysicalChannels> {
    let bank = DigitalFilterBank::new();
    let gyro_spec = config.filter_spec()?;
    let accel_spec = FilterSpec::lowpass(
        config.filter_order(),
        config.lowpass_cutoff(),
        config.sampling_rate(),
    )?;

    let accel = |c: &[f64]| bank.apply(c, &accel_spec);
    let gyro = |c: &[f64]| bank.apply(c, &gyro_spec);
    Ok(PhysicalChannels {
        accel: (
            accel(&channels.accel.0)?,
            accel(&channels.accel.1)?,
            accel(&channels.accel.2)?,
        ),
        gyro: (
            gyro(&channels.gyro.0)?,
            gyro(&channels.gyro.1)?,
            gyro(&channels.gyro.2)?,
        ),
    })
}

pub fn estimate_physical(
    channels: &PhysicalChannels,
    config: &AttitudeEstimatorConfig,
    initial: AttitudeState,
) -> Result<AttitudeSeries> {
    let mut filter = ComplementaryFilter::new(config.fusion_weight(), initial)?;
    filter.estimate(
        (&channels.accel.0, &channels.accel.1, &channels.accel.2),
        (&channels.gyro.0, &channels.gyro.1, &channels.gyro.2),
        config.timestep(),
    )
}

/// Converts, optionally conditions, and fuses one recording.
pub fn estimate_attitude(
    raw: &RawChannels<'_>,
    config: &AttitudeEstimatorConfig,
    converter: &UnitConverter,
    zero_corrected: bool,
    conditioning: Conditioning,
    initial: AttitudeState,
) -> Result<AttitudeSeries> {
    let physical = convert_channels(raw, converter, zero_corrected)?;
    let physical = match conditioning {
        Conditioning::None => physical,
        Conditioning::Filtered => condition_channels(&physical, config)?,
    };
    estimate_physical(&physical, config, initial)
}
