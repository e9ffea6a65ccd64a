// LSM6DSM raw count conversion
// The wearable records 16 bit accelerometer and gyroscope counts, either zero
// corrected (signed) or shifted up by RAW_ZERO_OFFSET (unsigned).

pub use crate::drivers::imu::lsm6dsm_constants::*;
pub use crate::filtering::ahrs::ahrs_filter::PhysicalSample;

use alloc::vec::Vec;

/// One tick of raw digital counts, `(ax, ay, az)` and `(p, q, r)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    pub accel: (i32, i32, i32),
    pub gyro: (i32, i32, i32),
}

/// Which conversion factor a channel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Accel,
    Gyro,
}

/// Conversion factors for one sensor configuration.
///
/// The factors depend on the full-scale range the device was recording with,
/// which the recordings do not carry. The default (±2 g, ±125 °/s) is the only
/// range under which a resting device reads ~9.8 m/s² on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorScale {
    pub accel_mps2_per_lsb: f64,
    pub gyro_rps_per_lsb: f64,
    pub zero_offset: i32,
}

impl SensorScale {
    pub fn new(accel: AccelFullScaleSel, gyro: GyroFullScaleSel) -> Self {
        Self {
            accel_mps2_per_lsb: accel.scale(),
            gyro_rps_per_lsb: gyro.scale(),
            zero_offset: RAW_ZERO_OFFSET,
        }
    }

    /// Factors that do not correspond to any datasheet range.
    pub fn custom(accel_mps2_per_lsb: f64, gyro_rps_per_lsb: f64, zero_offset: i32) -> Self {
        Self {
            accel_mps2_per_lsb,
            gyro_rps_per_lsb,
            zero_offset,
        }
    }

    pub fn factor(&self, kind: SensorKind) -> f64 {
        match kind {
            SensorKind::Accel => self.accel_mps2_per_lsb,
            SensorKind::Gyro => self.gyro_rps_per_lsb,
        }
    }
}

impl Default for SensorScale {
    fn default() -> Self {
        SensorScale::new(AccelFullScaleSel::Gpm2, GyroFullScaleSel::Dps125)
    }
}

/// Stateless raw-count to SI conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitConverter {
    scale: SensorScale,
}

impl UnitConverter {
    pub fn new(scale: SensorScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> &SensorScale {
        &self.scale
    }

    /// Converts a single count. Without `zero_corrected` the firmware offset is
    /// removed first.
    pub fn convert_value(&self, raw: i32, kind: SensorKind, zero_corrected: bool) -> f64 {
        let counts = if zero_corrected {
            i64::from(raw)
        } else {
            i64::from(raw) - i64::from(self.scale.zero_offset)
        };
        counts as f64 * self.scale.factor(kind)
    }

    // returns (ax, ay, az) in m/s^2
    pub fn convert_accel(&self, raw: (i32, i32, i32), zero_corrected: bool) -> (f64, f64, f64) {
        self.convert_triple(raw, SensorKind::Accel, zero_corrected)
    }

    // returns (p, q, r) in rad/s
    pub fn convert_gyro(&self, raw: (i32, i32, i32), zero_corrected: bool) -> (f64, f64, f64) {
        self.convert_triple(raw, SensorKind::Gyro, zero_corrected)
    }

    pub fn convert(&self, raw: &RawSample, zero_corrected: bool) -> PhysicalSample {
        PhysicalSample {
            accel: self.convert_accel(raw.accel, zero_corrected),
            gyro: self.convert_gyro(raw.gyro, zero_corrected),
        }
    }

    /// Converts a whole column, keeping order and length.
    pub fn convert_channel(&self, raw: &[i32], kind: SensorKind, zero_corrected: bool) -> Vec<f64> {
        raw.iter()
            .map(|&count| self.convert_value(count, kind, zero_corrected))
            .collect()
    }

    fn convert_triple(
        &self,
        raw: (i32, i32, i32),
        kind: SensorKind,
        zero_corrected: bool,
    ) -> (f64, f64, f64) {
        (
            self.convert_value(raw.0, kind, zero_corrected),
            self.convert_value(raw.1, kind, zero_corrected),
            self.convert_value(raw.2, kind, zero_corrected),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_corrected_counts_scale_directly() {
        let converter = UnitConverter::default();
        let (ax, ay, az) = converter.convert_accel((0, -100, 16_400), true);
        assert_eq!(ax, 0.0);
        assert!((ay + 0.0598).abs() < 1e-12, "ay = {}", ay);
        assert!((az - 9.8072).abs() < 1e-9, "az = {}", az);
    }

    #[test]
    fn offset_counts_match_zero_corrected_counts() {
        let converter = UnitConverter::default();
        for raw in [0, 1, 12_345, 32_767, 32_768, 32_769, 49_152, 65_535] {
            for kind in [SensorKind::Accel, SensorKind::Gyro] {
                let shifted = converter.convert_value(raw, kind, false);
                let corrected = converter.convert_value(raw - RAW_ZERO_OFFSET, kind, true);
                assert_eq!(shifted, corrected, "raw {} {:?}", raw, kind);
            }
        }
    }

    #[test]
    fn offset_midpoint_is_zero() {
        let converter = UnitConverter::default();
        let sample = RawSample {
            accel: (32_768, 32_768, 32_768),
            gyro: (32_768, 32_768, 32_768),
        };
        let physical = converter.convert(&sample, false);
        assert_eq!(physical, PhysicalSample::default());
    }

    #[test]
    fn full_scale_selection_changes_factor() {
        let converter = UnitConverter::new(SensorScale::new(
            AccelFullScaleSel::Gpm16,
            GyroFullScaleSel::Dps2000,
        ));
        let (ax, _, _) = converter.convert_accel((1000, 0, 0), true);
        let (p, _, _) = converter.convert_gyro((1000, 0, 0), true);
        assert!((ax - 4.784).abs() < 1e-12);
        assert!((p - 1.2217).abs() < 1e-12);
    }

    #[test]
    fn channel_conversion_preserves_order() {
        let converter = UnitConverter::new(SensorScale::custom(2.0, 0.5, 10));
        let converted = converter.convert_channel(&[10, 11, 9], SensorKind::Accel, false);
        assert_eq!(converted, vec![0.0, 2.0, -2.0]);
        let converted = converter.convert_channel(&[4, -4], SensorKind::Gyro, true);
        assert_eq!(converted, vec![2.0, -2.0]);
    }
}
