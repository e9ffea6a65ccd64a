// LSM6DSM full-scale selections and sensitivities
// Datasheet: https://www.st.com/resource/en/datasheet/lsm6dsm.pdf
// Sensitivities are pre-multiplied into SI units (m/s^2 and rad/s per LSB).

// Accel full scale range in G's (plus or minus)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccelFullScaleSel {
    Gpm2,
    Gpm4,
    Gpm8,
    Gpm16,
}

// Gyro full scale range in degrees per second
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GyroFullScaleSel {
    Dps125,
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

// Datasheet mg/LSB figure times 9.80665e-3
pub const ACCEL_SCALE_MPS2_GPM2: f64 = 0.000598;
pub const ACCEL_SCALE_MPS2_GPM4: f64 = 0.001196;
pub const ACCEL_SCALE_MPS2_GPM8: f64 = 0.002392;
pub const ACCEL_SCALE_MPS2_GPM16: f64 = 0.004784;

pub const GYRO_SCALE_RPS_DPS125: f64 = 0.0000763;
pub const GYRO_SCALE_RPS_DPS250: f64 = 0.0001527;
pub const GYRO_SCALE_RPS_DPS500: f64 = 0.0003054;
pub const GYRO_SCALE_RPS_DPS1000: f64 = 0.0006109;
pub const GYRO_SCALE_RPS_DPS2000: f64 = 0.0012217;

// The recording firmware adds this to every count so that no value is negative
pub const RAW_ZERO_OFFSET: i32 = 32768;

impl AccelFullScaleSel {
    pub fn scale(self) -> f64 {
        match self {
            AccelFullScaleSel::Gpm2 => ACCEL_SCALE_MPS2_GPM2,
            AccelFullScaleSel::Gpm4 => ACCEL_SCALE_MPS2_GPM4,
            AccelFullScaleSel::Gpm8 => ACCEL_SCALE_MPS2_GPM8,
            AccelFullScaleSel::Gpm16 => ACCEL_SCALE_MPS2_GPM16,
        }
    }
}

impl GyroFullScaleSel {
    pub fn scale(self) -> f64 {
        match self {
            GyroFullScaleSel::Dps125 => GYRO_SCALE_RPS_DPS125,
            GyroFullScaleSel::Dps250 => GYRO_SCALE_RPS_DPS250,
            GyroFullScaleSel::Dps500 => GYRO_SCALE_RPS_DPS500,
            GyroFullScaleSel::Dps1000 => GYRO_SCALE_RPS_DPS1000,
            GyroFullScaleSel::Dps2000 => GYRO_SCALE_RPS_DPS2000,
        }
    }
}
