//! Estimator configuration.
//!
//! A plain value type: copy it into whatever needs it. Updates never mutate
//! the original, they produce a new config plus any warnings.

use crate::error::{AttitudeError, Result};
use crate::filtering::ahrs::complementary::DEFAULT_ALPHA;
use crate::filtering::butterworth::{FilterSpec, FilterType};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 50.0;
pub const DEFAULT_FILTER_TYPE: FilterType = FilterType::Band;
pub const DEFAULT_FILTER_ORDER: usize = 4;
pub const DEFAULT_HIGHPASS_CUTOFF_HZ: f64 = 0.2;
pub const DEFAULT_LOWPASS_CUTOFF_HZ: f64 = 15.0;

/// Option names accepted by [`AttitudeEstimatorConfig::update`], in display order.
pub const OPTION_NAMES: [&str; 6] = [
    "sampling_rate",
    "filter_type",
    "filter_order",
    "highpass_cutoff",
    "lowpass_cutoff",
    "fusion_weight",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeEstimatorConfig {
    sampling_rate: f64,
    filter_type: FilterType,
    filter_order: usize,
    highpass_cutoff: f64,
    lowpass_cutoff: f64,
    fusion_weight: f64,
}

/// An option name that `update` did not recognize. Not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
    pub name: String,
}

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid configuration option", self.name)
    }
}

/// Result of a bulk update.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub config: AttitudeEstimatorConfig,
    pub warnings: Vec<UnknownOption>,
}

impl AttitudeEstimatorConfig {
    pub fn new(
        sampling_rate: f64,
        filter_type: FilterType,
        filter_order: usize,
        highpass_cutoff: f64,
        lowpass_cutoff: f64,
        fusion_weight: f64,
    ) -> Result<Self> {
        let config = Self {
            sampling_rate,
            filter_type,
            filter_order,
            highpass_cutoff,
            lowpass_cutoff,
            fusion_weight,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn filter_order(&self) -> usize {
        self.filter_order
    }

    pub fn highpass_cutoff(&self) -> f64 {
        self.highpass_cutoff
    }

    pub fn lowpass_cutoff(&self) -> f64 {
        self.lowpass_cutoff
    }

    pub fn fusion_weight(&self) -> f64 {
        self.fusion_weight
    }

    /// Seconds between samples.
    pub fn timestep(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// The configured filter, checked against the Nyquist frequency.
    pub fn filter_spec(&self) -> Result<FilterSpec> {
        let cutoffs = match self.filter_type {
            FilterType::Low => [self.lowpass_cutoff, 0.0],
            FilterType::High => [self.highpass_cutoff, 0.0],
            FilterType::Band => [self.highpass_cutoff, self.lowpass_cutoff],
        };
        FilterSpec::new(
            self.filter_type,
            self.filter_order,
            &cutoffs[..self.filter_type.cutoff_count()],
            self.sampling_rate,
        )
    }

    /// Applies `(name, value)` pairs on top of this config.
    ///
    /// Unrecognized names are logged and returned as warnings; a recognized
    /// name with a bad value fails the whole update. Later pairs win.
    pub fn update<'a, I>(&self, options: I) -> Result<ConfigUpdate>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = *self;
        let mut warnings = Vec::new();

        for (name, value) in options {
            let value = value.trim();
            match name {
                "sampling_rate" => config.sampling_rate = parse_f64("sampling_rate", value)?,
                "filter_type" => {
                    config.filter_type = value.parse().map_err(|_| AttitudeError::InvalidConfig {
                        option: "filter_type",
                        reason: "expected low, high or band",
                    })?
                }
                "filter_order" => {
                    config.filter_order =
                        value.parse().map_err(|_| AttitudeError::InvalidConfig {
                            option: "filter_order",
                            reason: "expected a positive integer",
                        })?
                }
                "highpass_cutoff" => {
                    config.highpass_cutoff = parse_f64("highpass_cutoff", value)?
                }
                "lowpass_cutoff" => config.lowpass_cutoff = parse_f64("lowpass_cutoff", value)?,
                "fusion_weight" => config.fusion_weight = parse_f64("fusion_weight", value)?,
                _ => {
                    log::warn!("{} is not a valid configuration option", name);
                    warnings.push(UnknownOption {
                        name: name.to_string(),
                    });
                }
            }
        }

        config.validate()?;
        Ok(ConfigUpdate { config, warnings })
    }

    /// Every field as `(name, value)` text, in display order. Feeding the
    /// pairs back through [`Self::update`] reproduces the config.
    pub fn options(&self) -> [(&'static str, String); 6] {
        [
            (OPTION_NAMES[0], self.sampling_rate.to_string()),
            (OPTION_NAMES[1], self.filter_type.to_string()),
            (OPTION_NAMES[2], self.filter_order.to_string()),
            (OPTION_NAMES[3], self.highpass_cutoff.to_string()),
            (OPTION_NAMES[4], self.lowpass_cutoff.to_string()),
            (OPTION_NAMES[5], self.fusion_weight.to_string()),
        ]
    }

    fn validate(&self) -> Result<()> {
        let invalid = |option, reason| Err(AttitudeError::InvalidConfig { option, reason });
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return invalid("sampling_rate", "must be finite and positive");
        }
        if self.filter_order == 0 {
            return invalid("filter_order", "must be at least 1");
        }
        if !self.highpass_cutoff.is_finite() || self.highpass_cutoff <= 0.0 {
            return invalid("highpass_cutoff", "must be finite and positive");
        }
        if !self.lowpass_cutoff.is_finite() || self.lowpass_cutoff <= 0.0 {
            return invalid("lowpass_cutoff", "must be finite and positive");
        }
        if !(0.0..=1.0).contains(&self.fusion_weight) {
            return invalid("fusion_weight", "must be within [0, 1]");
        }
        Ok(())
    }
}

impl Default for AttitudeEstimatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE_HZ,
            filter_type: DEFAULT_FILTER_TYPE,
            filter_order: DEFAULT_FILTER_ORDER,
            highpass_cutoff: DEFAULT_HIGHPASS_CUTOFF_HZ,
            lowpass_cutoff: DEFAULT_LOWPASS_CUTOFF_HZ,
            fusion_weight: DEFAULT_ALPHA,
        }
    }
}

impl fmt::Display for AttitudeEstimatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sampling Rate (Hz): {}", self.sampling_rate)?;
        writeln!(f, "Filter Type: {}", self.filter_type)?;
        writeln!(f, "Filter Order: {}", self.filter_order)?;
        writeln!(f, "High Pass Cutoff Frequency (Hz): {}", self.highpass_cutoff)?;
        writeln!(f, "Low Pass Cutoff Frequency (Hz): {}", self.lowpass_cutoff)?;
        write!(f, "Fusion Weight: {}", self.fusion_weight)
    }
}

fn parse_f64(option: &'static str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| AttitudeError::InvalidConfig {
        option,
        reason: "expected a number",
    })
}
