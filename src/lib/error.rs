use core::fmt;

/// Crate-wide result type.
pub type Result<T> = core::result::Result<T, AttitudeError>;

/// Errors raised by conversion, filtering and attitude estimation.
///
/// Unknown configuration options are not represented here: they are reported
/// as [`crate::config::UnknownOption`] warnings and never abort an update.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttitudeError {
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(FilterSpecIssue),

    #[error("signal has {len} samples, filter needs more than {required}")]
    InsufficientSamples { len: usize, required: usize },

    #[error("channel {channel} has {found} samples, expected {expected}")]
    LengthMismatch {
        channel: Channel,
        expected: usize,
        found: usize,
    },

    #[error("numerically unstable sample at index {index}: {reason}")]
    NumericalInstability {
        index: usize,
        reason: InstabilityReason,
    },

    /// A single streamed sample was refused; the filter state is unchanged.
    #[error("sample rejected: {0}")]
    RejectedSample(InstabilityReason),

    /// A filter section has a pole at z = 1, so no steady state exists.
    #[error("filter has no steady state for initial conditions")]
    SingularFilter,

    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f64),

    #[error("invalid value for option `{option}`: {reason}")]
    InvalidConfig {
        option: &'static str,
        reason: &'static str,
    },
}

/// What exactly is wrong with a filter specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpecIssue {
    ZeroOrder,
    BadSamplingRate,
    /// Low/high-pass needs exactly one cutoff, band-pass exactly two.
    CutoffCount { expected: usize, found: usize },
    NonPositiveCutoff,
    /// Cutoff at or above the Nyquist frequency.
    AboveNyquist,
    /// Band edges not strictly increasing.
    UnorderedBand,
    UnknownType,
}

impl fmt::Display for FilterSpecIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpecIssue::ZeroOrder => write!(f, "filter order must be at least 1"),
            FilterSpecIssue::BadSamplingRate => {
                write!(f, "sampling rate must be finite and positive")
            }
            FilterSpecIssue::CutoffCount { expected, found } => {
                write!(f, "expected {} cutoff(s), got {}", expected, found)
            }
            FilterSpecIssue::NonPositiveCutoff => {
                write!(f, "cutoff frequencies must be finite and positive")
            }
            FilterSpecIssue::AboveNyquist => {
                write!(f, "cutoff frequencies must be below half the sampling rate")
            }
            FilterSpecIssue::UnorderedBand => {
                write!(f, "band-pass cutoffs must be strictly increasing")
            }
            FilterSpecIssue::UnknownType => write!(f, "filter type must be low, high or band"),
        }
    }
}

/// The six input channels of the estimator, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::AccelX => "ax",
            Channel::AccelY => "ay",
            Channel::AccelZ => "az",
            Channel::GyroX => "p",
            Channel::GyroY => "q",
            Channel::GyroZ => "r",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstabilityReason {
    /// `az` too close to zero for the roll tilt estimate.
    AccelZNearZero,
    NonFinite,
}

impl fmt::Display for InstabilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstabilityReason::AccelZNearZero => write!(f, "z acceleration is (near) zero"),
            InstabilityReason::NonFinite => write!(f, "sample is NaN or infinite"),
        }
    }
}
