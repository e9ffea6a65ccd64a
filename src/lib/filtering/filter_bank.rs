use crate::error::Result;
use crate::filtering::butterworth::{self, FilterSpec, SecondOrderSections};
use crate::filtering::spectrum::{self, Spectrum};
use crate::filtering::zero_phase;
use alloc::vec::Vec;

/// Butterworth band-limiting and spectral inspection of single channels.
///
/// Stateless: every call designs its filter from the `FilterSpec` it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitalFilterBank;

impl DigitalFilterBank {
    pub fn new() -> Self {
        DigitalFilterBank
    }

    pub fn design(&self, spec: &FilterSpec) -> SecondOrderSections {
        butterworth::design(spec)
    }

    /// Zero-phase filtered copy of `signal`, same length as the input.
    ///
    /// Fails with `InsufficientSamples` unless the signal is longer than
    /// [`Self::min_samples`] for this filter.
    pub fn apply(&self, signal: &[f64], spec: &FilterSpec) -> Result<Vec<f64>> {
        zero_phase::filtfilt(&self.design(spec), signal)
    }

    /// Signals must be strictly longer than this to be filtered with `spec`.
    pub fn min_samples(&self, spec: &FilterSpec) -> usize {
        3 * spec.num_taps()
    }

    /// Fails with `InvalidFilterSpec(BadSamplingRate)` unless `sampling_rate`
    /// is finite and positive.
    pub fn spectrum(&self, signal: &[f64], sampling_rate: f64) -> Result<Spectrum> {
        spectrum::spectrum(signal, sampling_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AttitudeError, FilterSpecIssue};
    use crate::filtering::butterworth::FilterType;
    use crate::filtering::zero_phase::padlen;
    use core::f64::consts::PI;
    use libm::sin;

    #[test]
    fn min_samples_tracks_filter_length() {
        let bank = DigitalFilterBank::new();
        let low = FilterSpec::lowpass(4, 5.0, 50.0).unwrap();
        let band = FilterSpec::bandpass(4, 0.2, 15.0, 50.0).unwrap();
        assert_eq!(bank.min_samples(&low), 15);
        assert_eq!(bank.min_samples(&band), 27);
        assert_eq!(
            bank.apply(&[1.0; 27], &band),
            Err(AttitudeError::InsufficientSamples {
                len: 27,
                required: 27
            })
        );
        assert_eq!(bank.apply(&[1.0; 28], &band).map(|v| v.len()), Ok(28));
    }

    #[test]
    fn min_samples_matches_designed_cascade() {
        let bank = DigitalFilterBank::new();
        for order in 1..=10 {
            for spec in [
                FilterSpec::lowpass(order, 0.05, 50.0).unwrap(),
                FilterSpec::highpass(order, 24.9, 50.0).unwrap(),
                FilterSpec::bandpass(order, 0.2, 15.0, 50.0).unwrap(),
            ] {
                let sos = bank.design(&spec);
                let expected_sections = match spec.filter_type() {
                    FilterType::Band => order,
                    _ => (order + 1) / 2,
                };
                assert_eq!(sos.len(), expected_sections, "{:?}", spec);
                assert_eq!(bank.min_samples(&spec), padlen(&sos), "{:?}", spec);
            }
        }
    }

    #[test]
    fn spectrum_needs_a_usable_sampling_rate() {
        let bank = DigitalFilterBank::new();
        for fs in [0.0, -50.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                bank.spectrum(&[1.0, 2.0, 3.0, 4.0], fs),
                Err(AttitudeError::InvalidFilterSpec(
                    FilterSpecIssue::BadSamplingRate
                )),
                "fs = {}",
                fs
            );
        }
        assert_eq!(bank.spectrum(&[1.0, 2.0, 3.0, 4.0], 50.0).map(|s| s.len()), Ok(2));
    }

    #[test]
    fn lowpass_removes_high_tone_and_keeps_low_tone() {
        let fs = 50.0;
        let bank = DigitalFilterBank::new();
        let spec = FilterSpec::lowpass(4, 5.0, fs).unwrap();
        let t = |i: usize| i as f64 / fs;
        let low: Vec<f64> = (0..400).map(|i| sin(2.0 * PI * 1.0 * t(i))).collect();
        let mixed: Vec<f64> = (0..400)
            .map(|i| low[i] + 0.5 * sin(2.0 * PI * 20.0 * t(i)))
            .collect();

        let out = bank.apply(&mixed, &spec).unwrap();
        // away from the edges the 20 Hz tone is gone and the 1 Hz tone is untouched
        for i in 50..350 {
            assert!(
                (out[i] - low[i]).abs() < 0.01,
                "sample {}: {} vs {}",
                i,
                out[i],
                low[i]
            );
        }
    }

    #[test]
    fn highpass_removes_offset() {
        let fs = 50.0;
        let bank = DigitalFilterBank::new();
        let spec = FilterSpec::highpass(2, 2.0, fs).unwrap();
        let signal: Vec<f64> = (0..300)
            .map(|i| 9.81 + sin(2.0 * PI * 10.0 * i as f64 / fs))
            .collect();
        let out = bank.apply(&signal, &spec).unwrap();
        let mean = out[50..250].iter().sum::<f64>() / 200.0;
        assert!(mean.abs() < 0.01, "mean after high-pass = {}", mean);
    }
}
