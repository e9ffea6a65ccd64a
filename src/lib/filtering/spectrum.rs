// Magnitude spectrum for signal diagnostics
// Power-of-two lengths use an iterative radix-2 FFT, every other length goes
// through Bluestein's chirp-z so long recordings stay O(N log N).

use crate::error::{AttitudeError, FilterSpecIssue, Result};
use alloc::vec::Vec;
use core::f64::consts::PI;
use libm::{cos, hypot, sin};
use nalgebra::Complex;

type Cplx = Complex<f64>;

/// Non-negative half of a DFT, ordered by increasing frequency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    pub magnitude: Vec<f64>,
    pub frequency: Vec<f64>, // Hz
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    // (frequency, magnitude) of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequency
            .iter()
            .zip(&self.magnitude)
            .fold(None, |best: Option<(f64, f64)>, (&f, &m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((f, m)),
            })
    }
}

/// First `N / 2` bins of the DFT of `signal`: magnitudes and their frequency
/// in Hz for the given sampling rate, which must be finite and positive.
pub fn spectrum(signal: &[f64], sampling_rate: f64) -> Result<Spectrum> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(AttitudeError::InvalidFilterSpec(
            FilterSpecIssue::BadSamplingRate,
        ));
    }
    let n = signal.len();
    let half = n / 2;
    if half == 0 {
        return Ok(Spectrum::default());
    }

    let bins = fft(signal);
    let magnitude = bins[..half].iter().map(|c| hypot(c.re, c.im)).collect();
    let frequency = (0..half)
        .map(|k| k as f64 * sampling_rate / n as f64)
        .collect();
    Ok(Spectrum {
        magnitude,
        frequency,
    })
}

/// Full complex DFT of a real signal.
pub fn fft(signal: &[f64]) -> Vec<Cplx> {
    let mut buf: Vec<Cplx> = signal.iter().map(|&x| Cplx::new(x, 0.0)).collect();
    if buf.len() <= 1 {
        return buf;
    }
    if buf.len().is_power_of_two() {
        radix2(&mut buf, false);
        buf
    } else {
        bluestein(&buf)
    }
}

fn cis(angle: f64) -> Cplx {
    Cplx::new(cos(angle), sin(angle))
}

// in-place, length must be a power of two; inverse is unnormalized
fn radix2(buf: &mut [Cplx], inverse: bool) {
    let n = buf.len();
    let bits = n.trailing_zeros();

    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            buf.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let step = sign * 2.0 * PI / len as f64;
        for start in (0..n).step_by(len) {
            for k in 0..len / 2 {
                let w = cis(step * k as f64);
                let u = buf[start + k];
                let v = buf[start + k + len / 2] * w;
                buf[start + k] = u + v;
                buf[start + k + len / 2] = u - v;
            }
        }
        len <<= 1;
    }
}

fn bluestein(input: &[Cplx]) -> Vec<Cplx> {
    let n = input.len();
    let m = (2 * n - 1).next_power_of_two();

    // k^2 mod 2n keeps the chirp phase small for long inputs
    let chirp: Vec<Cplx> = (0..n)
        .map(|k| {
            let k2 = (k as u128 * k as u128 % (2 * n as u128)) as f64;
            cis(-PI * k2 / n as f64)
        })
        .collect();

    let mut a = alloc::vec![Cplx::new(0.0, 0.0); m];
    for (k, (&x, &w)) in input.iter().zip(&chirp).enumerate() {
        a[k] = x * w;
    }

    let mut b = alloc::vec![Cplx::new(0.0, 0.0); m];
    b[0] = chirp[0].conj();
    for k in 1..n {
        b[k] = chirp[k].conj();
        b[m - k] = chirp[k].conj();
    }

    radix2(&mut a, false);
    radix2(&mut b, false);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    radix2(&mut a, true);

    let scale = 1.0 / m as f64;
    (0..n).map(|k| a[k] * chirp[k] * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dft(signal: &[f64]) -> Vec<Cplx> {
        let n = signal.len();
        (0..n)
            .map(|k| {
                signal
                    .iter()
                    .enumerate()
                    .fold(Cplx::new(0.0, 0.0), |acc, (t, &x)| {
                        acc + cis(-2.0 * PI * (k * t) as f64 / n as f64) * x
                    })
            })
            .collect()
    }

    fn assert_matches_naive(signal: &[f64]) {
        let fast = fft(signal);
        let slow = naive_dft(signal);
        for (k, (f, s)) in fast.iter().zip(&slow).enumerate() {
            let err = hypot(f.re - s.re, f.im - s.im);
            assert!(err < 1e-9, "bin {} of {}: {:?} vs {:?}", k, signal.len(), f, s);
        }
    }

    #[test]
    fn radix2_matches_direct_dft() {
        let signal: Vec<f64> = (0..16).map(|i| sin(i as f64 * 0.7) + 0.1 * i as f64).collect();
        assert_matches_naive(&signal);
    }

    #[test]
    fn bluestein_matches_direct_dft() {
        for n in [3, 5, 12, 50, 97] {
            let signal: Vec<f64> = (0..n).map(|i| cos(i as f64 * 1.3) - 0.02 * i as f64).collect();
            assert_matches_naive(&signal);
        }
    }

    #[test]
    fn half_spectrum_bins_and_frequencies() {
        let s = spectrum(&[1.0, 1.0, 1.0, 1.0, 1.0], 50.0).unwrap();
        assert_eq!(s.len(), 2);
        assert!((s.magnitude[0] - 5.0).abs() < 1e-12);
        assert!(s.magnitude[1].abs() < 1e-9);
        assert_eq!(s.frequency, vec![0.0, 10.0]);
    }

    #[test]
    fn short_signals_have_empty_spectrum() {
        assert!(spectrum(&[], 50.0).unwrap().is_empty());
        assert!(spectrum(&[2.0], 50.0).unwrap().is_empty());
        assert_eq!(spectrum(&[2.0], 50.0).unwrap().peak(), None);
    }

    #[test]
    fn rejects_non_positive_sampling_rate() {
        let bad = Err(AttitudeError::InvalidFilterSpec(
            FilterSpecIssue::BadSamplingRate,
        ));
        assert_eq!(spectrum(&[1.0, 0.0, -1.0, 0.0], 0.0), bad);
        assert_eq!(spectrum(&[1.0, 0.0, -1.0, 0.0], -50.0), bad);
        // checked even when there is nothing to transform
        assert_eq!(spectrum(&[], 0.0), bad);
    }

    #[test]
    fn sinusoid_peaks_at_its_frequency() {
        let fs = 50.0;
        let signal: Vec<f64> = (0..500)
            .map(|i| sin(2.0 * PI * 3.0 * i as f64 / fs))
            .collect();
        let (freq, mag) = spectrum(&signal, fs).unwrap().peak().unwrap();
        assert!((freq - 3.0).abs() < 1e-9, "peak at {} Hz", freq);
        assert!((mag - 250.0).abs() < 1e-6, "peak magnitude {}", mag);
    }
}
