// Forward-backward IIR filtering
// The signal is extended at both ends with an odd reflection, run through the
// section cascade forwards and then backwards starting from steady-state
// conditions, and trimmed back to its original length.

use crate::error::{AttitudeError, Result};
use crate::filtering::butterworth::{Coefficients, SecondOrderSections};
use alloc::vec::Vec;
use nalgebra::{DMatrix, DVector};

/// Samples added on each side before filtering.
pub fn padlen(sos: &SecondOrderSections) -> usize {
    3 * sos.num_taps()
}

/// Zero-phase filtering of `signal`. Output has the same length as the input
/// and no group delay.
pub fn filtfilt(sos: &SecondOrderSections, signal: &[f64]) -> Result<Vec<f64>> {
    let pad = padlen(sos);
    let len = signal.len();
    if len <= pad {
        return Err(AttitudeError::InsufficientSamples { len, required: pad });
    }

    let ext = odd_extend(signal, pad);
    let zi = sosfilt_zi(sos)?;

    let scaled = |x0: f64| zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect::<Vec<_>>();
    let mut y = sosfilt(sos, &ext, &scaled(ext[0]));
    let y_last = y[y.len() - 1];
    y.reverse();
    let mut y = sosfilt(sos, &y, &scaled(y_last));
    y.reverse();

    Ok(y[pad..pad + len].to_vec())
}

/// Runs `signal` through each section in turn, direct form II transposed.
/// `zi` holds two delay-line values per section; sections without one start
/// at rest.
pub fn sosfilt(sos: &SecondOrderSections, signal: &[f64], zi: &[[f64; 2]]) -> Vec<f64> {
    let mut state: Vec<[f64; 2]> = (0..sos.len())
        .map(|i| zi.get(i).copied().unwrap_or_default())
        .collect();

    signal
        .iter()
        .map(|&x| {
            sos.sections()
                .iter()
                .zip(state.iter_mut())
                .fold(x, |x, (s, z)| {
                    let y = s[0] * x + z[0];
                    z[0] = s[1] * x - s[4] * y + z[1];
                    z[1] = s[2] * x - s[5] * y;
                    y
                })
        })
        .collect()
}

/// Per-section state after an infinitely long unit step at the cascade input.
pub fn sosfilt_zi(sos: &SecondOrderSections) -> Result<Vec<[f64; 2]>> {
    let mut zi = Vec::with_capacity(sos.len());
    let mut scale = 1.0; // DC gain of the sections before this one
    for s in sos.sections() {
        let coeffs = Coefficients {
            b: s[..3].to_vec(),
            a: s[3..].to_vec(),
        };
        let z = lfilter_zi(&coeffs)?;
        zi.push([z[0] * scale, z[1] * scale]);
        scale *= (s[0] + s[1] + s[2]) / (s[3] + s[4] + s[5]);
    }
    Ok(zi)
}

/// Delay-line state of a single `b / a` filter after an infinitely long unit
/// step.
pub fn lfilter_zi(coeffs: &Coefficients) -> Result<Vec<f64>> {
    let (b, a) = normalized(coeffs);
    let m = b.len() - 1;
    if m == 0 {
        return Ok(Vec::new());
    }

    // (I - companion(a)^T) zi = b[1..] - a[1..] * b[0]
    let mut system = DMatrix::<f64>::identity(m, m);
    for i in 0..m {
        system[(i, 0)] += a[i + 1];
        if i + 1 < m {
            system[(i, i + 1)] -= 1.0;
        }
    }
    let rhs = DVector::from_iterator(m, (0..m).map(|i| b[i + 1] - a[i + 1] * b[0]));

    system
        .lu()
        .solve(&rhs)
        .map(|zi| zi.iter().copied().collect())
        .ok_or(AttitudeError::SingularFilter)
}

// b and a padded to equal length and scaled so that a[0] == 1
fn normalized(coeffs: &Coefficients) -> (Vec<f64>, Vec<f64>) {
    let n = coeffs.num_taps().max(1);
    let a0 = coeffs.a.first().copied().unwrap_or(1.0);
    let pad = |v: &[f64]| {
        let mut out: Vec<f64> = v.iter().map(|c| c / a0).collect();
        out.resize(n, 0.0);
        out
    };
    (pad(&coeffs.b), pad(&coeffs.a))
}

fn odd_extend(signal: &[f64], pad: usize) -> Vec<f64> {
    let len = signal.len();
    let first = signal[0];
    let last = signal[len - 1];

    let mut ext = Vec::with_capacity(len + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    ext.extend_from_slice(signal);
    ext.extend((0..pad).map(|i| 2.0 * last - signal[len - 2 - i]));
    ext
}
