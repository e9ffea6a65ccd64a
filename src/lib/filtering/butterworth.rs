// Butterworth IIR design
// Analog prototype -> pre-warped low/high/band transform -> bilinear transform,
// with the same poles and zeros as the textbook `butter(N, Wn, btype)`. The
// digital filter is kept as a cascade of second-order sections.

use crate::error::{AttitudeError, FilterSpecIssue, Result};
use alloc::vec::Vec;
use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;
use libm::{cos, hypot, sin, sqrt, tan};
use nalgebra::Complex;
use num_traits::Num;

type Cplx = Complex<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Low,
    High,
    Band,
}

impl FilterType {
    pub fn cutoff_count(self) -> usize {
        match self {
            FilterType::Low | FilterType::High => 1,
            FilterType::Band => 2,
        }
    }
}

impl FromStr for FilterType {
    type Err = AttitudeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" | "lowpass" => Ok(FilterType::Low),
            "high" | "highpass" => Ok(FilterType::High),
            "band" | "bandpass" => Ok(FilterType::Band),
            _ => Err(AttitudeError::InvalidFilterSpec(FilterSpecIssue::UnknownType)),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterType::Low => "low",
            FilterType::High => "high",
            FilterType::Band => "band",
        };
        f.write_str(name)
    }
}

/// A validated filter request. Cutoffs and sampling rate are in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    filter_type: FilterType,
    order: usize,
    cutoffs: [f64; 2],
    sampling_rate: f64,
}

impl FilterSpec {
    pub fn new(
        filter_type: FilterType,
        order: usize,
        cutoffs: &[f64],
        sampling_rate: f64,
    ) -> Result<Self> {
        let invalid = |issue| Err(AttitudeError::InvalidFilterSpec(issue));

        if order == 0 {
            return invalid(FilterSpecIssue::ZeroOrder);
        }
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return invalid(FilterSpecIssue::BadSamplingRate);
        }
        let expected = filter_type.cutoff_count();
        if cutoffs.len() != expected {
            return invalid(FilterSpecIssue::CutoffCount {
                expected,
                found: cutoffs.len(),
            });
        }
        if cutoffs.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return invalid(FilterSpecIssue::NonPositiveCutoff);
        }
        let nyquist = sampling_rate / 2.0;
        if cutoffs.iter().any(|c| *c >= nyquist) {
            return invalid(FilterSpecIssue::AboveNyquist);
        }
        if filter_type == FilterType::Band && cutoffs[0] >= cutoffs[1] {
            return invalid(FilterSpecIssue::UnorderedBand);
        }

        let mut stored = [0.0; 2];
        stored[..expected].copy_from_slice(cutoffs);
        Ok(Self {
            filter_type,
            order,
            cutoffs: stored,
            sampling_rate,
        })
    }

    pub fn lowpass(order: usize, cutoff: f64, sampling_rate: f64) -> Result<Self> {
        Self::new(FilterType::Low, order, &[cutoff], sampling_rate)
    }

    pub fn highpass(order: usize, cutoff: f64, sampling_rate: f64) -> Result<Self> {
        Self::new(FilterType::High, order, &[cutoff], sampling_rate)
    }

    pub fn bandpass(order: usize, low: f64, high: f64, sampling_rate: f64) -> Result<Self> {
        Self::new(FilterType::Band, order, &[low, high], sampling_rate)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs[..self.filter_type.cutoff_count()]
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of transfer function coefficients the designed filter has.
    pub fn num_taps(&self) -> usize {
        match self.filter_type {
            FilterType::Low | FilterType::High => self.order + 1,
            FilterType::Band => 2 * self.order + 1,
        }
    }
}

/// Transfer function `b(z) / a(z)`, highest power first, `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl Coefficients {
    pub fn num_taps(&self) -> usize {
        self.a.len().max(self.b.len())
    }
}

/// One biquad `[b0, b1, b2, a0, a1, a2]` with `a0 == 1`. First-order sections
/// have `b2 == a2 == 0`.
pub type Section = [f64; 6];

/// A filter as a cascade of biquads, applied first to last.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondOrderSections {
    pub(crate) sections: Vec<Section>,
}

impl SecondOrderSections {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Taps of the equivalent single transfer function.
    pub fn num_taps(&self) -> usize {
        let first_order = self.sections.iter().filter(|s| is_first_order(s)).count();
        2 * self.sections.len() + 1 - first_order
    }

    /// Magnitude of the frequency response at `freq` Hz.
    pub fn gain_at(&self, freq: f64, sampling_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sampling_rate;
        self.sections.iter().fold(1.0, |gain, s| {
            let ratio = eval_on_unit_circle(&s[..3], w) / eval_on_unit_circle(&s[3..], w);
            gain * hypot(ratio.re, ratio.im)
        })
    }

    /// The cascade multiplied out into a single `b / a` pair.
    ///
    /// Only trustworthy at low orders: the polynomial roots drift once poles
    /// crowd together. Filtering always runs section by section.
    pub fn transfer_function(&self) -> Coefficients {
        let mut b = alloc::vec![1.0];
        let mut a = alloc::vec![1.0];
        for s in &self.sections {
            let taps = if is_first_order(s) { 2 } else { 3 };
            b = convolve(&b, &s[..taps]);
            a = convolve(&a, &s[3..3 + taps]);
        }
        Coefficients { b, a }
    }
}

fn is_first_order(s: &Section) -> bool {
    s[2] == 0.0 && s[5] == 0.0
}

// zero/pole/gain form of a filter
struct Zpk {
    z: Vec<Cplx>,
    p: Vec<Cplx>,
    k: f64,
}

pub fn design(spec: &FilterSpec) -> SecondOrderSections {
    // design against fs = 2 so normalized frequencies are fractions of Nyquist
    const FS: f64 = 2.0;
    let nyquist = spec.sampling_rate / 2.0;
    let warp = |cutoff: f64| 2.0 * FS * tan(PI * (cutoff / nyquist) / FS);

    let prototype = analog_prototype(spec.order);
    let analog = match spec.filter_type {
        FilterType::Low => lp_to_lp(prototype, warp(spec.cutoffs[0])),
        FilterType::High => lp_to_hp(prototype, warp(spec.cutoffs[0])),
        FilterType::Band => {
            let w1 = warp(spec.cutoffs[0]);
            let w2 = warp(spec.cutoffs[1]);
            lp_to_bp(prototype, sqrt(w1 * w2), w2 - w1)
        }
    };
    let sections = zpk_to_sections(bilinear(analog, FS));

    log::debug!(
        "designed {} order {} butterworth at {:?} Hz: {:?}",
        spec.filter_type,
        spec.order,
        spec.cutoffs(),
        sections
    );
    SecondOrderSections { sections }
}

fn analog_prototype(order: usize) -> Zpk {
    let n = order as f64;
    let p = (0..order)
        .map(|i| {
            let m = (2 * i) as f64 - n + 1.0;
            let theta = PI * m / (2.0 * n);
            Cplx::new(-cos(theta), -sin(theta))
        })
        .collect();
    Zpk {
        z: Vec::new(),
        p,
        k: 1.0,
    }
}

fn lp_to_lp(proto: Zpk, wo: f64) -> Zpk {
    let degree = proto.p.len() - proto.z.len();
    Zpk {
        z: proto.z.iter().map(|&z| z * wo).collect(),
        p: proto.p.iter().map(|&p| p * wo).collect(),
        k: proto.k * powi(wo, degree),
    }
}

fn lp_to_hp(proto: Zpk, wo: f64) -> Zpk {
    let degree = proto.p.len() - proto.z.len();
    let wo_c = Cplx::new(wo, 0.0);
    let mut z: Vec<Cplx> = proto.z.iter().map(|&z| wo_c / z).collect();
    z.extend(core::iter::repeat(Cplx::new(0.0, 0.0)).take(degree));
    let p = proto.p.iter().map(|&p| wo_c / p).collect();
    let neg = |v: &[Cplx]| v.iter().map(|&x| -x).collect::<Vec<_>>();
    let k = proto.k * (prod(&neg(&proto.z)) / prod(&neg(&proto.p))).re;
    Zpk { z, p, k }
}

fn lp_to_bp(proto: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = proto.p.len() - proto.z.len();
    let split = |roots: &[Cplx]| {
        let scaled: Vec<Cplx> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
        let offsets: Vec<Cplx> = scaled
            .iter()
            .map(|&r| csqrt(r * r - Cplx::new(wo * wo, 0.0)))
            .collect();
        let mut out: Vec<Cplx> = scaled.iter().zip(&offsets).map(|(&r, &o)| r + o).collect();
        out.extend(scaled.iter().zip(&offsets).map(|(&r, &o)| r - o));
        out
    };
    let mut z = split(&proto.z);
    z.extend(core::iter::repeat(Cplx::new(0.0, 0.0)).take(degree));
    Zpk {
        z,
        p: split(&proto.p),
        k: proto.k * powi(bw, degree),
    }
}

fn bilinear(analog: Zpk, fs: f64) -> Zpk {
    let degree = analog.p.len() - analog.z.len();
    let fs2 = Cplx::new(2.0 * fs, 0.0);
    let map = |s: &Cplx| (fs2 + *s) / (fs2 - *s);

    let mut z: Vec<Cplx> = analog.z.iter().map(map).collect();
    z.extend(core::iter::repeat(Cplx::new(-1.0, 0.0)).take(degree));
    let p = analog.p.iter().map(map).collect();

    let shifted = |v: &[Cplx]| v.iter().map(|&x| fs2 - x).collect::<Vec<_>>();
    let k = analog.k * (prod(&shifted(&analog.z)) / prod(&shifted(&analog.p))).re;
    Zpk { z, p, k }
}

// Each pole group takes its nearest remaining zeros, poles closest to the unit
// circle choosing first. Those sections run last; the gain rides on the first.
fn zpk_to_sections(digital: Zpk) -> Vec<Section> {
    let mut groups = pole_groups(&digital.p);
    groups.sort_by(|x, y| radius(y).total_cmp(&radius(x)));

    let mut zeros = digital.z;
    let mut sections: Vec<Section> = groups
        .iter()
        .map(|poles| {
            let paired: Vec<Cplx> = poles
                .iter()
                .filter_map(|&p| take_nearest(&mut zeros, p))
                .collect();
            section(&paired, poles)
        })
        .collect();
    sections.reverse();

    if let Some(first) = sections.first_mut() {
        for c in &mut first[..3] {
            *c *= digital.k;
        }
    }
    sections
}

// conjugate pairs, then real poles two at a time
fn pole_groups(poles: &[Cplx]) -> Vec<Vec<Cplx>> {
    const REAL_TOL: f64 = 1e-10;
    let mut groups: Vec<Vec<Cplx>> = poles
        .iter()
        .filter(|p| p.im > REAL_TOL)
        .map(|&p| alloc::vec![p, p.conj()])
        .collect();

    let mut real: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_TOL)
        .map(|p| p.re)
        .collect();
    real.sort_by(f64::total_cmp);
    groups.extend(
        real.chunks(2)
            .map(|pair| pair.iter().map(|&r| Cplx::new(r, 0.0)).collect()),
    );
    groups
}

fn radius(roots: &[Cplx]) -> f64 {
    roots.iter().map(|r| hypot(r.re, r.im)).fold(0.0, f64::max)
}

fn take_nearest(roots: &mut Vec<Cplx>, target: Cplx) -> Option<Cplx> {
    let distance = |r: &Cplx| hypot(r.re - target.re, r.im - target.im);
    let index = roots
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| distance(*x).total_cmp(&distance(*y)))
        .map(|(i, _)| i)?;
    Some(roots.swap_remove(index))
}

// missing zeros sit at the origin
fn section(zeros: &[Cplx], poles: &[Cplx]) -> Section {
    let b = poly(zeros);
    let a = poly(poles);
    let coeff = |c: &[Cplx], i: usize| c.get(i).map_or(0.0, |v| v.re);
    [
        coeff(&b, 0),
        coeff(&b, 1),
        coeff(&b, 2),
        coeff(&a, 0),
        coeff(&a, 1),
        coeff(&a, 2),
    ]
}

// polynomial with the given roots, highest power first
fn poly<T: Num + Copy>(roots: &[T]) -> Vec<T> {
    let mut coeffs = Vec::with_capacity(roots.len() + 1);
    coeffs.push(T::one());
    for &root in roots {
        coeffs.push(T::zero());
        for i in (1..coeffs.len()).rev() {
            coeffs[i] = coeffs[i] - root * coeffs[i - 1];
        }
    }
    coeffs
}

fn convolve<T: Num + Copy>(x: &[T], y: &[T]) -> Vec<T> {
    let mut out = alloc::vec![T::zero(); x.len() + y.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &yj) in y.iter().enumerate() {
            out[i + j] = out[i + j] + xi * yj;
        }
    }
    out
}

fn prod<T: Num + Copy>(values: &[T]) -> T {
    values.iter().fold(T::one(), |acc, &v| acc * v)
}

fn powi(base: f64, exp: usize) -> f64 {
    (0..exp).fold(1.0, |acc, _| acc * base)
}

// principal square root
fn csqrt(c: Cplx) -> Cplx {
    let r = hypot(c.re, c.im);
    let re = sqrt((r + c.re) / 2.0);
    let im = sqrt((r - c.re) / 2.0);
    Cplx::new(re, if c.im < 0.0 { -im } else { im })
}

fn eval_on_unit_circle(coeffs: &[f64], w: f64) -> Cplx {
    // sum c[k] * e^{-jwk}
    coeffs
        .iter()
        .enumerate()
        .fold(Cplx::new(0.0, 0.0), |acc, (k, &c)| {
            let phase = -w * k as f64;
            acc + Cplx::new(c * cos(phase), c * sin(phase))
        })
}
