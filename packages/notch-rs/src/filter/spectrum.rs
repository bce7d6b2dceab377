//! Sinusoid-regression notch removal ("spectrum_fit").
//!
//! The channel is processed in fixed-length windows. In each window the
//! target sinusoids are fit by least squares and subtracted. With no
//! explicit frequencies, line components are detected per window with an
//! F-test on the periodogram.

use nalgebra::{Matrix2, Vector2};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::types::{FilterLength, NotchParams};

/// Remove sinusoidal components from one channel in place.
///
/// Returns the sorted set of frequencies removed from this channel.
pub fn spectrum_fit_channel(
    x: &mut Vec<f64>,
    sfreq: f64,
    freqs: Option<&[f64]>,
    params: &NotchParams,
) -> Vec<f64> {
    let window = match params.filter_length {
        FilterLength::Seconds(s) => (s * sfreq).round() as usize,
        FilterLength::Auto => (10.0 * sfreq).round() as usize,
    };
    let window = window.max(16);

    let mut removed: Vec<f64> = Vec::new();
    let n = x.len();
    let mut start = 0;
    while start < n {
        let end = (start + window).min(n);
        let chunk = &mut x[start..end];
        if chunk.len() < 16 {
            break;
        }
        match freqs {
            Some(fs) => {
                for &f in fs {
                    fit_and_subtract(chunk, f, sfreq);
                    push_freq(&mut removed, f);
                }
            }
            None => {
                for f in detect_line_freqs(chunk, sfreq, params) {
                    fit_and_subtract(chunk, f, sfreq);
                    push_freq(&mut removed, f);
                }
            }
        }
        start = end;
    }
    removed.sort_by(f64::total_cmp);
    removed
}

fn push_freq(removed: &mut Vec<f64>, f: f64) {
    if !removed.iter().any(|&r| (r - f).abs() < 1e-6) {
        removed.push(f);
    }
}

/// Least-squares fit of `sin` and `cos` at `freq` and subtraction of the
/// fitted sinusoid.
pub fn fit_and_subtract(x: &mut [f64], freq: f64, sfreq: f64) {
    let w = 2.0 * std::f64::consts::PI * freq / sfreq;
    let (mut ss, mut cc, mut sc, mut xs, mut xc) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (i, &v) in x.iter().enumerate() {
        let s = (w * i as f64).sin();
        let c = (w * i as f64).cos();
        ss += s * s;
        cc += c * c;
        sc += s * c;
        xs += v * s;
        xc += v * c;
    }
    let m = Matrix2::new(ss, sc, sc, cc);
    let b = Vector2::new(xs, xc);
    let ab = match m.try_inverse() {
        Some(inv) => inv * b,
        None => return,
    };
    for (i, v) in x.iter_mut().enumerate() {
        *v -= ab[0] * (w * i as f64).sin() + ab[1] * (w * i as f64).cos();
    }
}

/// Periodogram F-test detection of significant sinusoidal components.
///
/// Each bin's power is tested against the residual spectrum; significant
/// bins within the detection bandwidth are clustered and the strongest bin
/// of each cluster is reported.
pub fn detect_line_freqs(x: &[f64], sfreq: f64, params: &NotchParams) -> Vec<f64> {
    let n = x.len();
    let mean = x.iter().sum::<f64>() / n as f64;
    let mut buf: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v - mean, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buf);

    let half = n / 2;
    let power: Vec<f64> = (1..half).map(|k| buf[k].norm_sqr()).collect();
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    // Regression on one sinusoid uses 2 dof; the mean uses one more.
    let d2 = (n as f64 - 3.0).max(1.0);
    let crit = f_crit(params.p_value, d2);

    let df = sfreq / n as f64;
    let bw = params.mt_bandwidth.unwrap_or(4.0 * df);
    let bw_bins = (bw / df).round().max(1.0) as usize;

    let mut significant: Vec<usize> = Vec::new();
    for (i, &p) in power.iter().enumerate() {
        let rest = (total - p).max(f64::EPSILON);
        let f_stat = d2 / 2.0 * p / rest;
        if f_stat > crit {
            significant.push(i);
        }
    }

    // Cluster adjacent significant bins and keep the peak of each cluster.
    let mut freqs = Vec::new();
    let mut i = 0;
    while i < significant.len() {
        let mut j = i;
        while j + 1 < significant.len() && significant[j + 1] - significant[j] <= bw_bins {
            j += 1;
        }
        let peak = significant[i..=j]
            .iter()
            .copied()
            .max_by(|&a, &b| power[a].total_cmp(&power[b]));
        if let Some(peak) = peak {
            freqs.push((peak + 1) as f64 * df);
        }
        i = j + 1;
    }
    freqs
}

/// Upper critical value of the F(2, d2) distribution.
///
/// With a numerator of 2 degrees of freedom the inverse survival function
/// has a closed form.
pub fn f_crit(p_value: f64, d2: f64) -> f64 {
    d2 / 2.0 * (p_value.powf(-2.0 / d2) - 1.0)
}
