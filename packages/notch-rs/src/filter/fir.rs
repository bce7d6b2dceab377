//! FIR notch-filter design and zero-phase application.
//!
//! Two designs are supported: `firwin` composes a band-stop from
//! windowed-sinc low-pass kernels, `firwin2` samples the target frequency
//! response and inverts it with an FFT. Application pads the signal at the
//! edges, convolves with overlap-add FFT convolution, then compensates the
//! group delay so the result is zero phase.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{NotchError, Result};
use crate::types::{FilterLength, FirDesign, FirWindow, NotchParams, PadMode, Phase};

/// Number of taps for the requested filter length, always odd and >= 3.
///
/// `auto` picks the shortest filter whose transition band meets the window's
/// attenuation factor.
pub fn n_taps(
    length: FilterLength,
    sfreq: f64,
    trans_bandwidth: f64,
    window: FirWindow,
) -> usize {
    let n = match length {
        FilterLength::Auto => {
            (window.attenuation_factor() * sfreq / trans_bandwidth).ceil() as usize
        }
        FilterLength::Seconds(s) => (s * sfreq).round() as usize,
    };
    let n = n.max(3);
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Design the notch filter taps for the given frequency set.
pub fn design_notch(
    freqs: &[f64],
    sfreq: f64,
    params: &NotchParams,
    n_taps: usize,
) -> Result<Vec<f64>> {
    match params.fir_design {
        FirDesign::Firwin => Ok(design_firwin(freqs, sfreq, params, n_taps)),
        FirDesign::Firwin2 => design_firwin2(freqs, sfreq, params, n_taps),
    }
}

/// Symmetric window of length `n`.
fn window_vec(window: FirWindow, n: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    if n == 1 {
        return vec![1.0];
    }
    let m = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = i as f64 / m;
            match window {
                FirWindow::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                FirWindow::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
                FirWindow::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                }
            }
        })
        .collect()
}

/// Windowed-sinc low-pass kernel with cutoff `fc` Hz, DC gain 1.
fn windowed_sinc_lowpass(fc: f64, sfreq: f64, n: usize, win: &[f64]) -> Vec<f64> {
    use std::f64::consts::PI;
    let center = (n - 1) as f64 / 2.0;
    let fc_norm = fc / sfreq;
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 - center;
            let sinc = if t.abs() < 1e-12 {
                2.0 * fc_norm
            } else {
                (2.0 * PI * fc_norm * t).sin() / (PI * t)
            };
            sinc * win[i]
        })
        .collect();
    let sum: f64 = h.iter().sum();
    if sum.abs() > 1e-12 {
        for v in h.iter_mut() {
            *v /= sum;
        }
    }
    h
}

/// Band-stop composition: identity minus a band-pass per notch frequency.
fn design_firwin(freqs: &[f64], sfreq: f64, params: &NotchParams, n: usize) -> Vec<f64> {
    let win = window_vec(params.fir_window, n);
    let mut h = vec![0.0; n];
    h[(n - 1) / 2] = 1.0;
    for &f in freqs {
        let tb = params.trans_bandwidth;
        let w = params.width_for(f);
        let fl = f - w / 2.0 - tb / 4.0;
        let fh = f + w / 2.0 + tb / 4.0;
        let lp_hi = windowed_sinc_lowpass(fh, sfreq, n, &win);
        let lp_lo = windowed_sinc_lowpass(fl, sfreq, n, &win);
        for i in 0..n {
            h[i] -= lp_hi[i] - lp_lo[i];
        }
    }
    h
}

/// Frequency-sampling design: linear-interpolated target response, inverse
/// FFT, truncate and window.
fn design_firwin2(freqs: &[f64], sfreq: f64, params: &NotchParams, n: usize) -> Result<Vec<f64>> {
    use std::f64::consts::PI;
    let nyq = sfreq / 2.0;

    let mut sorted = freqs.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Piecewise-linear gain breakpoints, unity everywhere except the notches.
    let mut pts: Vec<(f64, f64)> = vec![(0.0, 1.0)];
    for &f in &sorted {
        let tb = params.trans_bandwidth;
        let w = params.width_for(f);
        let band_start = f - w / 2.0 - tb / 2.0;
        if let Some(&(prev_end, _)) = pts.last() {
            if band_start < prev_end {
                return Err(NotchError::Filter(
                    "notch bands overlap; reduce widths or transition bandwidth".to_string(),
                ));
            }
        }
        pts.push((band_start, 1.0));
        pts.push((f - w / 2.0, 0.0));
        pts.push((f + w / 2.0, 0.0));
        pts.push((f + w / 2.0 + tb / 2.0, 1.0));
    }
    pts.push((nyq, 1.0));

    let nfreqs = n.next_power_of_two() + 1;
    let nfft = 2 * (nfreqs - 1);
    let grid: Vec<f64> = (0..nfreqs)
        .map(|k| interp_gain(&pts, k as f64 * nyq / (nfreqs - 1) as f64))
        .collect();

    // Linear-phase response with delay centered on the final filter.
    let center = (n - 1) as f64 / 2.0;
    let mut spectrum: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); nfft];
    for (k, item) in spectrum.iter_mut().enumerate().take(nfreqs) {
        let phase = -2.0 * PI * k as f64 * center / nfft as f64;
        *item = Complex::from_polar(grid[k], phase);
    }
    for k in nfreqs..nfft {
        spectrum[k] = spectrum[nfft - k].conj();
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(nfft).process(&mut spectrum);

    let win = window_vec(params.fir_window, n);
    Ok((0..n)
        .map(|i| spectrum[i].re / nfft as f64 * win[i])
        .collect())
}

fn interp_gain(pts: &[(f64, f64)], f: f64) -> f64 {
    if f <= pts[0].0 {
        return pts[0].1;
    }
    for pair in pts.windows(2) {
        let (f0, g0) = pair[0];
        let (f1, g1) = pair[1];
        if f <= f1 {
            if (f1 - f0).abs() < 1e-12 {
                return g1;
            }
            return g0 + (g1 - g0) * (f - f0) / (f1 - f0);
        }
    }
    pts[pts.len() - 1].1
}

/// Pad `x` by `npad` samples on each side.
pub fn pad_signal(x: &[f64], npad: usize, mode: PadMode) -> Vec<f64> {
    let n = x.len();
    let mut out = Vec::with_capacity(n + 2 * npad);
    for j in (1..=npad).rev() {
        out.push(match mode {
            PadMode::Zero => 0.0,
            PadMode::Edge => x[0],
            PadMode::Reflect => x[j.min(n - 1)],
            PadMode::ReflectLimited => 2.0 * x[0] - x[j.min(n - 1)],
        });
    }
    out.extend_from_slice(x);
    for j in 1..=npad {
        out.push(match mode {
            PadMode::Zero => 0.0,
            PadMode::Edge => x[n - 1],
            PadMode::Reflect => x[n - 1 - j.min(n - 1)],
            PadMode::ReflectLimited => 2.0 * x[n - 1] - x[n - 1 - j.min(n - 1)],
        });
    }
    out
}

/// Overlap-add FFT convolution of `x` with `h` ("full" output length).
pub fn fft_convolve(x: &[f64], h: &[f64]) -> Vec<f64> {
    let lh = h.len();
    let nfft = (8 * lh.next_power_of_two()).max(4096).max(2 * lh);
    let step = nfft - (lh - 1);

    let mut planner = FftPlanner::new();
    let fwd = planner.plan_fft_forward(nfft);
    let inv = planner.plan_fft_inverse(nfft);

    let mut hf: Vec<Complex<f64>> = h
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(nfft)
        .collect();
    fwd.process(&mut hf);

    let mut y = vec![0.0; x.len() + lh - 1];
    let mut start = 0;
    while start < x.len() {
        let end = (start + step).min(x.len());
        let mut buf: Vec<Complex<f64>> = x[start..end]
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(nfft)
            .collect();
        fwd.process(&mut buf);
        for (b, hv) in buf.iter_mut().zip(hf.iter()) {
            *b *= *hv;
        }
        inv.process(&mut buf);
        let seg = (end - start) + lh - 1;
        for i in 0..seg {
            y[start + i] += buf[i].re / nfft as f64;
        }
        start = end;
    }
    y
}

/// Filter one channel in place with zero-phase delay compensation.
pub fn filter_channel(x: &mut Vec<f64>, h: &[f64], phase: Phase, pad: PadMode) {
    match phase {
        Phase::Zero => one_pass(x, h, pad),
        Phase::ZeroDouble => {
            one_pass(x, h, pad);
            x.reverse();
            one_pass(x, h, pad);
            x.reverse();
        }
    }
}

fn one_pass(x: &mut Vec<f64>, h: &[f64], pad: PadMode) {
    let n = x.len();
    let lh = h.len();
    let padded = pad_signal(x, lh, pad);
    let y = fft_convolve(&padded, h);
    // The pad offsets the start by lh; the linear-phase delay is (lh-1)/2.
    let delay = (lh - 1) / 2;
    x.clear();
    x.extend_from_slice(&y[lh + delay..lh + delay + n]);
}
