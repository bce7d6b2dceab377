//! Welch power-spectral-density estimation for the filtering report.

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// One-sided PSD averaged over segments and channels.
#[derive(Debug, Clone)]
pub struct Psd {
    /// Bin frequencies in Hz.
    pub freqs: Vec<f64>,
    /// Power per bin, V^2/Hz.
    pub power: Vec<f64>,
}

/// Welch estimate with a Hann window and 50% overlap, averaged across all
/// rows of `data`.
pub fn welch_mean(data: &Array2<f64>, sfreq: f64, nperseg: usize) -> Psd {
    use std::f64::consts::PI;

    let n_samples = data.ncols();
    let nperseg = nperseg.min(n_samples).max(8);
    let step = nperseg / 2;
    let nbins = nperseg / 2 + 1;

    let window: Vec<f64> = (0..nperseg)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (nperseg - 1) as f64).cos())
        .collect();
    let win_norm: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sfreq * win_norm);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);

    let mut power = vec![0.0; nbins];
    let mut n_segments = 0usize;
    for row in data.rows() {
        let mut start = 0;
        while start + nperseg <= n_samples {
            let mut buf: Vec<Complex<f64>> = (0..nperseg)
                .map(|i| Complex::new(row[start + i] * window[i], 0.0))
                .collect();
            fft.process(&mut buf);
            for (k, p) in power.iter_mut().enumerate() {
                let mut v = buf[k].norm_sqr() * scale;
                // One-sided: double everything except DC and Nyquist.
                if k != 0 && !(nperseg % 2 == 0 && k == nbins - 1) {
                    v *= 2.0;
                }
                *p += v;
            }
            n_segments += 1;
            start += step;
        }
    }
    if n_segments > 0 {
        for p in power.iter_mut() {
            *p /= n_segments as f64;
        }
    }

    let freqs = (0..nbins)
        .map(|k| k as f64 * sfreq / nperseg as f64)
        .collect();
    Psd { freqs, power }
}
