//! The notch-filter engine.
//!
//! [`notch_filter`] is the single entry point: it resolves the target
//! frequency set, validates it against the recording, selects the channels
//! to filter and dispatches to the method-specific implementation. Channel
//! rows are processed independently, in parallel when `n_jobs > 1`.

pub mod fir;
pub mod iir;
pub mod spectrum;

use rayon::prelude::*;

use crate::error::{NotchError, Result};
use crate::fiff::Raw;
use crate::types::{Method, NotchParams};

/// Apply a notch filter to `raw` in place.
///
/// Returns the frequencies that were actually notched. For `spectrum_fit`
/// with no explicit frequencies this is the union of the components
/// detected across channels; otherwise it is the resolved frequency set.
pub fn notch_filter(raw: &mut Raw, params: &NotchParams) -> Result<Vec<f64>> {
    let sfreq = raw.info.sfreq;
    let nyq = sfreq / 2.0;
    let freqs = params.freqs.resolve();

    if let Some(ref fs) = freqs {
        if fs.is_empty() {
            return Err(NotchError::InvalidParameter(
                "resolved frequency set is empty; check freqs start/end/step".to_string(),
            ));
        }
        for &f in fs {
            let margin = params.width_for(f) / 2.0 + params.trans_bandwidth / 2.0;
            if f - margin <= 0.0 {
                return Err(NotchError::InvalidParameter(format!(
                    "notch frequency {} Hz is too close to DC for the requested widths",
                    f
                )));
            }
            if f + margin >= nyq {
                return Err(NotchError::InvalidParameter(format!(
                    "notch frequency {} Hz is at or above the Nyquist frequency ({} Hz)",
                    f, nyq
                )));
            }
        }
    } else if params.method != Method::SpectrumFit {
        return Err(NotchError::InvalidConfig(
            "a notch frequency is required unless method is spectrum_fit".to_string(),
        ));
    }

    let picks = resolve_picks(raw, params.picks.as_deref())?;
    log::info!(
        "Notch filtering {} channel(s) at {} Hz (method={}, n_jobs={})",
        picks.len(),
        sfreq,
        params.method.as_str(),
        params.n_jobs
    );

    let mut rows: Vec<(usize, Vec<f64>)> = picks
        .iter()
        .map(|&i| (i, raw.data.row(i).to_vec()))
        .collect();

    let applied = match params.method {
        Method::Fir => {
            let fs = freqs.as_ref().expect("validated above");
            let n_taps = fir::n_taps(
                params.filter_length,
                sfreq,
                params.trans_bandwidth,
                params.fir_window,
            );
            if n_taps > raw.n_samples() {
                return Err(NotchError::Filter(format!(
                    "FIR filter length ({} samples) exceeds the signal length ({} samples); \
                     shorten param_filter_length or widen param_trans_bandwidth",
                    n_taps,
                    raw.n_samples()
                )));
            }
            let h = fir::design_notch(fs, sfreq, params, n_taps)?;
            log::debug!("designed {}-tap FIR notch filter", h.len());
            map_rows(&mut rows, params.n_jobs, |x| {
                fir::filter_channel(x, &h, params.phase, params.pad)
            })?;
            fs.clone()
        }
        Method::Iir => {
            let fs = freqs.as_ref().expect("validated above");
            let coeffs = iir::notch_coeffs(fs, sfreq, params)?;
            log::debug!("designed {} IIR notch section(s)", coeffs.len());
            map_rows(&mut rows, params.n_jobs, |x| iir::filtfilt(x, &coeffs))?;
            fs.clone()
        }
        Method::SpectrumFit => {
            let explicit = freqs.clone();
            let detected = map_rows(&mut rows, params.n_jobs, |x| {
                spectrum::spectrum_fit_channel(x, sfreq, explicit.as_deref(), params)
            })?;
            union_freqs(detected)
        }
    };

    for (i, x) in rows {
        for (dst, v) in raw.data.row_mut(i).iter_mut().zip(x.iter()) {
            *dst = *v;
        }
    }

    Ok(applied)
}

/// Resolve the channel selection to row indices.
///
/// `None` selects all MEG/EEG data channels; explicit names must all exist
/// in the recording.
fn resolve_picks(raw: &Raw, picks: Option<&[String]>) -> Result<Vec<usize>> {
    match picks {
        None => {
            let idx = raw.data_picks();
            if idx.is_empty() {
                return Err(NotchError::InvalidParameter(
                    "recording has no MEG/EEG data channels to filter".to_string(),
                ));
            }
            Ok(idx)
        }
        Some(names) => {
            let mut idx = Vec::with_capacity(names.len());
            for name in names {
                match raw.info.chs.iter().position(|c| &c.name == name) {
                    Some(i) => idx.push(i),
                    None => {
                        return Err(NotchError::InvalidParameter(format!(
                            "picked channel '{}' not found in recording",
                            name
                        )))
                    }
                }
            }
            Ok(idx)
        }
    }
}

/// Run `op` over every extracted channel row, serially or on a dedicated
/// pool of `n_jobs` workers.
fn map_rows<T: Send>(
    rows: &mut [(usize, Vec<f64>)],
    n_jobs: usize,
    op: impl Fn(&mut Vec<f64>) -> T + Sync,
) -> Result<Vec<T>> {
    if n_jobs <= 1 {
        Ok(rows.iter_mut().map(|(_, x)| op(x)).collect())
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs)
            .build()
            .map_err(|e| NotchError::Filter(format!("failed to build worker pool: {}", e)))?;
        Ok(pool.install(|| rows.par_iter_mut().map(|(_, x)| op(x)).collect()))
    }
}

/// Merge per-channel detected frequency lists, deduplicating near-equal
/// entries.
fn union_freqs(per_channel: Vec<Vec<f64>>) -> Vec<f64> {
    let mut all: Vec<f64> = Vec::new();
    for fs in per_channel {
        for f in fs {
            if !all.iter().any(|&a| (a - f).abs() < 1e-6) {
                all.push(f);
            }
        }
    }
    all.sort_by(f64::total_cmp);
    all
}

/// Least-squares amplitude of a sinusoid at `freq` in `x`. Shared by the
/// method tests below.
#[cfg(test)]
pub(crate) fn amplitude_at(x: &[f64], freq: f64, sfreq: f64) -> f64 {
    use nalgebra::{Matrix2, Vector2};
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
    match m.try_inverse() {
        Some(inv) => {
            let ab = inv * b;
            (ab[0] * ab[0] + ab[1] * ab[1]).sqrt()
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiff::info::{ch_kind, ChannelInfo, MeasInfo};
    use crate::types::{
        FilterLength, FirDesign, FirWindow, FreqSpec, IirParams, PadMode, Phase,
    };
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn test_params(method: Method, freqs: FreqSpec) -> NotchParams {
        NotchParams {
            freqs,
            picks: None,
            filter_length: FilterLength::Auto,
            widths: Some(2.0),
            trans_bandwidth: 2.0,
            n_jobs: 1,
            method,
            iir_params: IirParams::default(),
            mt_bandwidth: None,
            p_value: 0.05,
            phase: Phase::Zero,
            fir_window: FirWindow::Hamming,
            fir_design: FirDesign::Firwin,
            pad: PadMode::ReflectLimited,
        }
    }

    fn two_tone_raw(nchan: usize) -> Raw {
        let sfreq = 600.0;
        let n = 6000;
        let mut info = MeasInfo {
            nchan,
            sfreq,
            ..MeasInfo::default()
        };
        for i in 0..nchan {
            info.chs.push(ChannelInfo::new(
                (i + 1) as i32,
                &format!("MEG {:03}", i + 1),
                ch_kind::MEG,
            ));
        }
        let data = Array2::from_shape_fn((nchan, n), |(_, s)| {
            let t = s as f64 / sfreq;
            (2.0 * PI * 10.0 * t).sin() + (2.0 * PI * 60.0 * t).sin()
        });
        Raw {
            info,
            first_samp: 0,
            data,
        }
    }

    fn center(x: &[f64]) -> &[f64] {
        let n = x.len();
        &x[n / 4..3 * n / 4]
    }

    #[test]
    fn test_fir_notch_removes_line_keeps_signal() {
        let mut raw = two_tone_raw(1);
        let params = test_params(Method::Fir, FreqSpec::Single(60.0));
        let applied = notch_filter(&mut raw, &params).unwrap();
        assert_eq!(applied, vec![60.0]);

        let row = raw.data.row(0).to_vec();
        assert!(amplitude_at(center(&row), 60.0, 600.0) < 0.05);
        assert!(amplitude_at(center(&row), 10.0, 600.0) > 0.9);
    }

    #[test]
    fn test_iir_notch_removes_line_keeps_signal() {
        let mut raw = two_tone_raw(1);
        let params = test_params(Method::Iir, FreqSpec::Single(60.0));
        notch_filter(&mut raw, &params).unwrap();

        let row = raw.data.row(0).to_vec();
        assert!(amplitude_at(center(&row), 60.0, 600.0) < 0.05);
        assert!(amplitude_at(center(&row), 10.0, 600.0) > 0.9);
    }

    #[test]
    fn test_spectrum_fit_with_explicit_freq() {
        let mut raw = two_tone_raw(1);
        let params = test_params(Method::SpectrumFit, FreqSpec::Single(60.0));
        let applied = notch_filter(&mut raw, &params).unwrap();
        assert_eq!(applied, vec![60.0]);

        let row = raw.data.row(0).to_vec();
        assert!(amplitude_at(&row, 60.0, 600.0) < 1e-6);
        assert!(amplitude_at(&row, 10.0, 600.0) > 0.99);
    }

    #[test]
    fn test_harmonic_sequence_filters_all_targets() {
        let sfreq = 600.0;
        let n = 6000;
        let mut raw = two_tone_raw(1);
        raw.data = Array2::from_shape_fn((1, n), |(_, s)| {
            let t = s as f64 / sfreq;
            (2.0 * PI * 60.0 * t).sin() + (2.0 * PI * 120.0 * t).sin()
        });
        let params = test_params(
            Method::Fir,
            FreqSpec::Sequence {
                start: 60.0,
                end: 181.0,
                step: 60.0,
            },
        );
        let applied = notch_filter(&mut raw, &params).unwrap();
        assert_eq!(applied, vec![60.0, 120.0, 180.0]);

        let row = raw.data.row(0).to_vec();
        assert!(amplitude_at(center(&row), 60.0, sfreq) < 0.05);
        assert!(amplitude_at(center(&row), 120.0, sfreq) < 0.05);
    }

    #[test]
    fn test_picks_limit_filtering() {
        let mut raw = two_tone_raw(2);
        let mut params = test_params(Method::Fir, FreqSpec::Single(60.0));
        params.picks = Some(vec!["MEG 001".to_string()]);
        notch_filter(&mut raw, &params).unwrap();

        let filtered = raw.data.row(0).to_vec();
        let untouched = raw.data.row(1).to_vec();
        assert!(amplitude_at(center(&filtered), 60.0, 600.0) < 0.05);
        assert!(amplitude_at(center(&untouched), 60.0, 600.0) > 0.9);
    }

    #[test]
    fn test_unknown_pick_rejected() {
        let mut raw = two_tone_raw(1);
        let mut params = test_params(Method::Fir, FreqSpec::Single(60.0));
        params.picks = Some(vec!["MEG 999".to_string()]);
        let err = notch_filter(&mut raw, &params).unwrap_err();
        assert!(err.to_string().contains("MEG 999"));
    }

    #[test]
    fn test_frequency_above_nyquist_rejected() {
        let mut raw = two_tone_raw(1);
        let params = test_params(Method::Fir, FreqSpec::Single(400.0));
        let err = notch_filter(&mut raw, &params).unwrap_err();
        assert!(err.to_string().contains("Nyquist"));
    }

    #[test]
    fn test_empty_frequency_set_rejected() {
        let mut raw = two_tone_raw(1);
        let params = test_params(
            Method::Fir,
            FreqSpec::Sequence {
                start: 60.0,
                end: 60.0,
                step: 60.0,
            },
        );
        let err = notch_filter(&mut raw, &params).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut serial = two_tone_raw(3);
        let mut parallel = two_tone_raw(3);
        let params = test_params(Method::Fir, FreqSpec::Single(60.0));
        let mut par_params = params.clone();
        par_params.n_jobs = 2;

        notch_filter(&mut serial, &params).unwrap();
        notch_filter(&mut parallel, &par_params).unwrap();
        for c in 0..3 {
            for s in (0..6000).step_by(977) {
                assert!((serial.data[[c, s]] - parallel.data[[c, s]]).abs() < 1e-12);
            }
        }
    }
}
