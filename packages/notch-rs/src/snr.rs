//! Crude SNR estimate over the good MEG channels.
//!
//! The recording is cut into consecutive 10-second epochs; the grand mean
//! of the per-epoch means is divided by their standard error.

use crate::error::{NotchError, Result};
use crate::fiff::Raw;

/// SNR of `raw`, or an error if there are no good MEG channels or fewer
/// than two complete epochs.
pub fn compute_snr(raw: &Raw) -> Result<f64> {
    let picks = raw.good_meg_picks();
    if picks.is_empty() {
        return Err(NotchError::Filter(
            "SNR estimation needs at least one good MEG channel".to_string(),
        ));
    }
    let epoch_samples = (10.0 * raw.info.sfreq).round() as usize;
    if epoch_samples == 0 {
        return Err(NotchError::Filter("invalid sampling frequency".to_string()));
    }
    let n_epochs = raw.n_samples() / epoch_samples;
    if n_epochs < 2 {
        return Err(NotchError::Filter(format!(
            "SNR estimation needs at least two 10 s epochs, recording has {:.1} s",
            raw.duration_secs()
        )));
    }

    let mut epoch_means = Vec::with_capacity(n_epochs);
    for e in 0..n_epochs {
        let start = e * epoch_samples;
        let mut sum = 0.0;
        for &c in &picks {
            for s in start..start + epoch_samples {
                sum += raw.data[[c, s]];
            }
        }
        epoch_means.push(sum / (picks.len() * epoch_samples) as f64);
    }

    snr_from_epoch_means(&epoch_means).ok_or_else(|| {
        NotchError::Filter("SNR undefined: epoch means have zero variance".to_string())
    })
}

/// Mean over standard error, with the sample (n-1) standard deviation.
fn snr_from_epoch_means(means: &[f64]) -> Option<f64> {
    let n = means.len();
    if n < 2 {
        return None;
    }
    let mean = means.iter().sum::<f64>() / n as f64;
    let var = means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let stderr = (var / n as f64).sqrt();
    if stderr <= 0.0 {
        None
    } else {
        Some(mean / stderr)
    }
}
