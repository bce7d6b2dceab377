//! End-to-end run orchestration: load the recording, filter it, write the
//! outputs and the platform status file.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::Result;
use crate::fiff::{open_raw, save_raw, Raw};
use crate::filter::notch_filter;
use crate::product::Product;
use crate::report;
use crate::snr::compute_snr;

pub const OUT_DIR: &str = "out_dir_notch_filter";
pub const REPORT_DIR: &str = "out_dir_report";
pub const PRODUCT_FILE: &str = "product.json";
pub const OUT_FIF: &str = "meg.fif";
pub const EVENTS_FILE: &str = "events.tsv";

/// Where a run reads its config and writes its results.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub config: PathBuf,
    pub out_dir: PathBuf,
    pub product: PathBuf,
}

impl RunPaths {
    /// Platform defaults, relative to the current working directory.
    pub fn new(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            out_dir: PathBuf::from(OUT_DIR),
            product: PathBuf::from(PRODUCT_FILE),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub n_channels: usize,
    pub n_samples: usize,
    /// Frequencies that were notched.
    pub freqs: Vec<f64>,
    pub out_fif: PathBuf,
    pub events_copied: bool,
}

/// Execute a full filtering run from a `config.json` on disk.
///
/// `product.json` is written only when the run succeeds; on failure the
/// error propagates and no product file is left behind.
pub fn run(paths: &RunPaths) -> Result<RunOutcome> {
    let cfg = AppConfig::load(&paths.config)?;
    run_with_config(&cfg, paths)
}

/// Execute a filtering run from an already-parsed configuration.
pub fn run_with_config(cfg: &AppConfig, paths: &RunPaths) -> Result<RunOutcome> {
    let mut product = Product::new();
    let outcome = run_inner(cfg, paths, &mut product)?;
    product.success("Notch filter was applied successfully.");
    product.save(&paths.product)?;
    Ok(outcome)
}

fn run_inner(cfg: &AppConfig, paths: &RunPaths, product: &mut Product) -> Result<RunOutcome> {
    // Validate parameters before touching the data file.
    let params = cfg.to_params()?;

    log::info!("loading raw recording from {}", cfg.fif);
    let mut raw = open_raw(&cfg.fif)?;
    log::info!(
        "loaded {} channels x {} samples at {} Hz",
        raw.n_channels(),
        raw.n_samples(),
        raw.info.sfreq
    );

    std::fs::create_dir_all(&paths.out_dir)?;

    let events_copied = copy_events(cfg.events.as_deref(), &paths.out_dir)?;
    product.info("Notch filter was applied.");

    let freqs = notch_filter(&mut raw, &params)?;
    log::info!("notched {:?} Hz", freqs);

    let out_fif = paths.out_dir.join(OUT_FIF);
    save_raw(&raw, &out_fif)?;
    log::info!("wrote filtered recording to {}", out_fif.display());

    Ok(RunOutcome {
        n_channels: raw.n_channels(),
        n_samples: raw.n_samples(),
        freqs,
        out_fif,
        events_copied,
    })
}

fn copy_events(events: Option<&str>, out_dir: &Path) -> Result<bool> {
    let Some(src) = events else {
        return Ok(false);
    };
    let src = Path::new(src);
    if !src.exists() {
        log::warn!("events file {} not found, skipping copy", src.display());
        return Ok(false);
    }
    std::fs::copy(src, out_dir.join(EVENTS_FILE))?;
    Ok(true)
}

/// Build the quality report for a configuration: filter a copy of the
/// recording and compare spectra and SNR before and after.
///
/// SNR estimation failures (short recording, no MEG channels) degrade to
/// "n/a" in the report rather than failing the run.
pub fn build_report(cfg: &AppConfig, report_dir: &Path) -> Result<PathBuf> {
    let params = cfg.to_params()?;
    let before = open_raw(&cfg.fif)?;
    let mut after = before.clone();
    notch_filter(&mut after, &params)?;

    let snr_before = snr_or_none(&before);
    let snr_after = snr_or_none(&after);

    let html = report::render(&before, &after, &cfg.fif, &params, snr_before, snr_after);
    report::save(&html, report_dir)
}

fn snr_or_none(raw: &Raw) -> Option<f64> {
    match compute_snr(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("SNR estimation skipped: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotchError;

    #[test]
    fn test_run_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths {
            config: dir.path().join("config.json"),
            out_dir: dir.path().join(OUT_DIR),
            product: dir.path().join(PRODUCT_FILE),
        };
        let err = run(&paths).unwrap_err();
        assert!(matches!(err, NotchError::FileNotFound(_)));
    }

    #[test]
    fn test_failed_run_writes_no_product() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            format!(
                r#"{{"fif": "{}", "param_freqs_specific_or_start": 60}}"#,
                dir.path().join("missing.fif").display()
            ),
        )
        .unwrap();
        let paths = RunPaths {
            config,
            out_dir: dir.path().join(OUT_DIR),
            product: dir.path().join(PRODUCT_FILE),
        };
        assert!(run(&paths).is_err());
        // The run fails before any success message, so no status file is
        // left for the platform to pick up.
        assert!(!paths.product.exists());
    }
}
