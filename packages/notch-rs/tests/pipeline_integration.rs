//! End-to-end pipeline test on a synthetic FIF recording.

use std::f64::consts::PI;
use std::path::Path;

use ndarray::Array2;

use notch_rs::fiff::info::{ch_kind, ChannelInfo, MeasInfo};
use notch_rs::pipeline::{self, RunPaths};
use notch_rs::{open_raw, save_raw, Product, Raw};

const SFREQ: f64 = 250.0;
const N_SAMPLES: usize = 6250;

fn synthetic_raw() -> Raw {
    let mut info = MeasInfo {
        nchan: 2,
        sfreq: SFREQ,
        lowpass: 100.0,
        highpass: 0.1,
        line_freq: Some(60.0),
        ..MeasInfo::default()
    };
    info.chs.push(ChannelInfo::new(1, "MEG 001", ch_kind::MEG));
    info.chs.push(ChannelInfo::new(2, "MEG 002", ch_kind::MEG));
    let data = Array2::from_shape_fn((2, N_SAMPLES), |(c, s)| {
        let t = s as f64 / SFREQ;
        let scale = 1e-12 * (c + 1) as f64;
        scale * ((2.0 * PI * 10.0 * t).sin() + (2.0 * PI * 60.0 * t).sin())
    });
    Raw {
        info,
        first_samp: 0,
        data,
    }
}

fn write_config(dir: &Path, fif: &Path, events: Option<&Path>) -> std::path::PathBuf {
    let config = dir.join("config.json");
    let events_field = match events {
        Some(p) => format!(r#", "events": "{}""#, p.display()),
        None => String::new(),
    };
    std::fs::write(
        &config,
        format!(
            r#"{{
                "fif": "{}"{},
                "param_freqs_specific_or_start": 60,
                "param_widths": 2.0,
                "param_trans_bandwidth": 5.0
            }}"#,
            fif.display(),
            events_field
        ),
    )
    .unwrap();
    config
}

/// Least-squares amplitude of a sinusoid at `freq`.
fn amplitude_at(x: &[f64], freq: f64) -> f64 {
    let w = 2.0 * PI * freq / SFREQ;
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
    let det = ss * cc - sc * sc;
    let a = (cc * xs - sc * xc) / det;
    let b = (ss * xc - sc * xs) / det;
    (a * a + b * b).sqrt()
}

#[test]
fn test_full_run_filters_and_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let fif = dir.path().join("in.fif");
    save_raw(&synthetic_raw(), &fif).unwrap();

    let events = dir.path().join("events.tsv");
    std::fs::write(&events, "onset\tduration\ttrial_type\n0.5\t0.0\tstim\n").unwrap();

    let paths = RunPaths {
        config: write_config(dir.path(), &fif, Some(&events)),
        out_dir: dir.path().join(pipeline::OUT_DIR),
        product: dir.path().join(pipeline::PRODUCT_FILE),
    };
    let outcome = pipeline::run(&paths).unwrap();

    assert_eq!(outcome.n_channels, 2);
    assert_eq!(outcome.n_samples, N_SAMPLES);
    assert_eq!(outcome.freqs, vec![60.0]);
    assert!(outcome.events_copied);
    assert!(paths.out_dir.join(pipeline::EVENTS_FILE).exists());

    // The filtered recording preserves shape and removes the line component.
    let filtered = open_raw(&outcome.out_fif).unwrap();
    assert_eq!(filtered.n_channels(), 2);
    assert_eq!(filtered.n_samples(), N_SAMPLES);
    for c in 0..2 {
        let row: Vec<f64> = filtered.data.row(c).to_vec();
        let mid = &row[N_SAMPLES / 4..3 * N_SAMPLES / 4];
        let scale = 1e-12 * (c + 1) as f64;
        assert!(amplitude_at(mid, 60.0) < 0.05 * scale, "channel {}", c);
        assert!(amplitude_at(mid, 10.0) > 0.9 * scale, "channel {}", c);
    }

    let product: Product =
        serde_json::from_str(&std::fs::read_to_string(&paths.product).unwrap()).unwrap();
    assert!(product.has_success());
    assert!(product.brainlife.iter().any(|m| m.kind == "info"));
}

#[test]
fn test_run_without_events_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let fif = dir.path().join("in.fif");
    save_raw(&synthetic_raw(), &fif).unwrap();

    let paths = RunPaths {
        config: write_config(dir.path(), &fif, None),
        out_dir: dir.path().join(pipeline::OUT_DIR),
        product: dir.path().join(pipeline::PRODUCT_FILE),
    };
    let outcome = pipeline::run(&paths).unwrap();
    assert!(!outcome.events_copied);
    assert!(!paths.out_dir.join(pipeline::EVENTS_FILE).exists());
}

#[test]
fn test_bad_channels_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fif = dir.path().join("in.fif");
    let mut raw = synthetic_raw();
    raw.info.bads = vec!["MEG 002".to_string()];
    save_raw(&raw, &fif).unwrap();

    let paths = RunPaths {
        config: write_config(dir.path(), &fif, None),
        out_dir: dir.path().join(pipeline::OUT_DIR),
        product: dir.path().join(pipeline::PRODUCT_FILE),
    };
    let outcome = pipeline::run(&paths).unwrap();
    let filtered = open_raw(&outcome.out_fif).unwrap();
    assert_eq!(filtered.info.bads, vec!["MEG 002".to_string()]);
}

#[test]
fn test_report_build() {
    let dir = tempfile::tempdir().unwrap();
    let fif = dir.path().join("in.fif");
    save_raw(&synthetic_raw(), &fif).unwrap();

    let config = write_config(dir.path(), &fif, None);
    let cfg = notch_rs::AppConfig::load(&config).unwrap();
    let report_dir = dir.path().join(pipeline::REPORT_DIR);
    let path = pipeline::build_report(&cfg, &report_dir).unwrap();
    assert!(path.exists());
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Power spectral density"));
    assert!(html.contains("60Hz"));
}
