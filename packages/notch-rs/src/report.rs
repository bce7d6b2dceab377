//! HTML quality report for the filtering run.
//!
//! The report carries three tables (recording features, filter parameters,
//! SNR before/after) and two power-spectral-density plots rendered as
//! inline SVG, so the output is a single self-contained file.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fiff::Raw;
use crate::psd::{welch_mean, Psd};
use crate::types::NotchParams;

pub const REPORT_FILE: &str = "report_filtering.html";

/// Render the full report document.
pub fn render(
    before: &Raw,
    after: &Raw,
    data_file: &str,
    params: &NotchParams,
    snr_before: Option<f64>,
    snr_after: Option<f64>,
) -> String {
    let info = &before.info;
    let nperseg = ((4.0 * info.sfreq) as usize).next_power_of_two();
    let psd_before = welch_mean(&before.data, info.sfreq, nperseg);
    let psd_after = welch_mean(&after.data, info.sfreq, nperseg);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Notch filter report</title>\n");
    html.push_str(
        "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse;\
         margin-bottom:2em}td,th{border:1px solid #999;padding:4px 10px;text-align:left}\
         th{background:#eee}</style>\n</head>\n<body>\n",
    );
    html.push_str("<h1>Notch filter report</h1>\n");

    html.push_str("<h2>MEG recording features</h2>\n<table>\n");
    push_row(&mut html, "Data file", &escape(data_file));
    push_row(&mut html, "Number of channels", &info.nchan.to_string());
    push_row(
        &mut html,
        "Sampling frequency",
        &format!("{} Hz", info.sfreq),
    );
    push_row(
        &mut html,
        "Duration",
        &format!("{:.1} s", before.n_samples() as f64 / info.sfreq),
    );
    if let Some(date) = info.meas_datetime() {
        push_row(
            &mut html,
            "Measurement date",
            &date.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
    }
    push_row(
        &mut html,
        "Highpass",
        &format!("{} Hz", info.highpass),
    );
    push_row(&mut html, "Lowpass", &format!("{} Hz", info.lowpass));
    if let Some(lf) = info.line_freq {
        push_row(&mut html, "Power line frequency", &format!("{} Hz", lf));
    }
    let bads = if info.bads.is_empty() {
        "None".to_string()
    } else {
        info.bads.join(", ")
    };
    push_row(&mut html, "Bad channels", &escape(&bads));
    if info.has_proc_history {
        push_row(
            &mut html,
            "Note",
            "Bad channels have been interpolated during MaxFilter",
        );
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Filter parameters</h2>\n<table>\n");
    push_row(&mut html, "Method", params.method.as_str());
    push_row(&mut html, "Frequencies", &escape(&params.freqs.describe()));
    push_row(
        &mut html,
        "Transition bandwidth",
        &format!("{} Hz", params.trans_bandwidth),
    );
    match params.widths {
        Some(w) => push_row(&mut html, "Stop-band width", &format!("{} Hz", w)),
        None => push_row(&mut html, "Stop-band width", "freq / 200"),
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Signal-to-noise ratio</h2>\n<table>\n");
    html.push_str("<tr><th></th><th>SNR</th></tr>\n");
    push_row(&mut html, "Before filtering", &fmt_snr(snr_before));
    push_row(&mut html, "After filtering", &fmt_snr(snr_after));
    html.push_str("</table>\n");

    html.push_str("<h2>Power spectral density</h2>\n");
    html.push_str("<h3>Before filtering</h3>\n");
    html.push_str(&svg_psd(&psd_before));
    html.push_str("<h3>After filtering</h3>\n");
    html.push_str(&svg_psd(&psd_after));

    html.push_str("</body>\n</html>\n");
    html
}

/// Write the rendered report to `out_dir/report_filtering.html`.
pub fn save(html: &str, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(REPORT_FILE);
    std::fs::write(&path, html)?;
    Ok(path)
}

fn push_row(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>\n", label, value));
}

fn fmt_snr(snr: Option<f64>) -> String {
    match snr {
        Some(v) => format!("{:.3}", v),
        None => "n/a".to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Log-power polyline plot of a PSD, as a standalone SVG element.
fn svg_psd(psd: &Psd) -> String {
    const W: f64 = 720.0;
    const H: f64 = 260.0;
    const PAD: f64 = 40.0;

    if psd.freqs.len() < 2 {
        return "<p>Not enough data for a spectrum plot.</p>\n".to_string();
    }

    let db: Vec<f64> = psd
        .power
        .iter()
        .map(|&p| 10.0 * p.max(1e-30).log10())
        .collect();
    let fmax = *psd.freqs.last().unwrap();
    let (ymin, ymax) = db.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let yspan = (ymax - ymin).max(1.0);

    let points: Vec<String> = psd
        .freqs
        .iter()
        .zip(db.iter())
        .map(|(&f, &v)| {
            let x = PAD + (W - 2.0 * PAD) * f / fmax;
            let y = H - PAD - (H - 2.0 * PAD) * (v - ymin) / yspan;
            format!("{:.1},{:.1}", x, y)
        })
        .collect();

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\">\n",
        w = W,
        h = H
    );
    svg.push_str(&format!(
        "<rect x=\"{p}\" y=\"{p}\" width=\"{iw}\" height=\"{ih}\" \
         fill=\"none\" stroke=\"#ccc\"/>\n",
        p = PAD,
        iw = W - 2.0 * PAD,
        ih = H - 2.0 * PAD
    ));
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"1\" points=\"{}\"/>\n",
        points.join(" ")
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"middle\">Frequency (Hz)</text>\n",
        W / 2.0,
        H - 8.0
    ));
    svg.push_str(&format!(
        "<text x=\"12\" y=\"{}\" font-size=\"11\" transform=\"rotate(-90 12 {y})\" \
         text-anchor=\"middle\">Power (dB)</text>\n",
        H / 2.0,
        y = H / 2.0
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"10\">0</text>\n\
         <text x=\"{}\" y=\"{}\" font-size=\"10\" text-anchor=\"end\">{:.0}</text>\n",
        PAD,
        H - PAD + 14.0,
        W - PAD,
        H - PAD + 14.0,
        fmax
    ));
    svg.push_str("</svg>\n");
    svg
}
