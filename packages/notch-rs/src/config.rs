//! Brainlife `config.json` parsing.
//!
//! When an app runs on Brainlife, parameters the user left blank arrive as
//! empty strings rather than being omitted. All of that sentinel handling is
//! done here, once, with custom deserializers: downstream code only ever
//! sees explicit `Option`s. Platform-injected bookkeeping fields (`_app`,
//! `_tid`, `_inputs`, `_outputs`) are ignored by the deserializer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{NotchError, Result};
use crate::types::{
    FilterLength, FirDesign, FirWindow, FreqSpec, IirParams, Method, NotchParams, PadMode, Phase,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Input FIF file path.
    pub fif: String,

    /// Optional events sidecar path.
    #[serde(default, deserialize_with = "opt_string")]
    pub events: Option<String>,

    /// Specific frequency to notch, or the start of a harmonic sequence.
    #[serde(default, deserialize_with = "opt_f64")]
    pub param_freqs_specific_or_start: Option<f64>,

    /// End of the frequency sequence (exclusive).
    #[serde(default, deserialize_with = "opt_f64")]
    pub param_freqs_end: Option<f64>,

    /// Step of the frequency sequence in Hz.
    #[serde(default, deserialize_with = "opt_f64")]
    pub param_freqs_step: Option<f64>,

    /// Channel names to include.
    #[serde(default, deserialize_with = "opt_picks")]
    pub param_picks: Option<Vec<String>>,

    /// FIR filter length: 'auto' or a duration like '10s' / '5500ms'.
    #[serde(default = "default_filter_length")]
    pub param_filter_length: String,

    /// Stop-band width in Hz.
    #[serde(default, deserialize_with = "opt_f64")]
    pub param_widths: Option<f64>,

    /// Transition band width in Hz.
    #[serde(default = "default_trans_bandwidth")]
    pub param_trans_bandwidth: f64,

    /// Number of parallel jobs.
    #[serde(default = "default_n_jobs")]
    pub param_n_jobs: usize,

    /// Filtering method: fir, iir or spectrum_fit.
    #[serde(default = "default_method")]
    pub param_method: String,

    /// IIR design sub-parameters.
    #[serde(default, deserialize_with = "opt_iir")]
    pub param_iir_parameters: Option<IirParams>,

    /// Detection bandwidth in Hz for spectrum_fit.
    #[serde(default, deserialize_with = "opt_f64")]
    pub param_mt_bandwidth: Option<f64>,

    /// F-test significance threshold for spectrum_fit auto-detection.
    #[serde(default = "default_p_value")]
    pub param_p_value: f64,

    /// FIR phase: zero or zero-double.
    #[serde(default = "default_phase")]
    pub param_phase: String,

    /// FIR window: hamming, hann or blackman.
    #[serde(default = "default_fir_window")]
    pub param_fir_window: String,

    /// FIR design: firwin or firwin2.
    #[serde(default = "default_fir_design")]
    pub param_fir_design: String,

    /// Edge padding mode.
    #[serde(default = "default_pad")]
    pub param_pad: String,
}

fn default_filter_length() -> String {
    "auto".to_string()
}

fn default_trans_bandwidth() -> f64 {
    1.0
}

fn default_n_jobs() -> usize {
    1
}

fn default_method() -> String {
    "fir".to_string()
}

fn default_p_value() -> f64 {
    0.05
}

fn default_phase() -> String {
    "zero".to_string()
}

fn default_fir_window() -> String {
    "hamming".to_string()
}

fn default_fir_design() -> String {
    "firwin".to_string()
}

fn default_pad() -> String {
    "reflect_limited".to_string()
}

/// Empty string or null → `None`; otherwise the string itself.
fn opt_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, got {}",
            other
        ))),
    }
}

/// Empty string or null → `None`; numbers (or numeric strings) pass through.
fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{}'", s))),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

/// Empty string or null → `None`; an array of channel names, or a single
/// name, passes through.
fn opt_picks<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<Vec<String>>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(vec![s])),
        Value::Array(items) => {
            let mut picks = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => picks.push(s),
                    other => {
                        return Err(serde::de::Error::custom(format!(
                            "expected channel name strings, got {}",
                            other
                        )))
                    }
                }
            }
            Ok(Some(picks))
        }
        other => Err(serde::de::Error::custom(format!(
            "expected channel names, got {}",
            other
        ))),
    }
}

/// Empty string or null → `None`; a JSON object parses into [`IirParams`].
fn opt_iir<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<IirParams>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        v @ Value::Object(_) => serde_json::from_value(v)
            .map(Some)
            .map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected an object of IIR parameters, got {}",
            other
        ))),
    }
}

impl AppConfig {
    /// Load and parse a `config.json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NotchError::FileNotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Parse a config from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| NotchError::InvalidConfig(format!("failed to parse config: {}", e)))
    }

    /// Validate the configuration and build the typed filter parameters.
    ///
    /// The start frequency may only be absent when the method is
    /// `spectrum_fit`; for any other method this is a configuration error,
    /// raised here before any file is touched.
    pub fn to_params(&self) -> Result<NotchParams> {
        let method = Method::parse(&self.param_method)?;

        let freqs = match self.param_freqs_specific_or_start {
            None => {
                if method != Method::SpectrumFit {
                    return Err(NotchError::InvalidConfig(
                        "param_freqs_specific_or_start can only be empty when param_method \
                         is spectrum_fit"
                            .to_string(),
                    ));
                }
                FreqSpec::Auto
            }
            Some(start) => match self.param_freqs_end {
                None => FreqSpec::Single(start),
                Some(end) => FreqSpec::Sequence {
                    start,
                    end,
                    step: self.param_freqs_step.unwrap_or(1.0),
                },
            },
        };

        if self.param_trans_bandwidth <= 0.0 {
            return Err(NotchError::InvalidConfig(
                "param_trans_bandwidth must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.param_p_value) || self.param_p_value == 0.0 {
            return Err(NotchError::InvalidConfig(
                "param_p_value must be in (0, 1)".to_string(),
            ));
        }

        Ok(NotchParams {
            freqs,
            picks: self.param_picks.clone(),
            filter_length: FilterLength::parse(&self.param_filter_length)?,
            widths: self.param_widths,
            trans_bandwidth: self.param_trans_bandwidth,
            n_jobs: self.param_n_jobs.max(1),
            method,
            iir_params: self.param_iir_parameters.clone().unwrap_or_default(),
            mt_bandwidth: self.param_mt_bandwidth,
            p_value: self.param_p_value,
            phase: Phase::parse(&self.param_phase)?,
            fir_window: FirWindow::parse(&self.param_fir_window)?,
            fir_design: FirDesign::parse(&self.param_fir_design)?,
            pad: PadMode::parse(&self.param_pad)?,
        })
    }
}
